use bitflags::bitflags;

use crate::spectrum::SampledSpectrum;

/// used for colors
pub type RgbD = glam::f64::DVec3;

/// used for direction vectors
pub type Vec3d = glam::f64::DVec3;
/// used for random numbers and anisotropic roughness
pub type Vec2d = glam::f64::DVec2;

bitflags! {
    /// Classifies scattering events. The integrator uses them for its MIS bookkeeping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BxDFFlags: u32 {
        const REFLECTION = 1 << 0;
        const TRANSMISSION = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SPECULAR = 1 << 4;

        const DIFFUSE_REFLECTION = BxDFFlags::DIFFUSE.bits() | BxDFFlags::REFLECTION.bits();
        const GLOSSY_REFLECTION = BxDFFlags::GLOSSY.bits() | BxDFFlags::REFLECTION.bits();
        const GLOSSY_TRANSMISSION = BxDFFlags::GLOSSY.bits() | BxDFFlags::TRANSMISSION.bits();
    }
}

/// Contains the data returned by [`BxDFSet::evaluate_local`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterEval {
    /// How much light is scattered from the incident direction to the outgoing direction
    pub f: SampledSpectrum,

    /// The probability density of sampling the incident direction given the outgoing direction
    pub pdf: f64,

    /// The kind of lobe that contributed most
    pub flags: BxDFFlags,
}

impl ScatterEval {
    #[must_use]
    pub fn zero(dimension: usize) -> Self {
        Self {
            f: SampledSpectrum::zero(dimension),
            pdf: 0.0,
            flags: BxDFFlags::empty(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.pdf > 0.0
    }
}

/// A sampled incident direction. `pdf` is the density of the strategy that produced it, not the
/// density of the whole set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledDirection {
    /// # Incident Direction
    /// The direction where light could be arriving at the surface
    pub wi: Vec3d,
    pub pdf: f64,

    /// `false` if the strategy could not produce a direction, e.g. on total internal reflection
    /// or if the reflected direction ends up below the surface
    pub valid: bool,
    pub flags: BxDFFlags,
}

impl SampledDirection {
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            wi: Vec3d::ZERO,
            pdf: 0.0,
            valid: false,
            flags: BxDFFlags::empty(),
        }
    }
}

/// Contains the data returned by [`BxDFSet::sample_local`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BsdfSample {
    pub eval: ScatterEval,
    pub wi: Vec3d,
}

/// A source of uniform random numbers in `[0, 1)`. It is owned by the integrator, scattering code
/// only draws from it.
pub trait Sampler {
    fn next_1d(&mut self) -> f64;

    fn next_2d(&mut self) -> Vec2d {
        let x = self.next_1d();
        let y = self.next_1d();
        Vec2d::new(x, y)
    }
}

/// A set of scattering lobes built for one shading point.
///
/// All directions are in the local shading frame. That means, the surface is assumed to be the
/// xy-plane and the z-vector is assumed to be the normal. `wo` is the direction light is
/// scattered to, `wi` the direction it arrives from. Both point away from the surface.
///
/// The `|cos theta_i|` term is not part of the returned value. The caller is responsible for
/// multiplying it in.
pub trait BxDFSet {
    /// Reflectance used for auxiliary images, e.g. for denoisers
    fn albedo(&self) -> SampledSpectrum;

    /// Returns the value and the sampling density for the given directions
    fn evaluate_local(&self, wo: Vec3d, wi: Vec3d) -> ScatterEval;

    /// Samples an incident direction, without evaluating the lobes for it
    fn sample_wi(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> SampledDirection;

    /// Samples an incident direction and evaluates the whole set for it, so that value and
    /// density agree with [`BxDFSet::evaluate_local`]
    fn sample_local(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> BsdfSample {
        let sampled = self.sample_wi(wo, sampler);
        if !sampled.valid {
            return BsdfSample {
                eval: ScatterEval::zero(self.albedo().dimension()),
                wi: sampled.wi,
            };
        }
        BsdfSample {
            eval: self.evaluate_local(wo, sampled.wi),
            wi: sampled.wi,
        }
    }

    /// Density of choosing `wi` given `wo`. Used to weight other sampling techniques, e.g. light
    /// sampling
    fn pdf_local(&self, wo: Vec3d, wi: Vec3d) -> f64 {
        self.evaluate_local(wo, wi).pdf
    }

    /// Identifies the structure of the set: which lobes exist and which Fresnel model is used.
    /// Two sets with equal hashes run the same code with different parameters.
    fn type_hash(&self) -> u64;

    /// `true` if the directions sampled depend on the wavelength
    fn is_dispersive(&self) -> bool {
        false
    }
}
