//! Rough dielectric interfaces, optionally with wavelength dependent index of refraction

use std::{fmt, str::FromStr};

use super::{structural_hash, AttributeSource, Slot};
use crate::{
    bxdf::{BxDF, MicrofacetReflection, MicrofacetTransmission},
    core::{BxDFSet, SampledDirection, Sampler, ScatterEval},
    fresnel::Fresnel,
    microfacet::{Microfacet, MicrofacetType},
    spectrum::{SampledSpectrum, SampledWavelengths, RGB_PEAK_WAVELENGTHS},
    utils::{self, FloatExt},
    Error, RgbD, Vec2d, Vec3d,
};

/// Measured dispersion of optical glasses, as Sellmeier coefficients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IorCurve {
    /// Schott N-BK7 borosilicate crown glass
    BK7,
    /// Schott N-LASF9 lanthanum dense flint glass
    LASF9,
}

impl IorCurve {
    /// `(B, C)` with `C` in µm²
    const fn sellmeier(self) -> ([f64; 3], [f64; 3]) {
        match self {
            Self::BK7 => (
                [1.039_612_12, 0.231_792_344, 1.010_469_45],
                [0.006_000_698_67, 0.020_017_914_4, 103.560_653],
            ),
            Self::LASF9 => (
                [2.000_295_47, 0.298_926_886, 1.806_918_43],
                [0.012_142_601_7, 0.053_873_623_6, 156.530_829],
            ),
        }
    }

    /// Index of refraction at `lambda` nm
    #[must_use]
    pub fn eta(self, lambda: f64) -> f64 {
        let lambda2 = (lambda / 1000.0).sq();
        let (b, c) = self.sellmeier();
        let sum: f64 = b
            .iter()
            .zip(c)
            .map(|(b, c)| b * lambda2 / (lambda2 - c))
            .sum();
        (1.0 + sum).sqrt()
    }

    /// Like [`str::parse`], but unknown names fall back to [`IorCurve::BK7`]
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err| {
            log::warn!("{err}, falling back to BK7");
            Self::BK7
        })
    }
}

impl FromStr for IorCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("bk7") {
            Ok(Self::BK7)
        } else if s.eq_ignore_ascii_case("lasf9") {
            Ok(Self::LASF9)
        } else {
            Err(Error::UnknownIorCurve(s.to_owned()))
        }
    }
}

impl fmt::Display for IorCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BK7 => "BK7",
            Self::LASF9 => "LASF9",
        })
    }
}

/// Index of refraction of a [`GlassMaterial`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ior {
    /// The same index for every wavelength
    Slot(Slot<f64>),
    /// A dispersive glass
    Curve(IorCurve),
}

impl Ior {
    /// Per lane index of refraction, and whether the lanes differ
    fn evaluate(
        self,
        source: &dyn AttributeSource,
        swl: &SampledWavelengths,
    ) -> (SampledSpectrum, bool) {
        match self {
            Self::Slot(slot) => (
                SampledSpectrum::splat(swl.dimension(), slot.evaluate(source)),
                false,
            ),
            Self::Curve(curve) if swl.is_rgb() => (
                SampledSpectrum::splat(swl.dimension(), curve.eta(RGB_PEAK_WAVELENGTHS.x)),
                false,
            ),
            Self::Curve(curve) => (swl.map(|lambda| curve.eta(lambda)), true),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlassMaterial {
    /// tint of the transmitted light
    pub color: Slot<RgbD>,
    pub ior: Ior,
    pub roughness: Slot<Vec2d>,
    /// square the roughness to get alpha
    pub remap_roughness: bool,
    pub microfacet: MicrofacetType,
}

impl Default for GlassMaterial {
    fn default() -> Self {
        Self {
            color: Slot::Constant(RgbD::ONE),
            ior: Ior::Slot(Slot::Constant(1.5)),
            roughness: Slot::Constant(Vec2d::splat(0.01)),
            remap_roughness: true,
            microfacet: MicrofacetType::GGX,
        }
    }
}

impl GlassMaterial {
    #[must_use]
    pub fn create_lobe_set(
        &self,
        source: &dyn AttributeSource,
        swl: &SampledWavelengths,
    ) -> DielectricBxDFSet {
        let color = self.color.albedo(source, swl).sample;
        let (eta, dispersive) = self.ior.evaluate(source, swl);
        let microfacet = Microfacet::from_roughness(
            self.roughness.evaluate(source),
            self.remap_roughness,
            self.microfacet,
        );
        DielectricBxDFSet {
            fresnel: Fresnel::Dielectric { eta },
            refl: MicrofacetReflection {
                color: SampledSpectrum::one(swl.dimension()),
                microfacet,
            },
            trans: MicrofacetTransmission { color, microfacet },
            dispersive,
        }
    }
}

/// Reflection and transmission at a rough dielectric interface.
///
/// The branch is chosen with the Fresnel reflectance at the macro normal. With dispersion, the
/// direction is chosen for the first (hero) wavelength, [`DielectricBxDFSet::wavelength_pdfs`]
/// gives the densities for the other lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DielectricBxDFSet {
    fresnel: Fresnel,
    refl: MicrofacetReflection,
    trans: MicrofacetTransmission,
    dispersive: bool,
}

impl DielectricBxDFSet {
    /// Fresnel model relative to the side of `wo` and its reflectance for `wo`
    fn fresnel_for(&self, wo: Vec3d) -> (Fresnel, SampledSpectrum) {
        let fresnel = self.fresnel.corrected(utils::cos_theta(wo));
        let fr = fresnel.evaluate(utils::abs_cos_theta(wo));
        (fresnel, fr)
    }

    /// Density of `wi` if the direction had been sampled with the eta of each lane
    #[must_use]
    pub fn wavelength_pdfs(&self, wo: Vec3d, wi: Vec3d) -> SampledSpectrum {
        let (fresnel, fr) = self.fresnel_for(wo);
        if utils::same_hemisphere(wo, wi) {
            fr * self.refl.pdf(wo, wi, &fresnel)
        } else {
            let ft = SampledSpectrum::one(fr.dimension()) - fr;
            ft * self.trans.pdf_spectral(wo, wi, &fresnel)
        }
    }
}

impl BxDFSet for DielectricBxDFSet {
    fn albedo(&self) -> SampledSpectrum {
        self.refl.albedo()
    }

    fn evaluate_local(&self, wo: Vec3d, wi: Vec3d) -> ScatterEval {
        let (fresnel, fr) = self.fresnel_for(wo);
        let fr = fr.first();
        if utils::same_hemisphere(wo, wi) {
            let mut eval = self.refl.evaluate(wo, wi, &fresnel);
            eval.pdf *= fr;
            eval
        } else {
            let mut eval = self.trans.evaluate(wo, wi, &fresnel);
            eval.pdf *= 1.0 - fr;
            eval
        }
    }

    fn sample_wi(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> SampledDirection {
        let uc = sampler.next_1d();
        let (fresnel, fr) = self.fresnel_for(wo);
        let fr = fr.first();
        if uc < fr {
            let mut sampled = self.refl.sample_wi(wo, sampler.next_2d(), &fresnel);
            sampled.pdf *= fr;
            sampled
        } else {
            let mut sampled = self.trans.sample_wi(wo, sampler.next_2d(), &fresnel);
            sampled.pdf *= 1.0 - fr;
            sampled
        }
    }

    fn type_hash(&self) -> u64 {
        structural_hash(("dielectric", self.fresnel.kind(), self.refl.microfacet.ty))
    }

    fn is_dispersive(&self) -> bool {
        self.dispersive
    }
}
