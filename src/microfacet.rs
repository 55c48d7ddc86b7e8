//! Microfacet distributions: GGX, Beckmann and the Disney flavour of GGX

use std::{f64::consts, fmt, str::FromStr};

use crate::{
    spectrum::SampledSpectrum,
    utils::{self, FloatExt},
    Error, Vec2d, Vec3d,
};

/// Smallest alpha a [`Microfacet`] is built with. Smaller values turn the distribution into a
/// delta peak that can no longer be evaluated in floating point.
pub const MIN_ALPHA: f64 = 1e-4;

/// Selects the closed-form expressions of a [`Microfacet`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum MicrofacetType {
    /// Trowbridge-Reitz with the height-correlated Smith shadowing term
    #[default]
    GGX,
    /// GGX normals and sampling, but shadowing and masking are taken as independent
    Disney,
    Beckmann,
}

impl FromStr for MicrofacetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ggx" => Ok(Self::GGX),
            "disney" => Ok(Self::Disney),
            "beckmann" => Ok(Self::Beckmann),
            _ => Err(Error::UnknownMicrofacetType(s.to_owned())),
        }
    }
}

impl fmt::Display for MicrofacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GGX => "ggx",
            Self::Disney => "disney",
            Self::Beckmann => "beckmann",
        })
    }
}

/// Perceptual roughness to alpha and back. Roughness is perceived roughly linear, alpha is what
/// the distributions are parametrized with.
pub trait AlphaRoughness: Sized {
    #[must_use]
    fn roughness_to_alpha(self) -> Self;
    #[must_use]
    fn alpha_to_roughness(self) -> Self;
}

impl AlphaRoughness for f64 {
    fn roughness_to_alpha(self) -> Self {
        self.sq()
    }

    fn alpha_to_roughness(self) -> Self {
        self.sqrt()
    }
}

impl AlphaRoughness for Vec2d {
    fn roughness_to_alpha(self) -> Self {
        self * self
    }

    fn alpha_to_roughness(self) -> Self {
        Self::new(self.x.sqrt(), self.y.sqrt())
    }
}

#[must_use]
pub fn roughness_to_alpha<T: AlphaRoughness>(roughness: T) -> T {
    roughness.roughness_to_alpha()
}

#[must_use]
pub fn alpha_to_roughness<T: AlphaRoughness>(alpha: T) -> T {
    alpha.alpha_to_roughness()
}

/// An anisotropic microsurface. This is the building block of all glossy lobes in
/// [`crate::bxdf`]. It is small and immutable, lobes that share a surface simply copy it.
///
/// All directions are given in the local shading frame, the macro normal is +z.
///
/// # Mathematical background
/// * [Microfacet Models for Refraction through Rough Surfaces](https://www.cs.cornell.edu/~srm/publications/EGSR07-btdf.pdf)
/// * [Understanding the Masking-Shadowing Function in Microfacet-Based BRDFs](https://jcgt.org/published/0003/02/03/)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Microfacet {
    /// roughness in direction x
    pub alpha_x: f64,

    /// roughness in direction y
    pub alpha_y: f64,

    pub ty: MicrofacetType,
}

impl Microfacet {
    /// alpha is clamped to [`MIN_ALPHA`]
    #[must_use]
    pub fn new(alpha_x: f64, alpha_y: f64, ty: MicrofacetType) -> Self {
        Self {
            alpha_x: alpha_x.max(MIN_ALPHA),
            alpha_y: alpha_y.max(MIN_ALPHA),
            ty,
        }
    }

    #[must_use]
    pub fn isotropic(alpha: f64, ty: MicrofacetType) -> Self {
        Self::new(alpha, alpha, ty)
    }

    /// Builds the distribution from a roughness attribute. With `remap` the roughness is squared
    /// first. The resulting alpha is clamped to `[MIN_ALPHA, 1]`.
    #[must_use]
    pub fn from_roughness(roughness: Vec2d, remap: bool, ty: MicrofacetType) -> Self {
        let alpha = if remap {
            roughness_to_alpha(roughness)
        } else {
            roughness
        };
        let alpha = alpha.clamp(Vec2d::splat(MIN_ALPHA), Vec2d::ONE);
        Self::new(alpha.x, alpha.y, ty)
    }

    #[must_use]
    pub fn max_alpha(&self) -> f64 {
        self.alpha_x.max(self.alpha_y)
    }

    /// `cos²φ/αx² + sin²φ/αy²` of a direction
    fn inverse_alpha2(&self, w: Vec3d) -> f64 {
        #[allow(clippy::suboptimal_flops)]
        {
            utils::cos_phi(w).sq() / self.alpha_x.sq() + utils::sin_phi(w).sq() / self.alpha_y.sq()
        }
    }

    /// Distribution of normals / Normal Distribution Function.
    /// This is the $D$ term in typical Cook-Torrance models
    #[must_use]
    pub fn d(&self, wh: Vec3d) -> f64 {
        let cos4_theta = utils::cos2_theta(wh).sq();
        if cos4_theta < 1e-16 {
            return 0.0;
        }
        let tan2_theta = utils::tan2_theta(wh);
        if tan2_theta.is_infinite() {
            return 0.0;
        }
        let e = tan2_theta * self.inverse_alpha2(wh);
        let norm = consts::PI * self.alpha_x * self.alpha_y * cos4_theta;
        match self.ty {
            MicrofacetType::GGX | MicrofacetType::Disney => 1.0 / (norm * (1.0 + e).sq()),
            MicrofacetType::Beckmann => (-e).exp() / norm,
        }
    }

    /// Auxiliary function of the Smith shadowing term, Λ(ω)
    #[must_use]
    pub fn lambda(&self, w: Vec3d) -> f64 {
        let abs_tan_theta = utils::tan2_theta(w).sqrt();
        if !abs_tan_theta.is_finite() {
            return 0.0;
        }
        #[allow(clippy::suboptimal_flops)]
        let alpha = (utils::cos_phi(w).sq() * self.alpha_x.sq()
            + utils::sin_phi(w).sq() * self.alpha_y.sq())
        .sqrt();
        match self.ty {
            MicrofacetType::GGX | MicrofacetType::Disney => {
                let alpha2_tan2 = (alpha * abs_tan_theta).sq();
                (-1.0 + (1.0 + alpha2_tan2).sqrt()) / 2.0
            }
            MicrofacetType::Beckmann => {
                let a = 1.0 / (alpha * abs_tan_theta);
                if a >= 1.6 {
                    return 0.0;
                }
                #[allow(clippy::suboptimal_flops)]
                {
                    (1.0 - 1.259 * a + 0.396 * a * a) / (3.535 * a + 2.181 * a * a)
                }
            }
        }
    }

    /// Masking function of a single direction
    #[must_use]
    pub fn g1(&self, w: Vec3d) -> f64 {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Masking-Shadowing function.
    /// This is the $G$ term in typical Cook-Torrance models
    #[must_use]
    pub fn g(&self, wo: Vec3d, wi: Vec3d) -> f64 {
        match self.ty {
            MicrofacetType::Disney => self.g1(wo) * self.g1(wi),
            MicrofacetType::GGX | MicrofacetType::Beckmann => {
                1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
            }
        }
    }

    /// Samples a micro normal proportional to `D(wh) |cos θh|`. The result lies in the
    /// hemisphere of `wo`.
    #[must_use]
    pub fn sample_wh(&self, wo: Vec3d, u: Vec2d) -> Vec3d {
        let mut phi = (self.alpha_y / self.alpha_x
            * (2.0 * consts::PI * u.y + consts::FRAC_PI_2).tan())
        .atan();
        if u.y > 0.5 {
            phi += consts::PI;
        }
        let (sin_phi, cos_phi) = phi.sin_cos();
        #[allow(clippy::suboptimal_flops)]
        let inverse_alpha2 = cos_phi.sq() / self.alpha_x.sq() + sin_phi.sq() / self.alpha_y.sq();

        let tan2_theta = match self.ty {
            MicrofacetType::GGX | MicrofacetType::Disney => u.x / ((1.0 - u.x) * inverse_alpha2),
            MicrofacetType::Beckmann => -(1.0 - u.x).ln() / inverse_alpha2,
        };
        let cos_theta = 1.0 / (1.0 + tan2_theta).sqrt();
        let sin_theta = utils::safe_sqrt(1.0 - cos_theta.sq());

        let wh = utils::spherical_direction(sin_theta, cos_theta, phi);
        if utils::same_hemisphere(wo, wh) {
            wh
        } else {
            -wh
        }
    }

    /// Density of [`Microfacet::sample_wh`] with respect to solid angle
    #[must_use]
    pub fn pdf_wh(&self, wh: Vec3d) -> f64 {
        self.d(wh) * utils::abs_cos_theta(wh)
    }

    /// Converts the density of a micro normal to the density of the mirrored direction
    #[must_use]
    pub fn pdf_wi_reflection(pdf_wh: f64, wo: Vec3d, wh: Vec3d) -> f64 {
        let denom = 4.0 * wo.dot(wh).abs();
        if denom < 1e-12 {
            return 0.0;
        }
        pdf_wh / denom
    }

    /// Converts the density of a micro normal to the density of the refracted direction.
    /// `eta` is the index of refraction on the side of `wi` over the one on the side of `wo`.
    #[must_use]
    pub fn pdf_wi_transmission(pdf_wh: f64, wo: Vec3d, wh: Vec3d, wi: Vec3d, eta: f64) -> f64 {
        #[allow(clippy::suboptimal_flops)]
        let denom = (wi.dot(wh) * eta + wo.dot(wh)).sq();
        if denom < 1e-16 {
            return 0.0;
        }
        pdf_wh * eta.sq() * wi.dot(wh).abs() / denom
    }

    /// Density of choosing `wi` by mirroring `wo` at a sampled micro normal
    #[must_use]
    pub fn reflection_pdf(&self, wo: Vec3d, wi: Vec3d) -> f64 {
        if !utils::same_hemisphere(wo, wi) {
            return 0.0;
        }
        let Some(wh) = (wo + wi).try_normalize() else {
            return 0.0;
        };
        Self::pdf_wi_reflection(self.pdf_wh(wh), wo, wh)
    }

    /// Density of choosing `wi` by refracting `wo` at a sampled micro normal
    #[must_use]
    pub fn transmission_pdf(&self, wo: Vec3d, wi: Vec3d, eta: f64) -> f64 {
        match transmission_half_vector(wo, wi, eta) {
            Some(wh) => Self::pdf_wi_transmission(self.pdf_wh(wh), wo, wh, wi, eta),
            None => 0.0,
        }
    }

    /// [`Microfacet::transmission_pdf`] for every lane of a dispersive eta
    #[must_use]
    pub fn pdf_wi_transmission_spectral(
        &self,
        wo: Vec3d,
        wi: Vec3d,
        eta: SampledSpectrum,
    ) -> SampledSpectrum {
        eta.map(|eta| self.transmission_pdf(wo, wi, eta))
    }

    /// Cook-Torrance reflection without the Fresnel factor
    #[must_use]
    pub fn brdf_div_fr(&self, wo: Vec3d, wh: Vec3d, wi: Vec3d) -> f64 {
        let denom = (4.0 * utils::cos_theta(wo) * utils::cos_theta(wi)).abs();
        if denom < 1e-12 || wh == Vec3d::ZERO {
            return 0.0;
        }
        self.d(wh) * self.g(wo, wi) / denom
    }

    /// Walter et al. transmission without the Fresnel transmittance. Radiance is compressed by
    /// `1 / eta²` when entering a denser medium.
    #[must_use]
    pub fn btdf_div_ft(&self, wo: Vec3d, wh: Vec3d, wi: Vec3d, eta: f64) -> f64 {
        let cos_theta_o = utils::cos_theta(wo);
        let cos_theta_i = utils::cos_theta(wi);
        let wo_dot_wh = wo.dot(wh);
        let wi_dot_wh = wi.dot(wh);
        #[allow(clippy::suboptimal_flops)]
        let denom = (cos_theta_o * cos_theta_i).abs() * (wo_dot_wh + eta * wi_dot_wh).sq();
        if denom < 1e-16 || wh == Vec3d::ZERO {
            return 0.0;
        }
        self.d(wh) * self.g(wo, wi) * (wi_dot_wh * wo_dot_wh).abs() / denom
    }

    /// Reflection including the given Fresnel reflectance
    #[must_use]
    pub fn brdf(&self, wo: Vec3d, wi: Vec3d, fr: SampledSpectrum) -> SampledSpectrum {
        let wh = (wo + wi).normalize_or_zero();
        fr * self.brdf_div_fr(wo, wh, wi)
    }

    /// Transmission including the given Fresnel transmittance
    #[must_use]
    pub fn btdf(&self, wo: Vec3d, wi: Vec3d, ft: SampledSpectrum, eta: f64) -> SampledSpectrum {
        match transmission_half_vector(wo, wi, eta) {
            Some(wh) => ft * self.btdf_div_ft(wo, wh, wi, eta),
            None => ft * 0.0,
        }
    }
}

/// The micro normal that refracts `wo` into `wi`, facing +z. `None` unless the directions lie on
/// opposite sides of the surface, each in front of the micro normal as seen from its own side.
#[must_use]
pub fn transmission_half_vector(wo: Vec3d, wi: Vec3d, eta: f64) -> Option<Vec3d> {
    let cos_theta_o = utils::cos_theta(wo);
    let cos_theta_i = utils::cos_theta(wi);
    if cos_theta_o * cos_theta_i >= 0.0 {
        return None;
    }
    let wh = (wo + wi * eta).try_normalize()?;
    let wh = if wh.z < 0.0 { -wh } else { wh };
    if wo.dot(wh) * cos_theta_o <= 0.0 || wi.dot(wh) * cos_theta_i <= 0.0 {
        None
    } else {
        Some(wh)
    }
}
