//! Fresnel reflectance at a smooth interface

use crate::{
    spectrum::SampledSpectrum,
    utils::{self, FloatExt},
};

/// Unpolarized Fresnel reflectance of a dielectric interface.
///
/// `eta` is the index of refraction of the transmitted side over the index of the incident side.
/// A negative cosine means the light arrives from the other side, eta is inverted then.
#[must_use]
pub fn fresnel_dielectric(cos_theta_i: f64, eta: f64) -> f64 {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let mut eta = eta;
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    let sin2_theta_i = 1.0 - cos_theta_i.sq();
    let sin2_theta_t = sin2_theta_i / eta.sq();
    if sin2_theta_t >= 1.0 {
        // total internal reflection
        return 1.0;
    }
    let cos_theta_t = utils::safe_sqrt(1.0 - sin2_theta_t);

    #[allow(clippy::suboptimal_flops)]
    let r_parallel = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    #[allow(clippy::suboptimal_flops)]
    let r_perpendicular = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (r_parallel.sq() + r_perpendicular.sq()) / 2.0
}

/// Schlick's approximation `R0 + (1 - R0)(1 - cos θ)^5`
#[must_use]
pub fn fresnel_schlick(r0: SampledSpectrum, cos_theta: f64) -> SampledSpectrum {
    let weight = utils::schlick_weight(cos_theta);
    r0.lerp(SampledSpectrum::one(r0.dimension()), weight)
}

/// Reflectance at normal incidence of a dielectric with relative index `eta`
#[must_use]
pub fn schlick_r0_from_eta(eta: f64) -> f64 {
    ((eta - 1.0) / (eta + 1.0)).sq()
}

/// Identifies the Fresnel model without its parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FresnelKind {
    Dielectric,
    Schlick,
    Disney,
}

/// The Fresnel model of a shading point.
///
/// `eta` is the index of refraction below the surface over the index above it. Evaluations for a
/// given outgoing direction first call [`Fresnel::corrected`], which returns a copy whose eta is
/// relative to the side of that direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fresnel {
    Dielectric {
        eta: SampledSpectrum,
    },
    Schlick {
        r0: SampledSpectrum,
        eta: SampledSpectrum,
    },
    /// Dielectric reflectance blended towards a Schlick curve by `metallic`
    Disney {
        r0: SampledSpectrum,
        metallic: f64,
        eta: SampledSpectrum,
    },
}

impl Fresnel {
    #[must_use]
    pub const fn kind(&self) -> FresnelKind {
        match self {
            Self::Dielectric { .. } => FresnelKind::Dielectric,
            Self::Schlick { .. } => FresnelKind::Schlick,
            Self::Disney { .. } => FresnelKind::Disney,
        }
    }

    #[must_use]
    pub fn eta(&self) -> SampledSpectrum {
        match self {
            Self::Dielectric { eta } | Self::Schlick { eta, .. } | Self::Disney { eta, .. } => *eta,
        }
    }

    /// Copy of `self` with eta inverted if the outgoing direction is below the surface
    #[must_use]
    pub fn corrected(self, cos_theta_o: f64) -> Self {
        if cos_theta_o > 0.0 {
            return self;
        }
        match self {
            Self::Dielectric { eta } => Self::Dielectric { eta: eta.recip() },
            Self::Schlick { r0, eta } => Self::Schlick {
                r0,
                eta: eta.recip(),
            },
            Self::Disney { r0, metallic, eta } => Self::Disney {
                r0,
                metallic,
                eta: eta.recip(),
            },
        }
    }

    #[must_use]
    pub fn evaluate(&self, cos_theta: f64) -> SampledSpectrum {
        match *self {
            Self::Dielectric { eta } => eta.map(|eta| fresnel_dielectric(cos_theta, eta)),
            Self::Schlick { r0, .. } => fresnel_schlick(r0, cos_theta),
            Self::Disney { r0, metallic, eta } => {
                let dielectric = eta.map(|eta| fresnel_dielectric(cos_theta, eta));
                dielectric.lerp(fresnel_schlick(r0, cos_theta), metallic)
            }
        }
    }
}
