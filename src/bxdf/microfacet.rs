//! Glossy reflection and transmission on top of a [`Microfacet`] distribution

use super::BxDF;
use crate::{
    core::{BxDFFlags, SampledDirection},
    fresnel::Fresnel,
    microfacet::{transmission_half_vector, Microfacet},
    spectrum::SampledSpectrum,
    utils, Vec2d, Vec3d,
};

/// Cook-Torrance reflection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MicrofacetReflection {
    pub color: SampledSpectrum,
    pub microfacet: Microfacet,
}

impl BxDF for MicrofacetReflection {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::GLOSSY_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let Some(wh) = (wo + wi).try_normalize() else {
            return self.color * 0.0;
        };
        let fr = fresnel.evaluate(wo.dot(wh).abs());
        self.color * fr * self.microfacet.brdf_div_fr(wo, wh, wi)
    }

    fn pdf(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> f64 {
        self.microfacet.reflection_pdf(wo, wi)
    }

    fn sample_wi(&self, wo: Vec3d, u: Vec2d, _fresnel: &Fresnel) -> SampledDirection {
        if wo.z == 0.0 {
            return SampledDirection::invalid();
        }
        let wh = self.microfacet.sample_wh(wo, u);
        if wo.dot(wh) <= 0.0 {
            return SampledDirection::invalid();
        }
        let wi = utils::reflect(wh, wo);
        if !utils::same_hemisphere(wo, wi) {
            return SampledDirection::invalid();
        }
        SampledDirection {
            wi,
            pdf: Microfacet::pdf_wi_reflection(self.microfacet.pdf_wh(wh), wo, wh),
            valid: true,
            flags: self.flags(),
        }
    }
}

/// Walter et al. rough dielectric transmission.
///
/// With a dispersive Fresnel model every lane has its own eta. Directions are sampled and
/// evaluated for the first (hero) lane, [`MicrofacetTransmission::pdf_spectral`] gives the
/// densities the other lanes would have had.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MicrofacetTransmission {
    pub color: SampledSpectrum,
    pub microfacet: Microfacet,
}

impl MicrofacetTransmission {
    /// Density of `wi` for the eta of every lane
    #[must_use]
    pub fn pdf_spectral(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum {
        if utils::same_hemisphere(wo, wi) {
            return fresnel.eta() * 0.0;
        }
        self.microfacet
            .pdf_wi_transmission_spectral(wo, wi, fresnel.eta())
    }
}

impl BxDF for MicrofacetTransmission {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::GLOSSY_TRANSMISSION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum {
        if utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let eta = fresnel.eta().first();
        let Some(wh) = transmission_half_vector(wo, wi, eta) else {
            return self.color * 0.0;
        };
        let fr = fresnel.evaluate(wo.dot(wh).abs());
        let ft = SampledSpectrum::one(fr.dimension()) - fr;
        self.color * ft * self.microfacet.btdf_div_ft(wo, wh, wi, eta)
    }

    fn pdf(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> f64 {
        if utils::same_hemisphere(wo, wi) {
            return 0.0;
        }
        self.microfacet
            .transmission_pdf(wo, wi, fresnel.eta().first())
    }

    fn sample_wi(&self, wo: Vec3d, u: Vec2d, fresnel: &Fresnel) -> SampledDirection {
        if wo.z == 0.0 {
            return SampledDirection::invalid();
        }
        let wh = self.microfacet.sample_wh(wo, u);
        if wo.dot(wh) <= 0.0 {
            return SampledDirection::invalid();
        }
        let eta = fresnel.eta().first();
        let Some(wi) = utils::refract(wo, wh, 1.0 / eta) else {
            return SampledDirection::invalid();
        };
        if wi.z == 0.0 || utils::same_hemisphere(wo, wi) {
            return SampledDirection::invalid();
        }
        SampledDirection {
            wi,
            pdf: Microfacet::pdf_wi_transmission(self.microfacet.pdf_wh(wh), wo, wh, wi, eta),
            valid: true,
            flags: self.flags(),
        }
    }
}
