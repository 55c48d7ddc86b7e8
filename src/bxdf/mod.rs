//! Single scattering lobes. Lobe sets in [`crate::material`] combine them into a full BSDF.

mod disney;
mod fresnel_blend;
mod microfacet;

pub use disney::{gtr1, smith_g_ggx, Clearcoat, Diffuse, FakeSS, Retro, Sheen};
pub use fresnel_blend::FresnelBlend;
pub use microfacet::{MicrofacetReflection, MicrofacetTransmission};

use crate::{
    core::{BsdfSample, BxDFFlags, SampledDirection, Sampler, ScatterEval},
    fresnel::Fresnel,
    spectrum::SampledSpectrum,
    utils, Vec2d, Vec3d,
};

/// One scattering lobe in the local shading frame.
///
/// The Fresnel model passed in is already corrected for the side of `wo`. Lobes that do not
/// depend on it ignore it.
pub trait BxDF {
    fn flags(&self) -> BxDFFlags;

    fn albedo(&self) -> SampledSpectrum;

    /// Value of the lobe, without the `|cos theta_i|` term
    fn f(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum;

    /// Density of [`BxDF::sample_wi`]. Cosine weighted hemisphere unless overridden.
    fn pdf(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> f64 {
        utils::cosine_hemisphere_pdf(wo, wi)
    }

    /// Samples an incident direction. Cosine weighted hemisphere unless overridden.
    fn sample_wi(&self, wo: Vec3d, u: Vec2d, fresnel: &Fresnel) -> SampledDirection {
        let (wi, _) = utils::sample_cosine_hemisphere(wo, u);
        SampledDirection {
            wi,
            pdf: self.pdf(wo, wi, fresnel),
            valid: wo.z != 0.0,
            flags: self.flags(),
        }
    }

    fn evaluate(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> ScatterEval {
        ScatterEval {
            f: self.f(wo, wi, fresnel),
            pdf: self.pdf(wo, wi, fresnel),
            flags: self.flags(),
        }
    }

    fn sample(&self, wo: Vec3d, sampler: &mut dyn Sampler, fresnel: &Fresnel) -> BsdfSample {
        let sampled = self.sample_wi(wo, sampler.next_2d(), fresnel);
        if !sampled.valid {
            return BsdfSample {
                eval: ScatterEval::zero(self.albedo().dimension()),
                wi: sampled.wi,
            };
        }
        let mut eval = self.evaluate(wo, sampled.wi, fresnel);
        eval.flags = sampled.flags;
        BsdfSample {
            eval,
            wi: sampled.wi,
        }
    }
}
