use super::{structural_hash, AttributeSource, Slot};
use crate::{
    bxdf::{BxDF, FresnelBlend},
    core::{BxDFFlags, BxDFSet, SampledDirection, Sampler, ScatterEval},
    fresnel::Fresnel,
    microfacet::{Microfacet, MicrofacetType},
    spectrum::{SampledSpectrum, SampledWavelengths},
    utils, RgbD, Vec2d, Vec3d,
};

/// A diffuse base under a thin glossy coating
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubstrateMaterial {
    pub color: Slot<RgbD>,
    /// reflectance of the coating at normal incidence
    pub spec: Slot<RgbD>,
    pub roughness: Slot<Vec2d>,
    pub remap_roughness: bool,
}

impl Default for SubstrateMaterial {
    fn default() -> Self {
        Self {
            color: Slot::Constant(RgbD::ONE),
            spec: Slot::Constant(RgbD::splat(0.05)),
            roughness: Slot::Constant(Vec2d::splat(0.001)),
            remap_roughness: true,
        }
    }
}

impl SubstrateMaterial {
    /// Index of refraction of the coating, only used to pick between the two parts
    const COATING_ETA: f64 = 1.5;

    #[must_use]
    pub fn create_lobe_set(
        &self,
        source: &dyn AttributeSource,
        swl: &SampledWavelengths,
    ) -> SubstrateBxDFSet {
        let microfacet = Microfacet::from_roughness(
            self.roughness.evaluate(source),
            self.remap_roughness,
            MicrofacetType::GGX,
        );
        SubstrateBxDFSet {
            fresnel: Fresnel::Dielectric {
                eta: SampledSpectrum::splat(swl.dimension(), Self::COATING_ETA),
            },
            bxdf: FresnelBlend {
                rd: self.color.albedo(source, swl).sample,
                rs: self.spec.albedo(source, swl).sample,
                microfacet,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubstrateBxDFSet {
    /// Not corrected for the side of `wo`, the coating has no inside
    fresnel: Fresnel,
    bxdf: FresnelBlend,
}

impl BxDFSet for SubstrateBxDFSet {
    fn albedo(&self) -> SampledSpectrum {
        self.bxdf.albedo()
    }

    fn evaluate_local(&self, wo: Vec3d, wi: Vec3d) -> ScatterEval {
        if !utils::same_hemisphere(wo, wi) {
            return ScatterEval::zero(self.bxdf.rd.dimension());
        }
        let diffuse = self.bxdf.f_diffuse(wo, wi);
        let specular = self.bxdf.f_specular(wo, wi);
        let flags = if diffuse.average() >= specular.average() {
            BxDFFlags::DIFFUSE_REFLECTION
        } else {
            BxDFFlags::GLOSSY_REFLECTION
        };
        ScatterEval {
            f: diffuse + specular,
            pdf: self.bxdf.pdf(wo, wi, &self.fresnel),
            flags,
        }
    }

    fn sample_wi(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> SampledDirection {
        self.bxdf.sample_wi(wo, sampler.next_2d(), &self.fresnel)
    }

    fn type_hash(&self) -> u64 {
        structural_hash(("substrate", self.fresnel.kind(), self.bxdf.microfacet.ty))
    }
}
