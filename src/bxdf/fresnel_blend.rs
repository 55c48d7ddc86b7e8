use std::f64::consts;

use super::BxDF;
use crate::{
    core::{BxDFFlags, SampledDirection},
    fresnel::{fresnel_schlick, Fresnel},
    microfacet::Microfacet,
    spectrum::SampledSpectrum,
    utils, Vec2d, Vec3d,
};

/// Ashikhmin-Shirley coupled diffuse and glossy reflection of a varnished substrate.
///
/// The Fresnel model handed to it only decides how often the glossy part is sampled, the
/// reflectance of the coating comes from `rs`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FresnelBlend {
    /// diffuse reflectance of the substrate
    pub rd: SampledSpectrum,

    /// specular reflectance of the coating at normal incidence
    pub rs: SampledSpectrum,
    pub microfacet: Microfacet,
}

impl FresnelBlend {
    #[must_use]
    pub fn f_diffuse(&self, wo: Vec3d, wi: Vec3d) -> SampledSpectrum {
        #[allow(clippy::suboptimal_flops)]
        let grazing = |w: Vec3d| 1.0 - utils::pow5(1.0 - 0.5 * utils::abs_cos_theta(w));
        let scale = 28.0 / (23.0 * consts::PI) * grazing(wi) * grazing(wo);
        self.rd * (SampledSpectrum::one(self.rs.dimension()) - self.rs) * scale
    }

    #[must_use]
    pub fn f_specular(&self, wo: Vec3d, wi: Vec3d) -> SampledSpectrum {
        let Some(wh) = (wo + wi).try_normalize() else {
            return self.rs * 0.0;
        };
        let denom = 4.0
            * wi.dot(wh).abs()
            * utils::abs_cos_theta(wi).max(utils::abs_cos_theta(wo));
        if denom < 1e-12 {
            return self.rs * 0.0;
        }
        fresnel_schlick(self.rs, wi.dot(wh)) * (self.microfacet.d(wh) / denom)
    }

    /// Probability of sampling the glossy part
    fn specular_probability(wo: Vec3d, fresnel: &Fresnel) -> f64 {
        fresnel.evaluate(utils::abs_cos_theta(wo)).first()
    }
}

impl BxDF for FresnelBlend {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION | BxDFFlags::GLOSSY_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.rd
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.rd * 0.0;
        }
        self.f_diffuse(wo, wi) + self.f_specular(wo, wi)
    }

    fn pdf(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> f64 {
        let fr = Self::specular_probability(wo, fresnel);
        #[allow(clippy::suboptimal_flops)]
        {
            (1.0 - fr) * utils::cosine_hemisphere_pdf(wo, wi)
                + fr * self.microfacet.reflection_pdf(wo, wi)
        }
    }

    fn sample_wi(&self, wo: Vec3d, u: Vec2d, fresnel: &Fresnel) -> SampledDirection {
        if wo.z == 0.0 {
            return SampledDirection::invalid();
        }
        let fr = Self::specular_probability(wo, fresnel);
        let (wi, flags) = if u.x < fr {
            let u = Vec2d::new(utils::remap(u.x, 0.0, fr), u.y);
            let wh = self.microfacet.sample_wh(wo, u);
            (utils::reflect(wh, wo), BxDFFlags::GLOSSY_REFLECTION)
        } else {
            let u = Vec2d::new(utils::remap(u.x, fr, 1.0), u.y);
            let (wi, _) = utils::sample_cosine_hemisphere(wo, u);
            (wi, BxDFFlags::DIFFUSE_REFLECTION)
        };
        if !utils::same_hemisphere(wo, wi) {
            return SampledDirection::invalid();
        }
        SampledDirection {
            wi,
            pdf: self.pdf(wo, wi, fresnel),
            valid: true,
            flags,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::FresnelBlend;
    use crate::{
        bxdf::BxDF,
        microfacet::{Microfacet, MicrofacetType},
        spectrum::SampledSpectrum,
        test_utils::{self, assert_eq_approx},
        BxDFFlags, Vec2d, Vec3d,
    };

    fn substrate() -> FresnelBlend {
        FresnelBlend {
            rd: SampledSpectrum::from_slice(&[0.725, 0.71, 0.68]).unwrap(),
            rs: SampledSpectrum::splat(3, 0.04),
            microfacet: Microfacet::isotropic(0.2, MicrofacetType::GGX),
        }
    }

    #[test]
    fn sampling() {
        let lobe = substrate();
        let fresnel = test_utils::dielectric(1.5);
        test_utils::test_lobe_sample_eval(&lobe, fresnel);
        test_utils::test_lobe_reciprocity(&lobe, fresnel);
        test_utils::test_lobe_pdf_matches_sampling(&lobe, Vec3d::new(0.6, 0.0, 0.8), fresnel);
    }

    #[test]
    fn no_transmission() {
        let lobe = substrate();
        let fresnel = test_utils::dielectric(1.5);
        let wo = Vec3d::new(0.3, 0.2, 0.9).normalize();
        let wi = Vec3d::new(-0.1, 0.4, -0.8).normalize();
        assert_eq!(lobe.f(wo, wi, &fresnel), SampledSpectrum::zero(3));
        assert_eq!(lobe.pdf(wo, wi, &fresnel), 0.0);
    }

    #[test]
    fn white_coating_has_no_diffuse() {
        let lobe = FresnelBlend {
            rs: SampledSpectrum::one(3),
            ..substrate()
        };
        let wo = Vec3d::new(0.3, 0.2, 0.9).normalize();
        assert_eq!(lobe.f_diffuse(wo, Vec3d::Z), SampledSpectrum::zero(3));
    }

    #[test]
    fn branch_is_reported_in_flags() {
        let lobe = substrate();
        let fresnel = test_utils::dielectric(1.5);
        let wo = Vec3d::new(0.3, 0.2, 0.9).normalize();
        let fr = fresnel.evaluate(wo.z).first();

        let glossy = lobe.sample_wi(wo, Vec2d::new(fr * 0.5, 0.3), &fresnel);
        assert!(glossy.valid);
        assert_eq!(glossy.flags, BxDFFlags::GLOSSY_REFLECTION);

        let diffuse = lobe.sample_wi(wo, Vec2d::new(0.5, 0.3), &fresnel);
        assert!(diffuse.valid);
        assert_eq!(diffuse.flags, BxDFFlags::DIFFUSE_REFLECTION);
        assert_eq_approx!(diffuse.pdf, lobe.pdf(wo, diffuse.wi, &fresnel), 0.0, 1e-12);
    }
}
