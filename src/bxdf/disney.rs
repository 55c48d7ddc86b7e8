//! The diffuse and clearcoat lobes of Burley's principled BRDF
//!
//! * Brent Burley. Physically-based shading at Disney, course notes, revised 2014.
//! * Brent Burley. Extending the Disney BRDF to a BSDF with integrated subsurface scattering, 2015.

use std::f64::consts;

use super::BxDF;
use crate::{
    core::{BxDFFlags, SampledDirection},
    fresnel::Fresnel,
    spectrum::SampledSpectrum,
    utils::{self, FloatExt},
    Vec2d, Vec3d,
};

/// `wo + wi` normalized, `None` if the directions cancel out
fn half_vector(wo: Vec3d, wi: Vec3d) -> Option<Vec3d> {
    (wo + wi).try_normalize()
}

/// Lambertian diffuse, softened at grazing angles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diffuse {
    pub color: SampledSpectrum,
}

impl BxDF for Diffuse {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let fo = utils::schlick_weight(utils::abs_cos_theta(wo));
        let fi = utils::schlick_weight(utils::abs_cos_theta(wi));
        #[allow(clippy::suboptimal_flops)]
        let lambert = (1.0 - 0.5 * fo) * (1.0 - 0.5 * fi);
        self.color * (consts::FRAC_1_PI * lambert)
    }
}

/// Retro-reflection of rough surfaces at grazing angles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Retro {
    pub color: SampledSpectrum,
    pub roughness: f64,
}

impl BxDF for Retro {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return self.color * 0.0;
        };
        let cos_theta_d = wi.dot(wh);
        let fo = utils::schlick_weight(utils::abs_cos_theta(wo));
        let fi = utils::schlick_weight(utils::abs_cos_theta(wi));
        let rr = 2.0 * self.roughness * cos_theta_d.sq();
        #[allow(clippy::suboptimal_flops)]
        let retro = rr * (fo + fi + fo * fi * (rr - 1.0));
        self.color * (consts::FRAC_1_PI * retro)
    }
}

/// Grazing rim highlight of cloth-like surfaces
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sheen {
    pub color: SampledSpectrum,
}

impl BxDF for Sheen {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return self.color * 0.0;
        };
        self.color * utils::schlick_weight(wi.dot(wh))
    }
}

/// Hanrahan-Krueger inspired approximation of subsurface scattering, used to flatten the diffuse
/// response
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FakeSS {
    pub color: SampledSpectrum,
    pub roughness: f64,
}

impl BxDF for FakeSS {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::DIFFUSE_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        self.color
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        if !utils::same_hemisphere(wo, wi) {
            return self.color * 0.0;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return self.color * 0.0;
        };
        let cos_theta_d = wi.dot(wh);
        let fss90 = cos_theta_d.sq() * self.roughness;
        let fo = utils::schlick_weight(utils::abs_cos_theta(wo));
        let fi = utils::schlick_weight(utils::abs_cos_theta(wi));
        let fss = 1.0_f64.lerp(fss90, fo) * 1.0_f64.lerp(fss90, fi);
        let cos_sum = utils::abs_cos_theta(wo) + utils::abs_cos_theta(wi);
        let ss = 1.25 * (fss * (1.0 / cos_sum - 0.5) + 0.5);
        self.color * (consts::FRAC_1_PI * ss)
    }
}

/// Generalized Trowbridge-Reitz distribution with exponent 1
#[must_use]
pub fn gtr1(cos_theta_h: f64, alpha: f64) -> f64 {
    if alpha >= 1.0 {
        return consts::FRAC_1_PI;
    }
    let alpha2 = alpha.sq();
    #[allow(clippy::suboptimal_flops)]
    let t = 1.0 + (alpha2 - 1.0) * cos_theta_h.sq();
    (alpha2 - 1.0) / (consts::PI * alpha2.ln() * t)
}

/// Separable Smith masking for GGX, divided by `2 cos theta`
#[must_use]
pub fn smith_g_ggx(cos_theta: f64, alpha: f64) -> f64 {
    let alpha2 = alpha.sq();
    let cos2 = cos_theta.sq();
    #[allow(clippy::suboptimal_flops)]
    {
        1.0 / (cos_theta + (alpha2 + cos2 - alpha2 * cos2).sqrt())
    }
}

/// A thin, colorless specular coating with a fixed index of refraction of 1.5
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clearcoat {
    pub weight: f64,

    /// roughness of the coating, used as GTR1 alpha
    pub alpha: f64,
    pub dimension: usize,
}

impl Clearcoat {
    /// reflectance at normal incidence
    pub const R0: f64 = 0.04;
    const SHADOWING_ALPHA: f64 = 0.25;
}

impl BxDF for Clearcoat {
    fn flags(&self) -> BxDFFlags {
        BxDFFlags::GLOSSY_REFLECTION
    }

    fn albedo(&self) -> SampledSpectrum {
        SampledSpectrum::splat(self.dimension, self.weight)
    }

    fn f(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> SampledSpectrum {
        let zero = SampledSpectrum::zero(self.dimension);
        if !utils::same_hemisphere(wo, wi) {
            return zero;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return zero;
        };
        let dr = gtr1(utils::abs_cos_theta(wh), self.alpha);
        let fr = Self::R0.lerp(1.0, utils::schlick_weight(wo.dot(wh)));
        let gr = smith_g_ggx(utils::abs_cos_theta(wo), Self::SHADOWING_ALPHA)
            * smith_g_ggx(utils::abs_cos_theta(wi), Self::SHADOWING_ALPHA);
        SampledSpectrum::splat(self.dimension, self.weight * gr * fr * dr / 4.0)
    }

    fn pdf(&self, wo: Vec3d, wi: Vec3d, _fresnel: &Fresnel) -> f64 {
        if !utils::same_hemisphere(wo, wi) {
            return 0.0;
        }
        let Some(wh) = half_vector(wo, wi) else {
            return 0.0;
        };
        let wo_dot_wh = wo.dot(wh);
        if wo_dot_wh <= 0.0 {
            return 0.0;
        }
        gtr1(utils::abs_cos_theta(wh), self.alpha) * utils::abs_cos_theta(wh) / (4.0 * wo_dot_wh)
    }

    fn sample_wi(&self, wo: Vec3d, u: Vec2d, fresnel: &Fresnel) -> SampledDirection {
        if wo.z == 0.0 {
            return SampledDirection::invalid();
        }
        let alpha2 = self.alpha.sq();
        let cos_theta = if alpha2 >= 1.0 {
            utils::safe_sqrt(1.0 - u.x)
        } else {
            utils::safe_sqrt((1.0 - alpha2.powf(1.0 - u.x)) / (1.0 - alpha2))
        };
        let sin_theta = utils::safe_sqrt(1.0 - cos_theta.sq());
        let phi = 2.0 * consts::PI * u.y;
        let wh = utils::spherical_direction(sin_theta, cos_theta, phi);
        let wh = if utils::same_hemisphere(wo, wh) { wh } else { -wh };

        let wi = utils::reflect(wh, wo);
        if !utils::same_hemisphere(wo, wi) {
            return SampledDirection::invalid();
        }
        SampledDirection {
            wi,
            pdf: self.pdf(wo, wi, fresnel),
            valid: true,
            flags: self.flags(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use std::f64::consts;

    use super::{gtr1, smith_g_ggx, Clearcoat, Diffuse, FakeSS, Retro, Sheen};
    use crate::{
        bxdf::BxDF,
        spectrum::SampledSpectrum,
        test_utils::{self, assert_eq_approx, assert_eq_approx_abs, integrate_sphere},
        Vec3d,
    };

    fn color() -> SampledSpectrum {
        SampledSpectrum::from_slice(&[0.8, 0.5, 0.2]).unwrap()
    }

    #[test]
    fn diffuse_at_normal_incidence_is_lambert() {
        let fresnel = test_utils::dielectric(1.5);
        let diffuse = Diffuse { color: color() };
        let f = diffuse.f(Vec3d::Z, Vec3d::Z, &fresnel);
        assert_eq_approx!(f[0], 0.8 / consts::PI, 0.0, 1e-12);
        assert_eq!(diffuse.f(Vec3d::Z, -Vec3d::Z, &fresnel), SampledSpectrum::zero(3));
    }

    #[test]
    fn diffuse() {
        let fresnel = test_utils::dielectric(1.5);
        let lobe = Diffuse {
            color: SampledSpectrum::one(3),
        };
        test_utils::test_lobe_sample_eval(&lobe, fresnel);
        test_utils::test_lobe_reciprocity(&lobe, fresnel);
        test_utils::test_lobe_pdf_matches_sampling(&lobe, Vec3d::new(0.6, 0.0, 0.8), fresnel);
        test_utils::test_lobe_energy_conservation(&lobe, fresnel, 1.0);
    }

    #[test]
    fn grazing_lobes_vanish_at_normal_incidence() {
        let fresnel = test_utils::dielectric(1.5);
        let retro = Retro {
            color: color(),
            roughness: 0.7,
        };
        let sheen = Sheen { color: color() };
        assert_eq!(retro.f(Vec3d::Z, Vec3d::Z, &fresnel), SampledSpectrum::zero(3));
        assert_eq!(sheen.f(Vec3d::Z, Vec3d::Z, &fresnel), SampledSpectrum::zero(3));

        let grazing = Vec3d::new(0.99, 0.0, (1.0_f64 - 0.99 * 0.99).sqrt());
        assert!(retro.f(grazing, grazing, &fresnel)[0] > 0.0);
        let opposite = Vec3d::new(-grazing.x, 0.0, grazing.z);
        assert!(sheen.f(grazing, opposite, &fresnel)[0] > 0.1);
    }

    #[test]
    fn diffuse_lobes_are_reciprocal() {
        let fresnel = test_utils::dielectric(1.5);
        test_utils::test_lobe_reciprocity(
            &Retro {
                color: color(),
                roughness: 0.4,
            },
            fresnel,
        );
        test_utils::test_lobe_reciprocity(&Sheen { color: color() }, fresnel);
        test_utils::test_lobe_reciprocity(
            &FakeSS {
                color: color(),
                roughness: 0.4,
            },
            fresnel,
        );
    }

    #[test]
    fn fake_subsurface_is_finite() {
        let fresnel = test_utils::dielectric(1.5);
        let lobe = FakeSS {
            color: color(),
            roughness: 1.0,
        };
        let grazing = Vec3d::new(1.0, 0.0, 1e-9).normalize();
        let f = lobe.f(grazing, Vec3d::new(-1.0, 0.0, 1e-9).normalize(), &fresnel);
        assert!(f.is_finite());
        assert_eq!(lobe.f(Vec3d::X, Vec3d::X, &fresnel), SampledSpectrum::zero(3));
    }

    #[test]
    fn gtr1_is_normalized() {
        for alpha in [0.1, 0.25, 0.6, 1.0] {
            let integral = integrate_sphere(20_000, 4, |wh| {
                if wh.z > 0.0 {
                    gtr1(wh.z, alpha) * wh.z
                } else {
                    0.0
                }
            });
            assert_eq_approx_abs!(integral, 1.0, 2e-3, "alpha: {alpha}, integral: {integral}");
        }
        assert_eq_approx!(smith_g_ggx(1.0, 0.25), 0.5, 0.0, 1e-12);
    }

    #[test]
    fn clearcoat() {
        let fresnel = test_utils::dielectric(1.5);
        let lobe = Clearcoat {
            weight: 1.0,
            alpha: 0.2,
            dimension: 3,
        };
        test_utils::test_lobe_sample_eval(&lobe, fresnel);
        test_utils::test_lobe_reciprocity(&lobe, fresnel);
        test_utils::test_lobe_pdf_matches_sampling(&lobe, Vec3d::new(0.6, 0.0, 0.8), fresnel);
        test_utils::test_lobe_energy_conservation(&lobe, fresnel, 1.0);
    }

    #[test]
    fn clearcoat_reflects_four_percent_at_normal_incidence() {
        let fresnel = test_utils::dielectric(1.5);
        let lobe = Clearcoat {
            weight: 1.0,
            alpha: 0.001,
            dimension: 3,
        };
        // GTR1 at its peak, masking is 1/(2 cos)² at normal incidence
        let expected = 0.04 * 0.25 * gtr1(1.0, 0.001) / 4.0;
        assert_eq_approx!(lobe.f(Vec3d::Z, Vec3d::Z, &fresnel)[1], expected, 0.0, 1e-12);
    }
}
