pub trait ApproxEqual: Copy {
    fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool;
    fn equals_approx_abs(self, other: Self, eps: Self) -> bool;
    fn equals_approx_rel(self, other: Self, eps: Self) -> bool;
}

macro_rules! assert_eq_approx {
    ($lhs:expr, $rhs:expr, $eps_abs:expr, $eps_rel:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel),
            r#"assert_eq_approx failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}
    {} (maximum relative error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
            stringify!($eps_rel),
            $eps_rel,
        );
    };

    ($lhs:expr, $rhs:expr, $eps_abs: expr, $eps_rel:expr, $($arg:tt)+) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx($lhs, $rhs, $eps_abs, $eps_rel),
            $($arg)*
        );
    }
}

macro_rules! assert_eq_approx_abs {
    ($lhs:expr, $rhs:expr, $eps_abs:expr) => {
        assert!(
            $crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
            r#"assert_eq_abs failed:
    {}: {:?}
    {}: {:?}
    {} (maximum absolute error): {:?}"#,
            stringify!($lhs),
            $lhs,
            stringify!($rhs),
            $rhs,
            stringify!($eps_abs),
            $eps_abs,
        )
    };

    ($lhs:expr, $rhs:expr, $eps_abs:expr, $($arg:tt)+) => {
        assert!($crate::test_utils::ApproxEqual::equals_approx_abs($lhs, $rhs, $eps_abs),
        $($arg)*);
    };
}

macro_rules! assert_in_range {
    ($value:expr, $lower:expr, $upper:expr) => {
        assert!(
            $lower <= $value && $value <= $upper,
            r#"assert_in_range failed:
    {} (value): {:?}
    {} (lower bound): {:?}
    {} (upper bound): {:?}"#,
            stringify!($value),
            $value,
            stringify!($lower),
            $lower,
            stringify!($upper),
            $upper
        )
    };

    ($value:expr, $lower:expr, $upper:expr, $($arg:tt)+) => {
        assert!($lower <= $value && $value <= $upper, $($arg)*);
    };
}

macro_rules! impl_approx_equal {
    ($scalar:ty, $vector:ty) => {
        impl ApproxEqual for $scalar {
            fn equals_approx(self, other: Self, eps: Self, eps_rel: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other || (self - other).abs() <= eps {
                    true
                } else {
                    let diff = (self - other).abs();
                    let max = self.abs().max(other.abs());
                    diff <= max * eps_rel
                }
            }

            fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other {
                    true
                } else {
                    (self - other).abs() <= eps
                }
            }

            fn equals_approx_rel(self, other: Self, eps: Self) -> bool {
                #[allow(clippy::float_cmp)]
                if self == other {
                    return true;
                }
                let diff = (self - other).abs();
                let max = self.abs().max(other.abs());
                diff <= max * eps
            }
        }

        impl ApproxEqual for $vector {
            fn equals_approx_rel(self, other: Self, eps: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx_rel(self.x, other.x, eps.x)
                    && $crate::test_utils::ApproxEqual::equals_approx_rel(self.y, other.y, eps.y)
                    && $crate::test_utils::ApproxEqual::equals_approx_rel(self.z, other.z, eps.z)
            }
            fn equals_approx_abs(self, other: Self, eps: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx_abs(self.x, other.x, eps.x)
                    && $crate::test_utils::ApproxEqual::equals_approx_abs(self.y, other.y, eps.y)
                    && $crate::test_utils::ApproxEqual::equals_approx_abs(self.z, other.z, eps.z)
            }
            fn equals_approx(self, other: Self, eps_abs: Self, eps_rel: Self) -> bool {
                $crate::test_utils::ApproxEqual::equals_approx(
                    self.x, other.x, eps_abs.x, eps_rel.x,
                ) && $crate::test_utils::ApproxEqual::equals_approx(
                    self.y, other.y, eps_abs.y, eps_rel.y,
                ) && $crate::test_utils::ApproxEqual::equals_approx(
                    self.z, other.z, eps_abs.z, eps_rel.z,
                )
            }
        }
    };
}

impl_approx_equal!(f64, Vec3d);

use std::f64::consts;

pub(crate) use assert_eq_approx;
pub(crate) use assert_eq_approx_abs;
pub(crate) use assert_in_range;

use rayon::prelude::*;

use crate::{
    bxdf::BxDF,
    core::{BxDFSet, Sampler},
    fresnel::Fresnel,
    spectrum::SampledSpectrum,
    utils::FloatExt,
    Vec3d,
};

impl Sampler for fastrand::Rng {
    fn next_1d(&mut self) -> f64 {
        self.f64()
    }
}

/// Plain dielectric Fresnel over three lanes
pub fn dielectric(eta: f64) -> Fresnel {
    Fresnel::Dielectric {
        eta: SampledSpectrum::splat(3, eta),
    }
}

/** sample a direction with density 1 / 4pi */
pub fn spherical_sample(rd: &mut fastrand::Rng) -> Vec3d {
    let u = rd.f64();
    let v = rd.f64();
    spherical_sample_uv(u, v)
}

fn spherical_sample_uv(u: f64, v: f64) -> Vec3d {
    #[allow(clippy::suboptimal_flops)]
    let cos_theta = 2.0 * u - 1.0;
    #[allow(clippy::suboptimal_flops)]
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    let phi = v * 2.0 * consts::PI;
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(sin_theta * sin_phi, sin_theta * cos_phi, cos_theta)
}

/// Midpoint rule over the whole sphere, in `cos theta` and `phi`
#[allow(clippy::cast_lossless)]
pub fn integrate_sphere(n_cos: usize, n_phi: usize, f: impl Fn(Vec3d) -> f64 + Sync) -> f64 {
    let d_cos = 2.0 / n_cos as f64;
    let d_phi = 2.0 * consts::PI / n_phi as f64;
    (0..n_cos)
        .into_par_iter()
        .map(|i| {
            #[allow(clippy::suboptimal_flops)]
            let cos_theta = -1.0 + (i as f64 + 0.5) * d_cos;
            let sin_theta = (1.0 - cos_theta.sq()).max(0.0).sqrt();
            (0..n_phi)
                .map(|j| {
                    let phi = (j as f64 + 0.5) * d_phi;
                    let (sin_phi, cos_phi) = phi.sin_cos();
                    f(Vec3d::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta))
                })
                .sum::<f64>()
        })
        .sum::<f64>()
        * d_cos
        * d_phi
}

fn assert_spectrum_valid(f: SampledSpectrum, context: &str) {
    assert!(f.is_finite(), "{context}: {f:?} is not finite");
    for value in f.iter() {
        assert!(value >= 0.0, "{context}: {f:?} is negative");
    }
}

/// Directions returned by `sample_wi` must come with the density `pdf` reports for them
pub fn test_lobe_sample_eval<B: BxDF>(lobe: &B, fresnel: Fresnel) {
    let mut rd = fastrand::Rng::with_seed(1);
    let runs = 10_000;
    for _ in 0..runs {
        let wo = spherical_sample(&mut rd);
        let fresnel = fresnel.corrected(wo.z);
        let sampled = lobe.sample_wi(wo, rd.next_2d(), &fresnel);
        if !sampled.valid {
            continue;
        }
        let wi = sampled.wi;
        let f = lobe.f(wo, wi, &fresnel);
        let pdf = lobe.pdf(wo, wi, &fresnel);
        assert_spectrum_valid(f, "f");
        assert!(
            pdf > 0.0 || f.is_zero(),
            r#"
    sampled directions must have a positive pdf
    pdf: {pdf},
    f: {f:?},
    wo: {wo:?},
    wi: {wi:?}"#
        );
        assert_eq_approx!(
            sampled.pdf,
            pdf,
            0.01,
            0.003,
            r#"
    pdfs must be equal for sample_wi and pdf,
    sampled: {},
    pdf: {pdf},
    wo: {wo:?},
    wi: {wi:?}"#,
            sampled.pdf
        );
        assert!(!(sampled.flags & lobe.flags()).is_empty());
    }
}

/// Reflection lobes must not change when `wo` and `wi` are swapped
pub fn test_lobe_reciprocity<B: BxDF>(lobe: &B, fresnel: Fresnel) {
    let mut rd = fastrand::Rng::with_seed(2);
    let runs = 10_000;
    for _ in 0..runs {
        let wo = spherical_sample(&mut rd);
        let wi = spherical_sample(&mut rd);
        let wi = wi * (wi.z * wo.z).signum();

        let forward = lobe.f(wo, wi, &fresnel.corrected(wo.z));
        let backward = lobe.f(wi, wo, &fresnel.corrected(wi.z));
        assert_spectrum_valid(forward, "f");
        for lane in 0..forward.dimension() {
            assert_eq_approx!(
                forward[lane],
                backward[lane],
                1e-3,
                1e-4,
                "lane {lane}: {forward:?} != {backward:?}, wo: {wo:?}, wi: {wi:?}"
            );
        }
    }
}

/// The density over the whole sphere has to integrate to the probability that sampling produces
/// a valid direction
#[allow(clippy::cast_lossless)]
pub fn test_lobe_pdf_matches_sampling<B: BxDF + Sync>(lobe: &B, wo: Vec3d, fresnel: Fresnel) {
    let fresnel = fresnel.corrected(wo.z);
    let integral = integrate_sphere(2000, 1024, |wi| lobe.pdf(wo, wi, &fresnel));

    let mut rd = fastrand::Rng::with_seed(3);
    let num_samples = 200_000;
    let valid = (0..num_samples)
        .filter(|_| lobe.sample_wi(wo, rd.next_2d(), &fresnel).valid)
        .count();
    let valid = valid as f64 / num_samples as f64;

    assert_eq_approx_abs!(
        integral,
        valid,
        0.01,
        "integrated pdf: {integral}, fraction of valid samples: {valid}, wo: {wo:?}"
    );
}

/// Monte Carlo estimate of a directional albedo and its standard error, one value per lane
#[allow(clippy::cast_lossless)]
fn estimate_albedo(
    seed: u64,
    num_samples: usize,
    mut sample: impl FnMut(&mut fastrand::Rng) -> Option<(SampledSpectrum, f64, Vec3d)>,
) -> (SampledSpectrum, SampledSpectrum) {
    let mut rd = fastrand::Rng::with_seed(seed);
    let mut sum: Option<SampledSpectrum> = None;
    let mut sum2: Option<SampledSpectrum> = None;
    for _ in 0..num_samples {
        let Some((f, pdf, wi)) = sample(&mut rd) else {
            continue;
        };
        if pdf <= 0.0 {
            continue;
        }
        let contrib = f * (wi.z.abs() / pdf);
        sum = Some(sum.map_or(contrib, |s| s + contrib));
        sum2 = Some(sum2.map_or(contrib * contrib, |s| s + contrib * contrib));
    }
    let n = num_samples as f64;
    let Some((sum, sum2)) = sum.zip(sum2) else {
        return (SampledSpectrum::zero(1), SampledSpectrum::zero(1));
    };
    let mean = sum / n;
    let variance = (sum2 / n - mean * mean) * (n / (n - 1.0));
    let std_error = (variance.map(f64::abs) / n).sqrt();
    (mean, std_error)
}

fn assert_albedo_bounded(mean: SampledSpectrum, std_error: SampledSpectrum, bound: f64, wo: Vec3d) {
    for lane in 0..mean.dimension() {
        let confidence = (4.0 * std_error[lane]).max(1e-3);
        assert_in_range!(
            mean[lane],
            0.0,
            bound + confidence,
            "albedo {mean:?} exceeds {bound} (std error {std_error:?}) for wo: {wo:?}"
        );
    }
}

fn energy_test_directions() -> Vec<Vec3d> {
    let mut rd = fastrand::Rng::with_seed(4);
    (0..32)
        .map(|_| {
            let cos_theta = rd.f64().mul_add(0.8, 0.2);
            let sin_theta = (1.0 - cos_theta.sq()).sqrt();
            let phi = rd.f64() * 2.0 * consts::PI;
            Vec3d::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
        })
        .collect()
}

/// A lobe lit from above must not reflect or transmit more than `bound`
pub fn test_lobe_energy_conservation<B: BxDF + Sync>(lobe: &B, fresnel: Fresnel, bound: f64) {
    energy_test_directions()
        .into_par_iter()
        .enumerate()
        .for_each(|(i, wo)| {
            let fresnel = fresnel.corrected(wo.z);
            let (mean, std_error) = estimate_albedo(i as u64, 100_000, |rd| {
                let sampled = lobe.sample_wi(wo, rd.next_2d(), &fresnel);
                sampled.valid.then(|| {
                    (
                        lobe.f(wo, sampled.wi, &fresnel),
                        lobe.pdf(wo, sampled.wi, &fresnel),
                        sampled.wi,
                    )
                })
            });
            assert_albedo_bounded(mean, std_error, bound, wo);
        });
}

/// `sample_local` must agree with `evaluate_local` and produce usable values
pub fn test_set_sample_eval<S: BxDFSet>(set: &S) {
    let mut rd = fastrand::Rng::with_seed(5);
    let runs = 10_000;
    for _ in 0..runs {
        let wo = spherical_sample(&mut rd);
        let sample = set.sample_local(wo, &mut rd);
        let eval = sample.eval;
        assert_spectrum_valid(eval.f, "f");
        assert!(eval.pdf >= 0.0 && eval.pdf.is_finite());
        if !eval.is_valid() {
            assert!(eval.f.is_zero(), "f must be zero without a pdf: {eval:?}");
            continue;
        }
        let reference = set.evaluate_local(wo, sample.wi);
        assert_eq_approx!(eval.pdf, reference.pdf, 0.0, 1e-12);
        assert_eq_approx!(set.pdf_local(wo, sample.wi), reference.pdf, 0.0, 1e-12);
        assert_eq!(eval.flags, reference.flags);
    }
}

/// Reflection must not change when `wo` and `wi` are swapped
pub fn test_set_reciprocity<S: BxDFSet>(set: &S) {
    let mut rd = fastrand::Rng::with_seed(6);
    let runs = 10_000;
    for _ in 0..runs {
        let wo = spherical_sample(&mut rd);
        let wi = spherical_sample(&mut rd);
        let wi = wi * (wi.z * wo.z).signum();
        let forward = set.evaluate_local(wo, wi).f;
        let backward = set.evaluate_local(wi, wo).f;
        for lane in 0..forward.dimension() {
            assert_eq_approx!(
                forward[lane],
                backward[lane],
                1e-3,
                1e-4,
                "lane {lane}: {forward:?} != {backward:?}, wo: {wo:?}, wi: {wi:?}"
            );
        }
    }
}

/// The density of the whole set must integrate to the probability of a valid sample
#[allow(clippy::cast_lossless)]
pub fn test_set_pdf_matches_sampling<S: BxDFSet + Sync>(set: &S, wo: Vec3d) {
    let integral = integrate_sphere(2000, 1024, |wi| set.pdf_local(wo, wi));

    let mut rd = fastrand::Rng::with_seed(7);
    let num_samples = 200_000;
    let valid = (0..num_samples)
        .filter(|_| set.sample_wi(wo, &mut rd).valid)
        .count();
    let valid = valid as f64 / num_samples as f64;

    assert_eq_approx_abs!(
        integral,
        valid,
        0.01,
        "integrated pdf: {integral}, fraction of valid samples: {valid}, wo: {wo:?}"
    );
}

/// A set lit from above must not scatter more than `bound`
pub fn test_set_energy_conservation<S: BxDFSet + Sync>(set: &S, bound: f64) {
    energy_test_directions()
        .into_par_iter()
        .enumerate()
        .for_each(|(i, wo)| {
            let (mean, std_error) = estimate_albedo(100 + i as u64, 100_000, |rd| {
                let sample = set.sample_local(wo, rd);
                Some((sample.eval.f, sample.eval.pdf, sample.wi))
            });
            assert_albedo_bounded(mean, std_error, bound, wo);
        });
}
