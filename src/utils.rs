use std::f64::consts;

use crate::{Vec2d, Vec3d};

pub trait FloatExt {
    fn sq(self) -> Self;
    fn lerp(self, other: Self, t: Self) -> Self;
}

impl FloatExt for f64 {
    fn sq(self) -> Self {
        self * self
    }
    fn lerp(self, other: Self, t: Self) -> Self {
        #[allow(clippy::suboptimal_flops)]
        {
            self * (1.0 - t) + other * t
        }
    }
}

/// Color helpers on [`RgbD`](crate::RgbD)
pub trait VecExt {
    type Scalar;
    /// Returns the perceived brightness of the color
    #[must_use]
    fn luminance(self) -> Self::Scalar;
}

impl VecExt for Vec3d {
    type Scalar = f64;

    fn luminance(self) -> Self::Scalar {
        self.dot(Self::new(0.2126, 0.7152, 0.0722))
    }
}

// ---------- local shading frame trigonometry, the normal is +z ----------

#[must_use]
pub fn cos_theta(w: Vec3d) -> f64 {
    w.z
}

#[must_use]
pub fn cos2_theta(w: Vec3d) -> f64 {
    w.z * w.z
}

#[must_use]
pub fn abs_cos_theta(w: Vec3d) -> f64 {
    w.z.abs()
}

#[must_use]
pub fn sin2_theta(w: Vec3d) -> f64 {
    (1.0 - cos2_theta(w)).max(0.0)
}

#[must_use]
pub fn sin_theta(w: Vec3d) -> f64 {
    sin2_theta(w).sqrt()
}

/// infinite at grazing angles
#[must_use]
pub fn tan2_theta(w: Vec3d) -> f64 {
    sin2_theta(w) / cos2_theta(w)
}

#[must_use]
pub fn cos_phi(w: Vec3d) -> f64 {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        1.0
    } else {
        (w.x / sin_theta).clamp(-1.0, 1.0)
    }
}

#[must_use]
pub fn sin_phi(w: Vec3d) -> f64 {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 {
        0.0
    } else {
        (w.y / sin_theta).clamp(-1.0, 1.0)
    }
}

#[must_use]
pub fn same_hemisphere(w: Vec3d, wp: Vec3d) -> bool {
    w.z * wp.z > 0.0
}

#[must_use]
pub fn spherical_direction(sin_theta: f64, cos_theta: f64, phi: f64) -> Vec3d {
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3d::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
}

/// Mirrors `vec` at the normal `n`
#[must_use]
pub fn reflect(n: Vec3d, vec: Vec3d) -> Vec3d {
    n * (n.dot(vec) * 2.0) - vec
}

/// Refracts `omega` through a surface with normal `n`. `eta` is the ratio of the index of
/// refraction on the side of `omega` over the index on the other side. `n` has to point to the
/// side of `omega`.
///
/// Returns `None` on total internal reflection
#[must_use]
pub fn refract(omega: Vec3d, n: Vec3d, eta: f64) -> Option<Vec3d> {
    let cos_theta_i = n.dot(omega);
    #[allow(clippy::suboptimal_flops)]
    let sin2_theta_t = eta.sq() * (1.0 - cos_theta_i.sq()).max(0.0);
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    #[allow(clippy::suboptimal_flops)]
    Some(-omega * eta + n * (eta * cos_theta_i - cos_theta_t))
}

#[must_use]
pub fn pow5(v: f64) -> f64 {
    let v2 = v * v;
    v2 * v2 * v
}

#[must_use]
pub fn schlick_weight(cos_theta: f64) -> f64 {
    pow5((1.0 - cos_theta).clamp(0.0, 1.0))
}

/// square root that treats small negative rounding errors as zero
#[must_use]
pub fn safe_sqrt(v: f64) -> f64 {
    v.max(0.0).sqrt()
}

/// Reuses a uniform number after it has been compared against `lower..upper` to make a discrete
/// choice. The result is uniform in `[0, 1)` again.
#[must_use]
pub fn remap(u: f64, lower: f64, upper: f64) -> f64 {
    if upper <= lower {
        return 0.0;
    }
    ((u - lower) / (upper - lower)).clamp(0.0, 1.0 - f64::EPSILON)
}

/* pdf is cos(theta) / pi */
#[must_use]
pub fn hemispherical_sample_cos_weighted_uv(u: f64, v: f64) -> (Vec3d, f64) {
    let eps_theta_sample = u.clamp(1e-6, 1.0); // prevent division by zero (division by pdf)
    let cos_theta = eps_theta_sample.sqrt();
    let sin_theta = (1.0 - eps_theta_sample).sqrt();
    let phi = 2.0 * consts::PI * v;
    (
        spherical_direction(sin_theta, cos_theta, phi),
        cos_theta / consts::PI,
    )
}

/// Samples the cosine weighted hemisphere on the side of `wo`
#[must_use]
pub fn sample_cosine_hemisphere(wo: Vec3d, u: Vec2d) -> (Vec3d, f64) {
    let (wi, pdf) = hemispherical_sample_cos_weighted_uv(u.x, u.y);
    if wo.z < 0.0 {
        (Vec3d::new(wi.x, wi.y, -wi.z), pdf)
    } else {
        (wi, pdf)
    }
}

#[must_use]
pub fn cosine_hemisphere_pdf(wo: Vec3d, wi: Vec3d) -> f64 {
    if same_hemisphere(wo, wi) {
        abs_cos_theta(wi) / consts::PI
    } else {
        0.0
    }
}
