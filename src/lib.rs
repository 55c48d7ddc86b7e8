#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::nursery)]
#![warn(clippy::suboptimal_flops)]
#![deny(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![deny(clippy::semicolon_if_nothing_returned)]
#![deny(clippy::must_use_candidate)]
#![deny(clippy::double_must_use)]
#![deny(clippy::use_self)]
#![deny(clippy::unreadable_literal)]
#![deny(clippy::explicit_iter_loop)]
// these are lints to enable later
#![allow(clippy::cast_lossless)]

//! Microfacet scattering models and multi-lobe BSDFs for a spectral pathtracer.
//!
//! The crate sits between the materials of a scene and the integrator. A [`material::Material`]
//! reads its attributes at a shading point and builds a [`material::LobeSet`], which implements
//! [`BxDFSet`]: evaluate a pair of directions, sample an incident direction, query densities.
//!
//! # Design Decisions
//! All lighting calculations are done in [f64]s. BSDFs can be extremely spiky and [f64] keeps
//! the numerical errors of the Monte Carlo estimates down.
//!
//! Light is carried as a [`spectrum::SampledSpectrum`]: either three RGB lanes or a handful of
//! sampled wavelengths. Dispersive glass chooses directions for the first (hero) wavelength.
//!
//! BSDFs are computed in a local space. That means, the surface is assumed to be the xy-plane
//! and the z-vector is assumed to be the normal. Therefore incident and exitant vectors must be
//! rotated before or after evaluation of the BSDF.
//!
//! The `|omega_i.dot(n)|`, `|cos theta_i|` or `|omega_i.z|` are not part of the BSDF. The user is
//! responsible for multiplying them in if necessary (almost always).
//!
//! Random numbers are drawn from a [`Sampler`] owned by the caller. This allows you to control
//! the sampling process and the random generator or low discrepancy sequence in use.
//!
//! This crate is built on [glam] for a simple but fast vector math library at the core.
//!
//! # References
//! * Brent Burley. Physically-based shading at Disney, course notes, revised 2014. In *ACM
//!     SIGGRAPH, Practical physically-based shading in film and game production,* 2012.
//! * Brent Burley. Extending the Disney BRDF to a BSDF with integrated subsurface scattering. *SIGGRAPH Course*, 19, 2015.
//! * Eric Heitz. Understanding the masking-shadowing function in microfacet-based brdfs.
//!     *Journal of Computer Graphics Techniques, 3(2):32–91,* 2014.
//! * Eric Heitz, Sampling the GGX Distribution of Visible Normals, *Journal of Computer Graphics Techniques (JCGT)*, vol. 7, no. 4, 1–13, 2018
//!     <http://jcgt.org/published/0007/04/01/>
//! * Bruce Walter, Stephen R. Marschner, Hongsong Li, and Kenneth E. Torrance. Microfacet models for refraction through rough surfaces. In *Proceedings of the Eurographics Symposium on Rendering,* 2007.
//! * Michael Ashikhmin and Peter Shirley. An anisotropic Phong BRDF model. *Journal of Graphics Tools, 5(2):25–32,* 2000.
//! * Matt Pharr, Wenzel Jakob, and Greg Humphreys. *Physically Based Rendering: From Theory to Implementation,* 3rd edition, 2016.

mod core;
mod error;

pub use crate::core::{
    BsdfSample, BxDFFlags, BxDFSet, RgbD, SampledDirection, Sampler, ScatterEval, Vec2d, Vec3d,
};
pub use error::{Error, Result};

pub mod bxdf;
pub mod fresnel;
pub mod material;
pub mod microfacet;
pub mod spectrum;

#[cfg(test)]
pub(crate) mod test_utils;
pub(crate) mod utils;
