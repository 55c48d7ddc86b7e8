//! Burley's principled BSDF as a set of independently sampled lobes

use super::{structural_hash, AttributeSource, Slot};
use crate::{
    bxdf::{
        BxDF, Clearcoat, Diffuse, FakeSS, MicrofacetReflection, MicrofacetTransmission, Retro,
        Sheen,
    },
    core::{BxDFFlags, BxDFSet, SampledDirection, Sampler, ScatterEval},
    fresnel::{schlick_r0_from_eta, Fresnel},
    microfacet::{Microfacet, MicrofacetType},
    spectrum::{SampledSpectrum, SampledWavelengths},
    utils::{self, FloatExt},
    RgbD, Vec2d, Vec3d,
};

/// Parameters of the principled material. Every unitless parameter is expected in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisneyMaterial {
    pub color: Slot<RgbD>,
    pub metallic: Slot<f64>,
    /// index of refraction below the surface, the medium above is assumed to be vacuum
    pub ior: Slot<f64>,
    pub roughness: Slot<f64>,
    pub spec_tint: Slot<f64>,
    pub anisotropic: Slot<f64>,
    pub sheen: Slot<f64>,
    pub sheen_tint: Slot<f64>,
    pub clearcoat: Slot<f64>,
    /// roughness of the clearcoat, 0 is a mirror
    pub clearcoat_alpha: Slot<f64>,
    pub spec_trans: Slot<f64>,
    pub flatness: Slot<f64>,
    /// Thin surface diffuse transmission. Accepted for scene compatibility, it has no effect.
    pub diff_trans: Slot<f64>,
}

impl Default for DisneyMaterial {
    fn default() -> Self {
        Self {
            color: Slot::Constant(RgbD::ONE),
            metallic: Slot::Constant(0.0),
            ior: Slot::Constant(1.5),
            roughness: Slot::Constant(0.5),
            spec_tint: Slot::Constant(0.0),
            anisotropic: Slot::Constant(0.0),
            sheen: Slot::Constant(0.0),
            sheen_tint: Slot::Constant(0.0),
            clearcoat: Slot::Constant(0.3),
            clearcoat_alpha: Slot::Constant(0.2),
            spec_trans: Slot::Constant(0.0),
            flatness: Slot::Constant(0.0),
            diff_trans: Slot::Constant(0.0),
        }
    }
}

impl DisneyMaterial {
    #[must_use]
    pub fn create_lobe_set(
        &self,
        source: &dyn AttributeSource,
        swl: &SampledWavelengths,
    ) -> PrincipledBxDFSet {
        let dimension = swl.dimension();
        let one = SampledSpectrum::one(dimension);
        let albedo = self.color.albedo(source, swl);
        let (color, color_lum) = (albedo.sample, albedo.luminance);

        let metallic = unit(self.metallic, source);
        let spec_trans = unit(self.spec_trans, source);
        let diffuse_weight = (1.0 - metallic) * (1.0 - spec_trans);
        let flatness = unit(self.flatness, source);
        let roughness = unit(self.roughness, source);

        let tint_weight = if color_lum > 0.0 { 1.0 / color_lum } else { 1.0 };
        let tint = (color * tint_weight).clamp(0.0, 1.0);
        let tint_lum = color_lum * tint_weight;

        let mut set = PrincipledBxDFSet::empty(color);

        let c_diff = color * (diffuse_weight * (1.0 - flatness));
        let mut has_diffuse = false;
        if !self.color.is_zero() {
            set.diffuse = Some(Diffuse { color: c_diff });
            set.retro = Some(Retro {
                color: c_diff,
                roughness,
            });
            has_diffuse = true;
        }
        if !self.flatness.is_zero() {
            set.fake_ss = Some(FakeSS {
                color: color * (diffuse_weight * flatness),
                roughness,
            });
            has_diffuse = true;
        }
        if !self.sheen.is_zero() {
            let sheen = unit(self.sheen, source);
            let sheen_tint = unit(self.sheen_tint, source);
            set.sheen = Some(Sheen {
                color: one.lerp(tint, sheen_tint) * (diffuse_weight * sheen),
            });
            has_diffuse = true;
        }
        if has_diffuse {
            set.push_strategy(
                SamplingStrategy::Diffuse,
                (diffuse_weight * color_lum).clamp(0.0, 1.0),
            );
        }

        let spec_tint = unit(self.spec_tint, source);
        let eta = self.ior.evaluate(source);
        let r0 = schlick_r0_from_eta(eta);
        let c_spec0 = (one.lerp(tint, spec_tint) * r0).lerp(color, metallic);
        set.fresnel = Fresnel::Disney {
            r0: c_spec0,
            metallic,
            eta: SampledSpectrum::splat(dimension, eta),
        };

        let anisotropic = unit(self.anisotropic, source);
        #[allow(clippy::suboptimal_flops)]
        let aspect = (1.0 - anisotropic * 0.9).sqrt();
        let alpha = roughness.sq();
        let microfacet = Microfacet::new(
            (alpha / aspect).max(0.001),
            (alpha * aspect).max(0.001),
            MicrofacetType::Disney,
        );
        set.spec_refl = MicrofacetReflection {
            color: one,
            microfacet,
        };
        let c_spec0_lum = (1.0_f64.lerp(tint_lum, spec_tint) * r0).lerp(color_lum, metallic);
        set.push_strategy(
            SamplingStrategy::SpecularReflection,
            c_spec0_lum.clamp(0.0, 1.0),
        );

        if !self.clearcoat.is_zero() {
            let clearcoat = unit(self.clearcoat, source);
            let clearcoat_alpha = 0.001_f64.lerp(1.0, unit(self.clearcoat_alpha, source));
            set.clearcoat = Some(Clearcoat {
                weight: clearcoat,
                alpha: clearcoat_alpha,
                dimension,
            });
            set.push_strategy(
                SamplingStrategy::Clearcoat,
                (clearcoat * Clearcoat::R0).clamp(0.0, 1.0),
            );
        }

        if !self.spec_trans.is_zero() {
            let c_st_weight = (1.0 - metallic) * spec_trans;
            set.spec_trans = Some(MicrofacetTransmission {
                color: color.sqrt() * c_st_weight,
                microfacet,
            });
            set.push_strategy(
                SamplingStrategy::SpecularTransmission,
                (c_st_weight * color_lum.sqrt()).clamp(0.0, 1.0),
            );
        }

        set.normalize_weights();
        set
    }
}

/// Unitless parameters outside of `[0, 1]` are clamped to the nearest valid value
fn unit(slot: Slot<f64>, source: &dyn AttributeSource) -> f64 {
    slot.evaluate(source).clamp(0.0, 1.0)
}

/// Which lobe generates the direction in [`PrincipledBxDFSet::sample_wi`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum SamplingStrategy {
    /// Diffuse, retro-reflection, sheen and fake subsurface, sampled with a cosine hemisphere
    Diffuse,
    SpecularReflection,
    Clearcoat,
    SpecularTransmission,
}

const MAX_STRATEGIES: usize = 4;

/// The lobes of [`DisneyMaterial`] at one shading point.
///
/// Optional lobes are only present if their attribute is not a constant zero. Each present
/// group of lobes has a sampling strategy whose weight is proportional to its expected
/// contribution. The weights sum to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrincipledBxDFSet {
    fresnel: Fresnel,
    albedo: SampledSpectrum,

    diffuse: Option<Diffuse>,
    retro: Option<Retro>,
    sheen: Option<Sheen>,
    fake_ss: Option<FakeSS>,
    spec_refl: MicrofacetReflection,
    clearcoat: Option<Clearcoat>,
    spec_trans: Option<MicrofacetTransmission>,

    strategies: [(SamplingStrategy, f64); MAX_STRATEGIES],
    strategy_count: usize,
}

impl PrincipledBxDFSet {
    fn empty(albedo: SampledSpectrum) -> Self {
        let dimension = albedo.dimension();
        Self {
            fresnel: Fresnel::Dielectric {
                eta: SampledSpectrum::one(dimension),
            },
            albedo,
            diffuse: None,
            retro: None,
            sheen: None,
            fake_ss: None,
            spec_refl: MicrofacetReflection {
                color: SampledSpectrum::one(dimension),
                microfacet: Microfacet::isotropic(1.0, MicrofacetType::Disney),
            },
            clearcoat: None,
            spec_trans: None,
            strategies: [(SamplingStrategy::Diffuse, 0.0); MAX_STRATEGIES],
            strategy_count: 0,
        }
    }

    fn push_strategy(&mut self, strategy: SamplingStrategy, weight: f64) {
        debug_assert!(self.strategy_count < MAX_STRATEGIES);
        self.strategies[self.strategy_count] = (strategy, weight);
        self.strategy_count += 1;
    }

    fn normalize_weights(&mut self) {
        let count = self.strategy_count;
        let sum: f64 = self.strategies[..count].iter().map(|(_, w)| w).sum();
        if sum == 0.0 {
            log::debug!("all sampling weights are zero, the shading point absorbs all light");
        }
        let inv_sum = if sum == 0.0 { 0.0 } else { 1.0 / sum };
        for (_, weight) in &mut self.strategies[..count] {
            *weight *= inv_sum;
        }
    }

    fn active_strategies(&self) -> &[(SamplingStrategy, f64)] {
        &self.strategies[..self.strategy_count]
    }

    fn f_diffuse(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum {
        let mut f = SampledSpectrum::zero(self.albedo.dimension());
        if let Some(lobe) = self.diffuse {
            f += lobe.f(wo, wi, fresnel);
        }
        if let Some(lobe) = self.retro {
            f += lobe.f(wo, wi, fresnel);
        }
        if let Some(lobe) = self.sheen {
            f += lobe.f(wo, wi, fresnel);
        }
        if let Some(lobe) = self.fake_ss {
            f += lobe.f(wo, wi, fresnel);
        }
        f
    }

    fn f_glossy_reflection(&self, wo: Vec3d, wi: Vec3d, fresnel: &Fresnel) -> SampledSpectrum {
        let mut f = self.spec_refl.f(wo, wi, fresnel);
        if let Some(lobe) = self.clearcoat {
            f += lobe.f(wo, wi, fresnel);
        }
        f
    }

    fn strategy_pdf(
        &self,
        strategy: SamplingStrategy,
        wo: Vec3d,
        wi: Vec3d,
        fresnel: &Fresnel,
    ) -> f64 {
        match strategy {
            SamplingStrategy::Diffuse => utils::cosine_hemisphere_pdf(wo, wi),
            SamplingStrategy::SpecularReflection => self.spec_refl.pdf(wo, wi, fresnel),
            SamplingStrategy::Clearcoat => self
                .clearcoat
                .map_or(0.0, |lobe| lobe.pdf(wo, wi, fresnel)),
            SamplingStrategy::SpecularTransmission => self
                .spec_trans
                .map_or(0.0, |lobe| lobe.pdf(wo, wi, fresnel)),
        }
    }

    /// Picks the last strategy whose cumulative weight lies below `uc`. Strategies without
    /// weight are never picked.
    fn select_strategy(&self, uc: f64) -> Option<SamplingStrategy> {
        let mut selected = None;
        let mut sum = 0.0;
        for &(strategy, weight) in self.active_strategies() {
            if weight > 0.0 && (selected.is_none() || uc > sum) {
                selected = Some(strategy);
            }
            sum += weight;
        }
        selected
    }
}

fn sample_lobe<B: BxDF>(
    lobe: Option<&B>,
    strategy: SamplingStrategy,
    wo: Vec3d,
    u: Vec2d,
    fresnel: &Fresnel,
) -> SampledDirection {
    debug_assert!(lobe.is_some(), "no lobe for sampling strategy {strategy:?}");
    lobe.map_or_else(
        || {
            log::error!("no lobe for sampling strategy {strategy:?}");
            SampledDirection::invalid()
        },
        |lobe| lobe.sample_wi(wo, u, fresnel),
    )
}

impl BxDFSet for PrincipledBxDFSet {
    fn albedo(&self) -> SampledSpectrum {
        self.albedo
    }

    fn evaluate_local(&self, wo: Vec3d, wi: Vec3d) -> ScatterEval {
        let fresnel = self.fresnel.corrected(utils::cos_theta(wo));
        let pdf: f64 = self
            .active_strategies()
            .iter()
            .map(|&(strategy, weight)| weight * self.strategy_pdf(strategy, wo, wi, &fresnel))
            .sum();

        if utils::same_hemisphere(wo, wi) {
            let diffuse = self.f_diffuse(wo, wi, &fresnel);
            let glossy = self.f_glossy_reflection(wo, wi, &fresnel);
            let flags = if diffuse.average() > glossy.average() {
                BxDFFlags::DIFFUSE_REFLECTION
            } else {
                BxDFFlags::GLOSSY_REFLECTION
            };
            ScatterEval {
                f: diffuse + glossy,
                pdf,
                flags,
            }
        } else {
            match self.spec_trans {
                Some(lobe) => ScatterEval {
                    f: lobe.f(wo, wi, &fresnel),
                    pdf,
                    flags: BxDFFlags::GLOSSY_TRANSMISSION,
                },
                None => ScatterEval::zero(self.albedo.dimension()),
            }
        }
    }

    fn sample_wi(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> SampledDirection {
        let uc = sampler.next_1d();
        let u = sampler.next_2d();
        let Some(strategy) = self.select_strategy(uc) else {
            return SampledDirection::invalid();
        };
        let fresnel = self.fresnel.corrected(utils::cos_theta(wo));
        match strategy {
            SamplingStrategy::Diffuse => {
                if wo.z == 0.0 {
                    return SampledDirection::invalid();
                }
                let (wi, pdf) = utils::sample_cosine_hemisphere(wo, u);
                SampledDirection {
                    wi,
                    pdf,
                    valid: true,
                    flags: BxDFFlags::DIFFUSE_REFLECTION,
                }
            }
            SamplingStrategy::SpecularReflection => {
                sample_lobe(Some(&self.spec_refl), strategy, wo, u, &fresnel)
            }
            SamplingStrategy::Clearcoat => {
                sample_lobe(self.clearcoat.as_ref(), strategy, wo, u, &fresnel)
            }
            SamplingStrategy::SpecularTransmission => {
                sample_lobe(self.spec_trans.as_ref(), strategy, wo, u, &fresnel)
            }
        }
    }

    fn type_hash(&self) -> u64 {
        let mut order = [None; MAX_STRATEGIES];
        for (slot, &(strategy, _)) in order.iter_mut().zip(self.active_strategies()) {
            *slot = Some(strategy);
        }
        structural_hash((
            "principled",
            self.fresnel.kind(),
            self.spec_refl.microfacet.ty,
            [
                self.diffuse.is_some(),
                self.retro.is_some(),
                self.sheen.is_some(),
                self.fake_ss.is_some(),
                self.clearcoat.is_some(),
                self.spec_trans.is_some(),
            ],
            order,
        ))
    }
}
