//! Materials turn the attributes of a shading point into a [`LobeSet`].
//!
//! Attribute values come from an external shader graph, represented by [`AttributeSource`]. A
//! material only decides which lobes exist and how their parameters are derived. Whether an
//! optional lobe exists is decided from the [`Slot`] alone, so that every shading point of a
//! material runs the same code.

#[cfg(feature = "disney")]
mod disney;
#[cfg(feature = "glass")]
mod glass;
#[cfg(feature = "substrate")]
mod substrate;

#[cfg(feature = "disney")]
pub use disney::{DisneyMaterial, PrincipledBxDFSet};
#[cfg(feature = "glass")]
pub use glass::{DielectricBxDFSet, GlassMaterial, Ior, IorCurve};
#[cfg(feature = "substrate")]
pub use substrate::{SubstrateBxDFSet, SubstrateMaterial};

#[cfg(any(feature = "disney", feature = "glass", feature = "substrate"))]
use std::hash::{BuildHasher, Hash};

use crate::{
    core::{BsdfSample, BxDFSet, SampledDirection, Sampler, ScatterEval},
    spectrum::{Albedo, SampledSpectrum, SampledWavelengths},
    utils::VecExt,
    RgbD, Vec2d, Vec3d,
};

/// Handle of a node in the external shader graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A material attribute: either a constant or the output of a shader node
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slot<T> {
    Constant(T),
    Node(NodeId),
}

impl<T: SlotValue> Slot<T> {
    /// `true` only for a constant zero. Node outputs are unknown until a shading point is
    /// evaluated, so they always count as present.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Constant(value) if *value == T::default())
    }

    #[must_use]
    pub fn evaluate(&self, source: &dyn AttributeSource) -> T {
        match *self {
            Self::Constant(value) => value,
            Self::Node(node) => T::fetch(source, node),
        }
    }
}

impl Slot<RgbD> {
    /// The color of the slot uplifted to the wavelengths of the render
    #[must_use]
    pub fn albedo(&self, source: &dyn AttributeSource, swl: &SampledWavelengths) -> Albedo {
        source.albedo(self.evaluate(source), swl)
    }
}

macro_rules! impl_constant_slot {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Slot<$ty> {
                fn from(value: $ty) -> Self {
                    Self::Constant(value)
                }
            }
        )*
    };
}

impl_constant_slot!(f64, Vec2d, RgbD);

impl<T> From<NodeId> for Slot<T> {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Values a [`Slot`] can hold
pub trait SlotValue: Copy + PartialEq + Default {
    fn fetch(source: &dyn AttributeSource, node: NodeId) -> Self;
}

impl SlotValue for f64 {
    fn fetch(source: &dyn AttributeSource, node: NodeId) -> Self {
        source.scalar(node)
    }
}

impl SlotValue for Vec2d {
    fn fetch(source: &dyn AttributeSource, node: NodeId) -> Self {
        source.vec2(node)
    }
}

impl SlotValue for RgbD {
    fn fetch(source: &dyn AttributeSource, node: NodeId) -> Self {
        source.rgb(node)
    }
}

/// The shader graph, evaluated at one shading point
pub trait AttributeSource {
    fn scalar(&self, node: NodeId) -> f64;

    fn vec2(&self, node: NodeId) -> Vec2d;

    fn rgb(&self, node: NodeId) -> RgbD;

    /// Uplifts a color to the sampled wavelengths. The default is exact for RGB renders and
    /// falls back to a grey spectrum of the same luminance otherwise.
    fn albedo(&self, rgb: RgbD, swl: &SampledWavelengths) -> Albedo {
        let luminance = rgb.luminance();
        let sample = if swl.is_rgb() {
            SampledSpectrum::from_rgb(rgb)
        } else {
            SampledSpectrum::splat(swl.dimension(), luminance)
        };
        Albedo { sample, luminance }
    }
}

/// Attribute source for materials built from constants only
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoNodes;

impl AttributeSource for NoNodes {
    fn scalar(&self, node: NodeId) -> f64 {
        log::error!("material references node {node:?}, but no shader graph is attached");
        0.0
    }

    fn vec2(&self, node: NodeId) -> Vec2d {
        log::error!("material references node {node:?}, but no shader graph is attached");
        Vec2d::ZERO
    }

    fn rgb(&self, node: NodeId) -> RgbD {
        log::error!("material references node {node:?}, but no shader graph is attached");
        RgbD::ZERO
    }
}

/// Hash of the structure of a lobe set. The seeds are fixed, so equal structures hash equal in
/// every run.
#[cfg(any(feature = "disney", feature = "glass", feature = "substrate"))]
pub(crate) fn structural_hash(structure: impl Hash) -> u64 {
    let state = ahash::RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    );
    BuildHasher::hash_one(&state, structure)
}

/// The materials known to the renderer
#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    #[cfg(feature = "disney")]
    Disney(DisneyMaterial),
    #[cfg(feature = "glass")]
    Glass(GlassMaterial),
    #[cfg(feature = "substrate")]
    Substrate(SubstrateMaterial),
}

impl Material {
    /// Builds the lobes for one shading point
    #[must_use]
    #[allow(unused_variables)]
    pub fn create_lobe_set(
        &self,
        source: &dyn AttributeSource,
        swl: &SampledWavelengths,
    ) -> LobeSet {
        match *self {
            #[cfg(feature = "disney")]
            Self::Disney(ref material) => {
                LobeSet::Principled(material.create_lobe_set(source, swl))
            }
            #[cfg(feature = "glass")]
            Self::Glass(ref material) => LobeSet::Dielectric(material.create_lobe_set(source, swl)),
            #[cfg(feature = "substrate")]
            Self::Substrate(ref material) => {
                LobeSet::Substrate(material.create_lobe_set(source, swl))
            }
        }
    }
}

#[cfg(feature = "disney")]
impl From<DisneyMaterial> for Material {
    fn from(material: DisneyMaterial) -> Self {
        Self::Disney(material)
    }
}

#[cfg(feature = "glass")]
impl From<GlassMaterial> for Material {
    fn from(material: GlassMaterial) -> Self {
        Self::Glass(material)
    }
}

#[cfg(feature = "substrate")]
impl From<SubstrateMaterial> for Material {
    fn from(material: SubstrateMaterial) -> Self {
        Self::Substrate(material)
    }
}

/// The lobes of one shading point, for any material
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LobeSet {
    #[cfg(feature = "disney")]
    Principled(PrincipledBxDFSet),
    #[cfg(feature = "glass")]
    Dielectric(DielectricBxDFSet),
    #[cfg(feature = "substrate")]
    Substrate(SubstrateBxDFSet),
}

macro_rules! delegate {
    ($self:ident, $set:ident => $body:expr) => {
        match *$self {
            #[cfg(feature = "disney")]
            Self::Principled(ref $set) => $body,
            #[cfg(feature = "glass")]
            Self::Dielectric(ref $set) => $body,
            #[cfg(feature = "substrate")]
            Self::Substrate(ref $set) => $body,
        }
    };
}

// without any material feature the enum is empty and the arguments go unused
#[allow(unused_variables)]
impl BxDFSet for LobeSet {
    fn albedo(&self) -> SampledSpectrum {
        delegate!(self, set => set.albedo())
    }

    fn evaluate_local(&self, wo: Vec3d, wi: Vec3d) -> ScatterEval {
        delegate!(self, set => set.evaluate_local(wo, wi))
    }

    fn sample_wi(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> SampledDirection {
        delegate!(self, set => set.sample_wi(wo, sampler))
    }

    fn sample_local(&self, wo: Vec3d, sampler: &mut dyn Sampler) -> BsdfSample {
        delegate!(self, set => set.sample_local(wo, sampler))
    }

    fn pdf_local(&self, wo: Vec3d, wi: Vec3d) -> f64 {
        delegate!(self, set => set.pdf_local(wo, wi))
    }

    fn type_hash(&self) -> u64 {
        delegate!(self, set => set.type_hash())
    }

    fn is_dispersive(&self) -> bool {
        delegate!(self, set => set.is_dispersive())
    }
}
