//! Spectral values sampled at the wavelengths of the current render.
//!
//! Lobes never look inside a [`SampledSpectrum`]; they only combine spectra element-wise. How
//! the wavelengths are chosen and how colors are uplifted to spectra is up to the renderer.

use std::ops::{Add, AddAssign, Div, Index, Mul, MulAssign, Sub};

use glam::f64::DVec4;

use crate::{Error, RgbD};

/// Maximum number of wavelength samples carried by a [`SampledSpectrum`]
pub const MAX_DIMENSION: usize = 4;

/// Peak wavelengths (nm) of the red, green and blue primaries. Used when a spectral quantity,
/// such as a dispersion curve, has to be collapsed to an RGB render.
pub const RGB_PEAK_WAVELENGTHS: RgbD = RgbD::new(602.785, 539.285, 445.772);

const LANE_MASKS: [DVec4; MAX_DIMENSION + 1] = [
    DVec4::ZERO,
    DVec4::new(1.0, 0.0, 0.0, 0.0),
    DVec4::new(1.0, 1.0, 0.0, 0.0),
    DVec4::new(1.0, 1.0, 1.0, 0.0),
    DVec4::ONE,
];

/// Reflectance or radiance at a fixed number of sampled wavelengths.
///
/// The dimension is fixed per render and threaded through every lobe. Lanes beyond the
/// dimension are kept at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledSpectrum {
    values: DVec4,
    dimension: usize,
}

impl SampledSpectrum {
    fn masked(values: DVec4, dimension: usize) -> Self {
        Self {
            values: values * LANE_MASKS[dimension],
            dimension,
        }
    }

    /// All lanes set to `value`
    ///
    /// # Panics
    /// If `dimension` is zero or larger than [`MAX_DIMENSION`]
    #[must_use]
    pub fn splat(dimension: usize, value: f64) -> Self {
        assert!(
            (1..=MAX_DIMENSION).contains(&dimension),
            "spectrum dimension {dimension} out of range"
        );
        Self::masked(DVec4::splat(value), dimension)
    }

    #[must_use]
    pub fn zero(dimension: usize) -> Self {
        Self::splat(dimension, 0.0)
    }

    #[must_use]
    pub fn one(dimension: usize) -> Self {
        Self::splat(dimension, 1.0)
    }

    /// Builds a spectrum from one value per wavelength
    ///
    /// # Errors
    /// [`Error::SpectrumDimension`] if the slice is empty or longer than [`MAX_DIMENSION`]
    pub fn from_slice(values: &[f64]) -> crate::Result<Self> {
        if values.is_empty() || values.len() > MAX_DIMENSION {
            return Err(Error::SpectrumDimension(values.len()));
        }
        let mut lanes = [0.0; MAX_DIMENSION];
        lanes[..values.len()].copy_from_slice(values);
        Ok(Self {
            values: DVec4::from_array(lanes),
            dimension: values.len(),
        })
    }

    /// A three lane spectrum holding an RGB triple. Only meaningful for RGB renders.
    #[must_use]
    pub fn from_rgb(rgb: RgbD) -> Self {
        Self::masked(rgb.extend(0.0), 3)
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// The sample of the hero wavelength. Direction sampling that depends on eta uses this lane.
    #[must_use]
    pub fn first(&self) -> f64 {
        self.values.x
    }

    #[must_use]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        let mut lanes = self.values.to_array();
        for lane in lanes.iter_mut().take(self.dimension) {
            *lane = f(*lane);
        }
        Self::masked(DVec4::from_array(lanes), self.dimension)
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        debug_assert_eq!(self.dimension, other.dimension);
        Self::masked(self.values.lerp(other.values, t), self.dimension)
    }

    #[must_use]
    pub fn clamp(self, min: f64, max: f64) -> Self {
        self.map(|v| v.clamp(min, max))
    }

    #[must_use]
    pub fn sqrt(self) -> Self {
        self.map(f64::sqrt)
    }

    #[must_use]
    pub fn recip(self) -> Self {
        self.map(f64::recip)
    }

    #[must_use]
    pub fn average(&self) -> f64 {
        self.values.dot(DVec4::ONE) / self.dimension as f64
    }

    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values
            .to_array()
            .into_iter()
            .take(self.dimension)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.values == DVec4::ZERO
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.is_finite()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.as_ref().iter().copied().take(self.dimension)
    }
}

impl Index<usize> for SampledSpectrum {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        assert!(
            index < self.dimension,
            "lane {index} out of range for dimension {}",
            self.dimension
        );
        &self.values[index]
    }
}

macro_rules! impl_spectrum_op {
    ($trait:ident, $fn:ident, $op:tt) => {
        impl $trait for SampledSpectrum {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self {
                debug_assert_eq!(self.dimension, rhs.dimension);
                Self::masked(self.values $op rhs.values, self.dimension)
            }
        }

        impl $trait<f64> for SampledSpectrum {
            type Output = Self;

            fn $fn(self, rhs: f64) -> Self {
                Self::masked(self.values $op DVec4::splat(rhs), self.dimension)
            }
        }
    };
}

impl_spectrum_op!(Add, add, +);
impl_spectrum_op!(Sub, sub, -);
impl_spectrum_op!(Mul, mul, *);

impl Div for SampledSpectrum {
    type Output = Self;

    /// lanes with a zero denominator become zero
    fn div(self, rhs: Self) -> Self {
        debug_assert_eq!(self.dimension, rhs.dimension);
        let mut lanes = self.values.to_array();
        for (lane, d) in lanes.iter_mut().zip(rhs.iter()) {
            *lane = if d == 0.0 { 0.0 } else { *lane / d };
        }
        Self::masked(DVec4::from_array(lanes), self.dimension)
    }
}

impl Div<f64> for SampledSpectrum {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::masked(self.values / rhs, self.dimension)
    }
}

impl Mul<SampledSpectrum> for f64 {
    type Output = SampledSpectrum;

    fn mul(self, rhs: SampledSpectrum) -> SampledSpectrum {
        rhs * self
    }
}

impl AddAssign for SampledSpectrum {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl MulAssign<f64> for SampledSpectrum {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

/// The wavelengths (in nm) sampled for the current path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampledWavelengths {
    lambdas: SampledSpectrum,
    rgb: bool,
}

impl SampledWavelengths {
    /// # Errors
    /// [`Error::SpectrumDimension`] if no or too many wavelengths are given
    pub fn new(lambdas: &[f64]) -> crate::Result<Self> {
        Ok(Self {
            lambdas: SampledSpectrum::from_slice(lambdas)?,
            rgb: false,
        })
    }

    /// The three lanes of an RGB render
    #[must_use]
    pub fn rgb() -> Self {
        Self {
            lambdas: SampledSpectrum::from_rgb(RGB_PEAK_WAVELENGTHS),
            rgb: true,
        }
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.lambdas.dimension()
    }

    #[must_use]
    pub fn lambda(&self, index: usize) -> f64 {
        self.lambdas[index]
    }

    #[must_use]
    pub const fn is_rgb(&self) -> bool {
        self.rgb
    }

    /// Evaluates `f` at every sampled wavelength
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> SampledSpectrum {
        self.lambdas.map(f)
    }
}

/// A color resolved at a shading point: its spectral samples and its luminance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Albedo {
    pub sample: SampledSpectrum,
    pub luminance: f64,
}
