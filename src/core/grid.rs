//! Linear sampling grids and half-open intervals
//!
//! A [`LinearSpace`] maps a physical coordinate (azimuth time, slant range,
//! longitude, ...) to a fractional pixel index; an [`Interval`] tests whether
//! such an index lies inside a raster's extent.

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Uniformly spaced axis: `value = start + index * spacing`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSpace<T> {
    start: T,
    spacing: T,
}

impl<T: Float> LinearSpace<T> {
    pub fn new(start: T, spacing: T) -> Self {
        Self { start, spacing }
    }

    /// Axis starting at zero
    pub fn from_spacing(spacing: T) -> Self {
        Self::new(T::zero(), spacing)
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn spacing(&self) -> T {
        self.spacing
    }

    /// Coordinate value at a (possibly fractional) index
    pub fn value_at(&self, index: T) -> T {
        self.start + index * self.spacing
    }

    /// Fractional index of a coordinate value
    pub fn index_of(&self, value: T) -> T {
        (value - self.start) / self.spacing
    }
}

/// Numeric bound `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn half_open_contains(&self, value: T) -> bool {
        value >= self.min && value < self.max
    }
}

impl Interval<f64> {
    /// Valid index range of a raster axis with `len` samples
    pub fn extent(len: usize) -> Self {
        Self::new(0.0, len as f64)
    }
}
