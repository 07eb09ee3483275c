//! Physical units: a dimension vector plus scale and optional affine offset.
//!
//! Units come in two kinds:
//!
//! - **Multiplicative**: ordinary SI units and their prefixed forms
//!   (`mV` is volt with scale `1e-3`).
//! - **Affine**: temperature scales with an offset from the coherent unit
//!   (`°C` is kelvin with offset `273.15`).
//!
//! # Unit Algebra by Kind
//!
//! | Operation | Multiplicative | Affine |
//! |-----------|---------------|--------|
//! | `a * b`, `a / b`, `a ** n` | ✓ | ✗ (use [`Unit::delta`] first) |
//! | `a - b` | ✓ same dims | ✓ → Multiplicative (delta) |
//! | compare | ✓ same dims | ✓ same dims |
//!
//! Two units of equal dimension that differ only in scale or offset are
//! convertible; [`Unit::conversion_to`] reports which case applies.

use crate::dimension::SiDimension;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative tolerance used when comparing scales and offsets.
const SCALE_EPSILON: f64 = 1e-9;

/// A physical unit with dimensional exponents, scale and kind.
///
/// The scale is the factor relative to the SI coherent unit of the same
/// dimension (`ms` has scale `1e-3`, `kg` has scale `1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    kind: UnitKind,
    dims: SiDimension,
    scale: f64,
}

/// Unit kind, which determines the algebra allowed on values of the unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnitKind {
    Multiplicative,
    /// Value `v` in this unit equals `v * scale + offset` in the coherent unit.
    Affine { offset: f64 },
}

/// How a value in one unit relates to another unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Same dimension, scale and offset.
    Identical,
    /// Same dimension; scale or offset differ, so an implicit rescale applies.
    Rescale,
    /// Different dimensions.
    Incompatible,
}

impl Unit {
    pub const DIMENSIONLESS: Unit = Unit {
        kind: UnitKind::Multiplicative,
        dims: SiDimension::DIMENSIONLESS,
        scale: 1.0,
    };

    pub const fn new(kind: UnitKind, dims: SiDimension, scale: f64) -> Self {
        Self { kind, dims, scale }
    }

    /// Multiplicative unit with the given dimension and scale.
    pub const fn scaled(dims: SiDimension, scale: f64) -> Self {
        Self::new(UnitKind::Multiplicative, dims, scale)
    }

    /// Coherent SI unit (scale 1) of the given dimension.
    pub const fn coherent(dims: SiDimension) -> Self {
        Self::scaled(dims, 1.0)
    }

    pub const fn kind(&self) -> &UnitKind {
        &self.kind
    }

    pub const fn dims(&self) -> &SiDimension {
        &self.dims
    }

    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Affine offset, `0.0` for multiplicative units.
    pub fn offset(&self) -> f64 {
        match self.kind {
            UnitKind::Multiplicative => 0.0,
            UnitKind::Affine { offset } => offset,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_dimensionless()
    }

    pub fn is_multiplicative(&self) -> bool {
        matches!(self.kind, UnitKind::Multiplicative)
    }

    pub fn is_affine(&self) -> bool {
        matches!(self.kind, UnitKind::Affine { .. })
    }

    /// The same unit with any affine offset dropped.
    ///
    /// Differences of affine quantities (`20 °C - 10 °C`) are measured in
    /// the delta unit.
    pub fn delta(&self) -> Unit {
        Unit::scaled(self.dims, self.scale)
    }

    /// Same unit with the scale multiplied by `factor` (an SI prefix).
    pub fn with_prefix(&self, factor: f64) -> Unit {
        Unit::new(self.kind, self.dims, self.scale * factor)
    }

    // ============================================================================
    // Unit algebra (Multiplicative only)
    // ============================================================================

    /// Multiply two units (dimensions add, scales multiply).
    ///
    /// `None` if either operand is affine or an exponent overflows.
    pub fn multiply(&self, other: &Unit) -> Option<Unit> {
        if !self.is_multiplicative() || !other.is_multiplicative() {
            return None;
        }
        Some(Unit::scaled(
            self.dims.multiply(&other.dims)?,
            self.scale * other.scale,
        ))
    }

    /// Divide two units (dimensions subtract, scales divide).
    ///
    /// `None` if either operand is affine or an exponent overflows.
    pub fn divide(&self, other: &Unit) -> Option<Unit> {
        if !self.is_multiplicative() || !other.is_multiplicative() {
            return None;
        }
        Some(Unit::scaled(
            self.dims.divide(&other.dims)?,
            self.scale / other.scale,
        ))
    }

    /// Raise to an integer power.
    ///
    /// `None` if the unit is affine or an exponent overflows.
    pub fn pow(&self, exponent: i32) -> Option<Unit> {
        if !self.is_multiplicative() {
            return None;
        }
        Some(Unit::scaled(
            self.dims.pow(exponent)?,
            self.scale.powi(exponent),
        ))
    }

    /// Square root. `None` for affine units or odd exponents.
    pub fn sqrt(&self) -> Option<Unit> {
        if !self.is_multiplicative() {
            return None;
        }
        Some(Unit::scaled(self.dims.sqrt()?, self.scale.sqrt()))
    }

    pub fn inverse(&self) -> Option<Unit> {
        self.pow(-1)
    }

    // ============================================================================
    // Compatibility
    // ============================================================================

    pub fn same_dimension(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Relation of `self` to `target`, taking scale and offset into account.
    pub fn conversion_to(&self, target: &Unit) -> Conversion {
        if !self.same_dimension(target) {
            return Conversion::Incompatible;
        }
        if approx_eq(self.scale, target.scale) && approx_eq(self.offset(), target.offset()) {
            Conversion::Identical
        } else {
            Conversion::Rescale
        }
    }

    /// Relation of `self` to `target` by scale only; offsets are ignored.
    pub fn magnitude_conversion_to(&self, target: &Unit) -> Conversion {
        self.delta().conversion_to(&target.delta())
    }
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= SCALE_EPSILON * a.abs().max(b.abs())
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !approx_eq(self.scale, 1.0) {
            write!(f, "{:e} ", self.scale)?;
        }
        write!(f, "{}", self.dims)?;
        if let UnitKind::Affine { offset } = self.kind {
            write!(f, "+{}", offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millivolt() -> Unit {
        Unit::scaled(SiDimension::from_exponents([2, 1, -3, -1, 0, 0, 0]), 1e-3)
    }

    fn celsius() -> Unit {
        Unit::new(
            UnitKind::Affine { offset: 273.15 },
            SiDimension::TEMPERATURE,
            1.0,
        )
    }

    #[test]
    fn test_dimensionless() {
        assert!(Unit::DIMENSIONLESS.is_dimensionless());
        assert!(Unit::DIMENSIONLESS.is_multiplicative());
        assert_eq!(Unit::DIMENSIONLESS.offset(), 0.0);
    }

    #[test]
    fn test_divide_scales() {
        let ms = Unit::scaled(SiDimension::TIME, 1e-3);
        let mv_per_ms = millivolt().divide(&ms).unwrap();
        assert_eq!(mv_per_ms.dims().time, -4);
        assert!(approx_eq(mv_per_ms.scale(), 1.0));
    }

    #[test]
    fn test_affine_algebra_forbidden() {
        let c = celsius();
        assert!(c.multiply(&Unit::DIMENSIONLESS).is_none());
        assert!(c.divide(&Unit::DIMENSIONLESS).is_none());
        assert!(c.pow(2).is_none());
        assert!(c.delta().multiply(&Unit::DIMENSIONLESS).is_some());
    }

    #[test]
    fn test_conversion_classification() {
        let volt = Unit::coherent(*millivolt().dims());
        assert_eq!(millivolt().conversion_to(&millivolt()), Conversion::Identical);
        assert_eq!(millivolt().conversion_to(&volt), Conversion::Rescale);
        assert_eq!(
            millivolt().conversion_to(&Unit::DIMENSIONLESS),
            Conversion::Incompatible
        );
    }

    #[test]
    fn test_offset_only_difference() {
        let kelvin = Unit::coherent(SiDimension::TEMPERATURE);
        assert_eq!(celsius().conversion_to(&kelvin), Conversion::Rescale);
        assert_eq!(
            celsius().magnitude_conversion_to(&kelvin),
            Conversion::Identical
        );
    }

    #[test]
    fn test_sqrt() {
        let area = Unit::scaled(SiDimension::LENGTH.pow(2).unwrap(), 1e-6);
        let side = area.sqrt().unwrap();
        assert_eq!(*side.dims(), SiDimension::LENGTH);
        assert!(approx_eq(side.scale(), 1e-3));
        assert!(millivolt().sqrt().is_none());
    }
}
