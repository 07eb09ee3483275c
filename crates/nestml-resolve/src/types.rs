//! Expression type records.
//!
//! Every expression node is annotated with a [`TypeRecord`]: either a valid
//! [`ExprType`] (base kind, unit, constness, optional value) or the error
//! marker that stops cascading diagnostics.

use nestml_ast::PrimitiveType;
use nestml_units::{display_name, Conversion, SiDimension, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Integer,
    Real,
    Boolean,
    String,
    Void,
}

impl BaseType {
    pub fn is_numeric(self) -> bool {
        matches!(self, BaseType::Integer | BaseType::Real)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BaseType::Integer => "integer",
            BaseType::Real => "real",
            BaseType::Boolean => "boolean",
            BaseType::String => "string",
            BaseType::Void => "void",
        }
    }
}

impl From<PrimitiveType> for BaseType {
    fn from(p: PrimitiveType) -> Self {
        match p {
            PrimitiveType::Real => BaseType::Real,
            PrimitiveType::Integer => BaseType::Integer,
            PrimitiveType::Boolean => BaseType::Boolean,
            PrimitiveType::String => BaseType::String,
            PrimitiveType::Void => BaseType::Void,
        }
    }
}

/// Inferred type of an expression or declared type of a symbol.
///
/// Non-numeric types always carry the dimensionless unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExprType {
    pub base: BaseType,
    pub unit: Unit,
    /// Compile-time constant (literal or arithmetic over literals).
    pub constant: bool,
    /// Numeric value, when constant and known.
    pub value: Option<f64>,
}

impl ExprType {
    const fn of(base: BaseType) -> Self {
        Self {
            base,
            unit: Unit::DIMENSIONLESS,
            constant: false,
            value: None,
        }
    }

    pub const fn integer() -> Self {
        Self::of(BaseType::Integer)
    }

    pub const fn real() -> Self {
        Self::of(BaseType::Real)
    }

    pub const fn boolean() -> Self {
        Self::of(BaseType::Boolean)
    }

    pub const fn string() -> Self {
        Self::of(BaseType::String)
    }

    pub const fn void() -> Self {
        Self::of(BaseType::Void)
    }

    /// Real value in `unit`.
    pub const fn quantity(unit: Unit) -> Self {
        Self {
            base: BaseType::Real,
            unit,
            constant: false,
            value: None,
        }
    }

    pub fn primitive(p: PrimitiveType) -> Self {
        Self::of(p.into())
    }

    /// Mark as a compile-time constant with a known value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.constant = true;
        self.value = Some(value);
        self
    }

    /// Drop constness (results of calls, variables).
    pub fn non_constant(mut self) -> Self {
        self.constant = false;
        self.value = None;
        self
    }

    pub fn is_numeric(&self) -> bool {
        self.base.is_numeric()
    }

    pub fn is_boolean(&self) -> bool {
        self.base == BaseType::Boolean
    }

    pub fn dims(&self) -> &SiDimension {
        self.unit.dims()
    }

    /// Numeric with no dimension (scale may differ from 1).
    pub fn is_dimensionless(&self) -> bool {
        self.is_numeric() && self.unit.is_dimensionless()
    }

    /// Constant whose value is an integer.
    pub fn integer_value(&self) -> Option<i64> {
        let value = self.value.filter(|_| self.constant)?;
        if value.fract() == 0.0 && value.abs() < i32::MAX as f64 {
            Some(value as i64)
        } else {
            None
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_numeric() {
            return f.write_str(self.base.keyword());
        }
        let plain = Unit::DIMENSIONLESS;
        if self.unit.conversion_to(&plain) == Conversion::Identical {
            return f.write_str(self.base.keyword());
        }
        f.write_str(&display_name(&self.unit))
    }
}

/// Annotation attached to every expression node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TypeRecord {
    Valid(ExprType),
    /// The node (or an operand) failed to type; no further findings are
    /// synthesized for its ancestors.
    Error,
}

impl TypeRecord {
    pub fn valid(&self) -> Option<&ExprType> {
        match self {
            TypeRecord::Valid(t) => Some(t),
            TypeRecord::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TypeRecord::Error)
    }
}

// =============================================================================
// Assignability
// =============================================================================

/// How a value relates to a declared target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignability {
    /// Exact match, or silent `integer -> real` widening.
    Compatible,
    /// Same dimension, different scale or offset.
    Rescale,
    /// `real` into `integer`.
    Narrowing,
    /// Different SI dimensions.
    IncompatibleDimensions,
    /// Boolean/string/void against anything else.
    BaseMismatch,
}

/// Classify storing a value of type `value` into a slot of type `target`.
///
/// # Parameters
/// - `target`: Declared type of the variable, parameter or return slot
/// - `value`: Inferred type of the value
///
/// # Returns
/// The [`Assignability`] class; callers map it to a finding.
pub fn assignability(target: &ExprType, value: &ExprType) -> Assignability {
    if !target.is_numeric() || !value.is_numeric() {
        return if target.base == value.base {
            Assignability::Compatible
        } else {
            Assignability::BaseMismatch
        };
    }
    if !value.unit.same_dimension(&target.unit) {
        return Assignability::IncompatibleDimensions;
    }
    if target.base == BaseType::Integer && value.base == BaseType::Real {
        return Assignability::Narrowing;
    }
    match value.unit.conversion_to(&target.unit) {
        Conversion::Identical => Assignability::Compatible,
        Conversion::Rescale => Assignability::Rescale,
        Conversion::Incompatible => Assignability::IncompatibleDimensions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestml_units::lookup;

    fn q(name: &str) -> ExprType {
        ExprType::quantity(lookup(name).unwrap())
    }

    #[test]
    fn test_display() {
        assert_eq!(ExprType::real().to_string(), "real");
        assert_eq!(ExprType::integer().to_string(), "integer");
        assert_eq!(ExprType::boolean().to_string(), "boolean");
        assert_eq!(q("mV").to_string(), "mV");
    }

    #[test]
    fn test_assignability() {
        assert_eq!(assignability(&q("mV"), &q("mV")), Assignability::Compatible);
        assert_eq!(assignability(&q("mV"), &q("V")), Assignability::Rescale);
        assert_eq!(
            assignability(&q("mV"), &q("ms")),
            Assignability::IncompatibleDimensions
        );
        assert_eq!(
            assignability(&ExprType::real(), &ExprType::integer()),
            Assignability::Compatible
        );
        assert_eq!(
            assignability(&ExprType::integer(), &ExprType::real()),
            Assignability::Narrowing
        );
        assert_eq!(
            assignability(&ExprType::boolean(), &ExprType::real()),
            Assignability::BaseMismatch
        );
        assert_eq!(
            assignability(&q("K"), &q("°C")),
            Assignability::Rescale
        );
    }

    #[test]
    fn test_integer_value() {
        assert_eq!(ExprType::integer().with_value(3.0).integer_value(), Some(3));
        assert_eq!(ExprType::real().with_value(0.5).integer_value(), None);
        assert_eq!(ExprType::integer().integer_value(), None);
    }
}
