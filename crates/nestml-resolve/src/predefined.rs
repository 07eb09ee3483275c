//! Predefined symbols.
//!
//! Primitive types, the named units of the unit table (plus the prefixed
//! units models use most), the built-in functions and the predefined
//! variables `t`, `e` and `inf`.
//!
//! # Thread Safety
//!
//! The set is built once, on first access, through a `OnceLock` and is
//! immutable afterwards. Analyses running on different threads share it.

use crate::symbols::{ParamSpec, ReturnSpec, SymbolType};
use crate::types::ExprType;
use nestml_ast::PrimitiveType;
use nestml_units::{lookup, SiDimension, Unit, UNIT_TABLE};
use std::sync::OnceLock;

/// Prefixed units seeded into the global scope next to the table entries.
///
/// Any other prefixed name still resolves through the unit table.
const COMMON_UNITS: &[&str] = &[
    "kg", "ms", "us", "mV", "uV", "nA", "pA", "uA", "mA", "nS", "uS", "mS", "pF", "nF", "uF",
    "MOhm", "GOhm", "kHz", "mmol", "um", "mm", "cm",
];

#[derive(Debug, Clone)]
pub struct PredefinedType {
    pub name: String,
    pub ty: ExprType,
    pub is_unit: bool,
}

#[derive(Debug, Clone)]
pub struct PredefinedFunction {
    pub name: &'static str,
    pub params: Vec<ParamSpec>,
    pub returns: ReturnSpec,
}

#[derive(Debug, Clone)]
pub struct PredefinedVariable {
    pub name: &'static str,
    pub ty: ExprType,
}

/// The process-wide predefined symbol set.
#[derive(Debug)]
pub struct Predefined {
    pub types: Vec<PredefinedType>,
    pub functions: Vec<PredefinedFunction>,
    pub variables: Vec<PredefinedVariable>,
}

static PREDEFINED: OnceLock<Predefined> = OnceLock::new();

impl Predefined {
    /// Get or initialize the global predefined set.
    pub fn global() -> &'static Predefined {
        PREDEFINED.get_or_init(Self::initialize)
    }

    fn initialize() -> Self {
        let mut types: Vec<PredefinedType> = PrimitiveType::ALL
            .iter()
            .map(|p| PredefinedType {
                name: p.keyword().to_string(),
                ty: ExprType::primitive(*p),
                is_unit: false,
            })
            .collect();

        let unit_names = UNIT_TABLE
            .iter()
            .map(|def| def.symbol)
            .chain(COMMON_UNITS.iter().copied());
        for name in unit_names {
            if let Some(unit) = lookup(name) {
                types.push(PredefinedType {
                    name: name.to_string(),
                    ty: ExprType::quantity(unit),
                    is_unit: true,
                });
            }
        }

        Self {
            types,
            functions: functions(),
            variables: variables(),
        }
    }
}

pub(crate) fn millis() -> Unit {
    Unit::coherent(SiDimension::TIME).with_prefix(1e-3)
}

fn typed(t: ExprType) -> ParamSpec {
    ParamSpec::Typed(SymbolType::Known(t))
}

fn returns(t: ExprType) -> ReturnSpec {
    ReturnSpec::Typed(SymbolType::Known(t))
}

fn function(name: &'static str, params: Vec<ParamSpec>, returns: ReturnSpec) -> PredefinedFunction {
    PredefinedFunction {
        name,
        params,
        returns,
    }
}

fn functions() -> Vec<PredefinedFunction> {
    let real = ExprType::real;
    let ms = ExprType::quantity(millis());
    let mut out = Vec::new();

    for name in ["exp", "log", "ln", "log10", "expm1"] {
        out.push(function(name, vec![typed(real())], returns(real())));
    }
    out.push(function("sqrt", vec![ParamSpec::Generic], ReturnSpec::Sqrt));
    out.push(function(
        "pow",
        vec![typed(real()), typed(real())],
        returns(real()),
    ));
    for name in ["min", "max", "bounded_min", "bounded_max"] {
        out.push(function(
            name,
            vec![ParamSpec::Generic, ParamSpec::Generic],
            ReturnSpec::Generic,
        ));
    }
    out.push(function("abs", vec![ParamSpec::Generic], ReturnSpec::Generic));
    out.push(function("random", vec![], returns(real())));
    out.push(function(
        "random_int",
        vec![typed(ExprType::integer()), typed(ExprType::integer())],
        returns(ExprType::integer()),
    ));
    out.push(function("emit_spike", vec![], returns(ExprType::void())));
    out.push(function("integrate_odes", vec![], returns(ExprType::void())));
    out.push(function("steps", vec![typed(ms)], returns(ExprType::integer())));
    out.push(function("resolution", vec![], returns(ms)));
    for name in ["print", "println"] {
        out.push(function(name, vec![ParamSpec::Any], returns(ExprType::void())));
    }
    out.push(function("println", vec![], returns(ExprType::void())));
    for name in ["info", "warning"] {
        out.push(function(
            name,
            vec![typed(ExprType::string())],
            returns(ExprType::void()),
        ));
    }
    for name in ["curr_sum", "cond_sum"] {
        out.push(function(
            name,
            vec![ParamSpec::Generic, ParamSpec::Any],
            ReturnSpec::Generic,
        ));
    }
    out.push(function(
        "delta",
        vec![ParamSpec::Generic, ParamSpec::Generic],
        returns(real()),
    ));
    out
}

fn variables() -> Vec<PredefinedVariable> {
    vec![
        PredefinedVariable {
            name: "e",
            ty: ExprType::real(),
        },
        PredefinedVariable {
            name: "t",
            ty: ExprType::quantity(millis()),
        },
        PredefinedVariable {
            name: "inf",
            ty: ExprType::real(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_shared() {
        let a = Predefined::global() as *const Predefined;
        let b = Predefined::global() as *const Predefined;
        assert_eq!(a, b);
    }

    #[test]
    fn test_contents() {
        let p = Predefined::global();
        assert!(p.types.iter().any(|t| t.name == "mV" && t.is_unit));
        assert!(p.types.iter().any(|t| t.name == "boolean" && !t.is_unit));
        assert!(p.types.iter().any(|t| t.name == "°C"));
        let overloads = |name: &str| p.functions.iter().filter(|f| f.name == name).count();
        assert_eq!(overloads("println"), 2);
        assert_eq!(overloads("exp"), 1);
        assert!(p.variables.iter().any(|v| v.name == "t"));
    }
}
