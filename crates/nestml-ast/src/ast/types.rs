//! Type expressions: primitive type names and unit types.

use super::expr::Ident;
use crate::foundation::{NodeId, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExprKind {
    Primitive(PrimitiveType),
    Unit(UnitExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Real,
    Integer,
    Boolean,
    String,
    Void,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::Real => "real",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
            PrimitiveType::Void => "void",
        }
    }

    pub const ALL: [PrimitiveType; 5] = [
        PrimitiveType::Real,
        PrimitiveType::Integer,
        PrimitiveType::Boolean,
        PrimitiveType::String,
        PrimitiveType::Void,
    ];
}

/// Unit type syntax such as `mV`, `nS/ms`, `1/s` or `m**2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitExpr {
    Name(Ident),
    /// The literal `1` in `1/s`.
    One,
    Mul(Box<UnitExpr>, Box<UnitExpr>),
    Div(Box<UnitExpr>, Box<UnitExpr>),
    Pow(Box<UnitExpr>, i32),
}

impl UnitExpr {
    /// All unit names mentioned, left to right.
    pub fn names(&self) -> Vec<&Ident> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            UnitExpr::Name(ident) => out.push(ident),
            UnitExpr::One => {}
            UnitExpr::Mul(a, b) | UnitExpr::Div(a, b) => {
                a.collect_names(out);
                b.collect_names(out);
            }
            UnitExpr::Pow(base, _) => base.collect_names(out),
        }
    }
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitExpr::Name(ident) => write!(f, "{}", ident.name),
            UnitExpr::One => write!(f, "1"),
            UnitExpr::Mul(a, b) => write!(f, "{}*{}", a, b),
            UnitExpr::Div(a, b) => match **b {
                UnitExpr::Mul(..) | UnitExpr::Div(..) => write!(f, "{}/({})", a, b),
                _ => write!(f, "{}/{}", a, b),
            },
            UnitExpr::Pow(base, exp) => match **base {
                UnitExpr::Name(_) | UnitExpr::One => write!(f, "{}**{}", base, exp),
                _ => write!(f, "({})**{}", base, exp),
            },
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Primitive(p) => f.write_str(p.keyword()),
            TypeExprKind::Unit(u) => write!(f, "{}", u),
        }
    }
}
