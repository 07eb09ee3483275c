//! The predefined unit table and SI-prefix resolution.
//!
//! Every unit name NESTML admits is either an entry of [`UNIT_TABLE`] or a
//! prefixable entry preceded by one of [`SI_PREFIXES`] (`mV`, `pA`, `nS`,
//! `ms`). Exact entries win over prefix decomposition, so `mol` is the mole
//! and never milli-`ol`, and `Pa` is the pascal and never peta-`a`.
//!
//! The table is versioned by [`UNIT_TABLE_VERSION`]. Adding, removing or
//! changing an entry is a breaking change and bumps the version.

use crate::dimension::SiDimension;
use crate::unit::{approx_eq, Unit, UnitKind};

/// Version of [`UNIT_TABLE`].
pub const UNIT_TABLE_VERSION: u32 = 1;

/// One row of the predefined unit table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    pub symbol: &'static str,
    pub dims: SiDimension,
    /// Factor relative to the coherent SI unit.
    pub scale: f64,
    /// Affine offset; `0.0` for multiplicative units.
    pub offset: f64,
    /// Whether SI prefixes may be applied.
    pub prefixable: bool,
}

impl UnitDefinition {
    const fn base(symbol: &'static str, e: [i8; 7]) -> Self {
        Self {
            symbol,
            dims: SiDimension::from_exponents(e),
            scale: 1.0,
            offset: 0.0,
            prefixable: true,
        }
    }

    pub fn unit(&self) -> Unit {
        let kind = if self.offset == 0.0 {
            UnitKind::Multiplicative
        } else {
            UnitKind::Affine {
                offset: self.offset,
            }
        };
        Unit::new(kind, self.dims, self.scale)
    }
}

/// Exponent order: length, mass, time, current, temperature, amount, luminous.
///
/// Entries earlier in the table are preferred when naming a unit.
pub const UNIT_TABLE: &[UnitDefinition] = &[
    // SI base units (mass is tabled as the gram so that `kg`, `mg` resolve)
    UnitDefinition::base("s", [0, 0, 1, 0, 0, 0, 0]),
    UnitDefinition::base("m", [1, 0, 0, 0, 0, 0, 0]),
    UnitDefinition {
        scale: 1e-3,
        ..UnitDefinition::base("g", [0, 1, 0, 0, 0, 0, 0])
    },
    UnitDefinition::base("A", [0, 0, 0, 1, 0, 0, 0]),
    UnitDefinition::base("K", [0, 0, 0, 0, 1, 0, 0]),
    UnitDefinition::base("mol", [0, 0, 0, 0, 0, 1, 0]),
    UnitDefinition::base("cd", [0, 0, 0, 0, 0, 0, 1]),
    // Derived units
    UnitDefinition::base("V", [2, 1, -3, -1, 0, 0, 0]),
    UnitDefinition::base("S", [-2, -1, 3, 2, 0, 0, 0]),
    UnitDefinition::base("F", [-2, -1, 4, 2, 0, 0, 0]),
    UnitDefinition::base("Ohm", [2, 1, -3, -2, 0, 0, 0]),
    UnitDefinition::base("Hz", [0, 0, -1, 0, 0, 0, 0]),
    UnitDefinition::base("C", [0, 0, 1, 1, 0, 0, 0]),
    UnitDefinition::base("N", [1, 1, -2, 0, 0, 0, 0]),
    UnitDefinition::base("Pa", [-1, 1, -2, 0, 0, 0, 0]),
    UnitDefinition::base("J", [2, 1, -2, 0, 0, 0, 0]),
    UnitDefinition::base("W", [2, 1, -3, 0, 0, 0, 0]),
    UnitDefinition::base("Wb", [2, 1, -2, -1, 0, 0, 0]),
    UnitDefinition::base("T", [0, 1, -2, -1, 0, 0, 0]),
    UnitDefinition::base("H", [2, 1, -2, -2, 0, 0, 0]),
    UnitDefinition::base("lm", [0, 0, 0, 0, 0, 0, 1]),
    UnitDefinition::base("lx", [-2, 0, 0, 0, 0, 0, 1]),
    UnitDefinition::base("Bq", [0, 0, -1, 0, 0, 0, 0]),
    UnitDefinition::base("Gy", [2, 0, -2, 0, 0, 0, 0]),
    UnitDefinition::base("Sv", [2, 0, -2, 0, 0, 0, 0]),
    UnitDefinition::base("kat", [0, 0, -1, 0, 0, 1, 0]),
    UnitDefinition {
        scale: 1e-3,
        ..UnitDefinition::base("L", [3, 0, 0, 0, 0, 0, 0])
    },
    // Affine temperature scales
    UnitDefinition {
        offset: 273.15,
        prefixable: false,
        ..UnitDefinition::base("°C", [0, 0, 0, 0, 1, 0, 0])
    },
    UnitDefinition {
        offset: 273.15,
        prefixable: false,
        ..UnitDefinition::base("degC", [0, 0, 0, 0, 1, 0, 0])
    },
];

/// SI metric prefixes with their decimal exponents.
///
/// ASCII `u` is listed before `μ` so that generated names stay ASCII.
pub const SI_PREFIXES: &[(&str, i32)] = &[
    ("Y", 24),  // yotta
    ("Z", 21),  // zetta
    ("E", 18),  // exa
    ("P", 15),  // peta
    ("T", 12),  // tera
    ("G", 9),   // giga
    ("M", 6),   // mega
    ("k", 3),   // kilo
    ("h", 2),   // hecto
    ("da", 1),  // deca
    ("d", -1),  // deci
    ("c", -2),  // centi
    ("m", -3),  // milli
    ("u", -6),  // micro (ASCII)
    ("μ", -6),  // micro
    ("n", -9),  // nano
    ("p", -12), // pico
    ("f", -15), // femto
    ("a", -18), // atto
    ("z", -21), // zepto
    ("y", -24), // yocto
];

/// Find a table entry by exact symbol.
pub fn definition(symbol: &str) -> Option<&'static UnitDefinition> {
    UNIT_TABLE.iter().find(|def| def.symbol == symbol)
}

/// Resolve a unit name, with SI prefix support.
///
/// # Resolution Strategy
///
/// 1. Exact match against the table (`m`, `mol`, `Pa`, `°C`).
/// 2. Strip a prefix and match the remainder against a prefixable entry.
///    Two-letter prefixes are tried before one-letter ones.
pub fn lookup(name: &str) -> Option<Unit> {
    if let Some(def) = definition(name) {
        return Some(def.unit());
    }

    let mut prefixes: Vec<&(&str, i32)> = SI_PREFIXES.iter().collect();
    prefixes.sort_by_key(|(p, _)| std::cmp::Reverse(p.chars().count()));

    for (prefix, exp) in prefixes {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        if let Some(def) = definition(rest).filter(|def| def.prefixable) {
            return Some(def.unit().with_prefix(10f64.powi(*exp)));
        }
    }
    None
}

/// Name of a unit that is exactly one table entry, possibly prefixed.
fn direct_name(unit: &Unit) -> Option<String> {
    for def in UNIT_TABLE {
        if def.dims != *unit.dims() || !approx_eq(def.offset, unit.offset()) {
            continue;
        }
        let ratio = unit.scale() / def.scale;
        if approx_eq(ratio, 1.0) {
            return Some(def.symbol.to_string());
        }
        if !def.prefixable {
            continue;
        }
        if let Some((prefix, _)) = SI_PREFIXES
            .iter()
            .find(|(_, exp)| approx_eq(ratio, 10f64.powi(*exp)))
        {
            return Some(format!("{}{}", prefix, def.symbol));
        }
    }
    None
}

/// Human-readable name for a unit, used in diagnostics.
///
/// Tries a single (prefixed) table entry first, then a quotient or product
/// of two such entries with a time-like or coherent second factor
/// (`nS/ms`, `mV/ms`, `pA*ms`). Falls back to the dimension vector.
pub fn display_name(unit: &Unit) -> String {
    if unit.is_dimensionless() && approx_eq(unit.scale(), 1.0) && unit.is_multiplicative() {
        return "1".to_string();
    }
    if let Some(name) = direct_name(unit) {
        return name;
    }
    if unit.is_multiplicative() {
        for factor in factor_candidates() {
            let factor_name = direct_name(&factor);
            let Some(factor_name) = factor_name else {
                continue;
            };
            if let Some(num) = unit.multiply(&factor).as_ref().and_then(direct_name) {
                if !factor.is_dimensionless() {
                    return format!("{}/{}", num, factor_name);
                }
            }
            if let Some(rest) = unit.divide(&factor).as_ref().and_then(direct_name) {
                if rest != "1" {
                    return format!("{}*{}", rest, factor_name);
                }
            }
        }
    }
    unit.to_string()
}

fn factor_candidates() -> Vec<Unit> {
    let second = Unit::coherent(SiDimension::TIME);
    let mut out = vec![second.with_prefix(1e-3), second];
    out.extend(
        UNIT_TABLE
            .iter()
            .filter(|def| def.offset == 0.0 && def.symbol != "s")
            .map(UnitDefinition::unit),
    );
    out
}
