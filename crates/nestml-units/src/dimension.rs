//! SI base-dimension exponent vectors.
//!
//! A [`SiDimension`] is the 7-tuple of signed exponents over the SI base
//! units. Dimension arithmetic is componentwise: multiplying quantities adds
//! exponents, dividing subtracts them, and raising to an integer power scales
//! them.
//!
//! Exponent addition saturates at the `i8` bounds instead of wrapping; no
//! physically meaningful unit gets anywhere near them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SI base dimensional exponents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SiDimension {
    /// Length (L), base unit metre
    pub length: i8,
    /// Mass (M), base unit kilogram
    pub mass: i8,
    /// Time (T), base unit second
    pub time: i8,
    /// Electric current (I), base unit ampere
    pub current: i8,
    /// Thermodynamic temperature (Θ), base unit kelvin
    pub temperature: i8,
    /// Amount of substance (N), base unit mole
    pub amount: i8,
    /// Luminous intensity (J), base unit candela
    pub luminous: i8,
}

impl SiDimension {
    /// All exponents zero.
    pub const DIMENSIONLESS: SiDimension = SiDimension {
        length: 0,
        mass: 0,
        time: 0,
        current: 0,
        temperature: 0,
        amount: 0,
        luminous: 0,
    };

    pub const LENGTH: SiDimension = SiDimension {
        length: 1,
        ..Self::DIMENSIONLESS
    };

    pub const MASS: SiDimension = SiDimension {
        mass: 1,
        ..Self::DIMENSIONLESS
    };

    pub const TIME: SiDimension = SiDimension {
        time: 1,
        ..Self::DIMENSIONLESS
    };

    pub const CURRENT: SiDimension = SiDimension {
        current: 1,
        ..Self::DIMENSIONLESS
    };

    pub const TEMPERATURE: SiDimension = SiDimension {
        temperature: 1,
        ..Self::DIMENSIONLESS
    };

    pub const AMOUNT: SiDimension = SiDimension {
        amount: 1,
        ..Self::DIMENSIONLESS
    };

    pub const LUMINOUS: SiDimension = SiDimension {
        luminous: 1,
        ..Self::DIMENSIONLESS
    };

    /// Build a dimension from exponents in base-unit order
    /// (length, mass, time, current, temperature, amount, luminous).
    pub const fn from_exponents(e: [i8; 7]) -> Self {
        SiDimension {
            length: e[0],
            mass: e[1],
            time: e[2],
            current: e[3],
            temperature: e[4],
            amount: e[5],
            luminous: e[6],
        }
    }

    /// Exponents in base-unit order.
    pub const fn exponents(&self) -> [i8; 7] {
        [
            self.length,
            self.mass,
            self.time,
            self.current,
            self.temperature,
            self.amount,
            self.luminous,
        ]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents().iter().all(|&e| e == 0)
    }

    /// Multiply dimensions (add exponents). `None` if an exponent leaves the
    /// `i8` range.
    pub fn multiply(&self, other: &SiDimension) -> Option<SiDimension> {
        self.zip_with(other, i8::checked_add)
    }

    /// Divide dimensions (subtract exponents). `None` on exponent overflow.
    pub fn divide(&self, other: &SiDimension) -> Option<SiDimension> {
        self.zip_with(other, i8::checked_sub)
    }

    /// Raise to an integer power. `None` if an exponent leaves the `i8` range.
    pub fn pow(&self, exponent: i32) -> Option<SiDimension> {
        let mut out = [0i8; 7];
        for (slot, e) in out.iter_mut().zip(self.exponents()) {
            let scaled = i32::from(e).checked_mul(exponent)?;
            *slot = i8::try_from(scaled).ok()?;
        }
        Some(Self::from_exponents(out))
    }

    /// Halve every exponent. `None` if any exponent is odd.
    pub fn sqrt(&self) -> Option<SiDimension> {
        let exps = self.exponents();
        if exps.iter().any(|e| e % 2 != 0) {
            return None;
        }
        Some(Self::from_exponents(exps.map(|e| e / 2)))
    }

    fn zip_with(&self, other: &SiDimension, op: fn(i8, i8) -> Option<i8>) -> Option<SiDimension> {
        let a = self.exponents();
        let b = other.exponents();
        let mut out = [0i8; 7];
        for i in 0..7 {
            out[i] = op(a[i], b[i])?;
        }
        Some(Self::from_exponents(out))
    }
}

const BASE_SYMBOLS: [&str; 7] = ["m", "kg", "s", "A", "K", "mol", "cd"];

impl fmt::Display for SiDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }

        let parts: Vec<String> = BASE_SYMBOLS
            .iter()
            .zip(self.exponents())
            .filter(|(_, e)| *e != 0)
            .map(|(symbol, e)| format_dim(symbol, e))
            .collect();

        write!(f, "{}", parts.join("·"))
    }
}

fn format_dim(symbol: &str, exponent: i8) -> String {
    match exponent {
        1 => symbol.to_string(),
        exp => format!("{}^{}", symbol, exp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLT: SiDimension = SiDimension::from_exponents([2, 1, -3, -1, 0, 0, 0]);

    #[test]
    fn test_multiply_adds_exponents() {
        let v_per_s = VOLT.divide(&SiDimension::TIME).unwrap();
        assert_eq!(v_per_s.time, -4);
        assert_eq!(v_per_s.multiply(&SiDimension::TIME), Some(VOLT));
    }

    #[test]
    fn test_multiply_overflow() {
        let big = SiDimension::TIME.pow(100).unwrap();
        assert!(big.multiply(&big).is_none());
        assert!(big.divide(&SiDimension::TIME.pow(-100).unwrap()).is_none());
        assert_eq!(big.divide(&big), Some(SiDimension::DIMENSIONLESS));
    }

    #[test]
    fn test_multiply_is_commutative_and_associative() {
        let a = VOLT;
        let b = SiDimension::CURRENT;
        let c = SiDimension::from_exponents([0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(a.multiply(&b), b.multiply(&a));
        assert_eq!(
            a.multiply(&b).and_then(|ab| ab.multiply(&c)),
            b.multiply(&c).and_then(|bc| a.multiply(&bc))
        );
    }

    #[test]
    fn test_pow_zero_is_dimensionless() {
        assert!(VOLT.pow(0).unwrap().is_dimensionless());
    }

    #[test]
    fn test_pow_out_of_range() {
        assert!(VOLT.pow(100).is_none());
        assert_eq!(VOLT.pow(-1).unwrap().mass, -1);
    }

    #[test]
    fn test_sqrt_requires_even_exponents() {
        let area = SiDimension::LENGTH.pow(2).unwrap();
        assert_eq!(area.sqrt(), Some(SiDimension::LENGTH));
        assert_eq!(VOLT.sqrt(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SiDimension::DIMENSIONLESS.to_string(), "1");
        assert_eq!(VOLT.to_string(), "m^2·kg·s^-3·A^-1");
    }
}
