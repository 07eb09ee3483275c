//! Physical units for NESTML.
//!
//! This crate is the bottom of the NESTML front-end stack. It knows nothing
//! about syntax; it provides:
//!
//! - [`SiDimension`]: SI base-dimension exponent vectors.
//! - [`Unit`]: a dimension with scale and optional affine offset, plus the
//!   unit algebra used by type inference.
//! - [`table`]: the versioned predefined unit table, SI-prefix resolution
//!   and reverse lookup for diagnostics.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod dimension;
pub mod table;
pub mod unit;

pub use dimension::SiDimension;
pub use table::{display_name, lookup, UnitDefinition, SI_PREFIXES, UNIT_TABLE, UNIT_TABLE_VERSION};
pub use unit::{Conversion, Unit, UnitKind};
