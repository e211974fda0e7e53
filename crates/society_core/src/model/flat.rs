//! Flat identifier value type.
//!
//! # Responsibility
//! - Represent one dwelling unit as `(floor, unit)`.
//! - Own the single canonical rendering (`{floor}{unit:02}`).
//!
//! # Invariants
//! - `floor` is within `1..=FLOOR_COUNT`, `unit` within `1..=UNITS_PER_FLOOR`.
//! - Parsing accepts canonical renderings only; `"0302"` and `"3 02"` fail.
//! - Ordering is floor-major, unit-minor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Number of residential floors in the building.
pub const FLOOR_COUNT: u8 = 14;
/// Number of flats on every floor.
pub const UNITS_PER_FLOOR: u8 = 4;
/// Size of the canonical identifier space.
pub const FLAT_COUNT: usize = FLOOR_COUNT as usize * UNITS_PER_FLOOR as usize;

static FLAT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-9][0-9]?)(0[1-9])$").expect("valid flat id regex"));

/// Identifier outside the canonical floor/unit space.
///
/// Signals a data-integrity problem when it comes from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyError {
    pub key: String,
}

impl InvalidKeyError {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Display for InvalidKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "flat identifier outside canonical space (floors 1-{FLOOR_COUNT}, units 1-{UNITS_PER_FLOOR}): `{}`",
            self.key
        )
    }
}

impl Error for InvalidKeyError {}

/// Canonical flat identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FlatId {
    floor: u8,
    unit: u8,
}

impl FlatId {
    /// Builds an identifier, rejecting floors/units outside the building.
    pub fn new(floor: u8, unit: u8) -> Result<Self, InvalidKeyError> {
        if !(1..=FLOOR_COUNT).contains(&floor) || !(1..=UNITS_PER_FLOOR).contains(&unit) {
            return Err(InvalidKeyError::new(render(floor, unit)));
        }
        Ok(Self { floor, unit })
    }

    /// Parses a canonical rendering such as `"302"` or `"1404"`.
    pub fn parse(value: &str) -> Result<Self, InvalidKeyError> {
        let captures = FLAT_ID_RE
            .captures(value)
            .ok_or_else(|| InvalidKeyError::new(value))?;
        let floor = captures[1]
            .parse::<u8>()
            .map_err(|_| InvalidKeyError::new(value))?;
        let unit = captures[2]
            .parse::<u8>()
            .map_err(|_| InvalidKeyError::new(value))?;
        Self::new(floor, unit).map_err(|_| InvalidKeyError::new(value))
    }

    pub fn floor(self) -> u8 {
        self.floor
    }

    pub fn unit(self) -> u8 {
        self.unit
    }

    /// Canonical string form used as the storage key.
    pub fn as_key(self) -> String {
        render(self.floor, self.unit)
    }
}

fn render(floor: u8, unit: u8) -> String {
    format!("{floor}{unit:02}")
}

impl Display for FlatId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:02}", self.floor, self.unit)
    }
}

impl FromStr for FlatId {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FlatId {
    type Error = InvalidKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FlatId> for String {
    fn from(value: FlatId) -> Self {
        value.as_key()
    }
}

#[cfg(test)]
mod tests {
    use super::{FlatId, InvalidKeyError};

    #[test]
    fn renders_floor_with_two_digit_unit() {
        assert_eq!(FlatId::new(3, 2).unwrap().to_string(), "302");
        assert_eq!(FlatId::new(14, 4).unwrap().as_key(), "1404");
        assert_eq!(FlatId::new(1, 1).unwrap().as_key(), "101");
    }

    #[test]
    fn parse_accepts_canonical_renderings() {
        let flat = FlatId::parse("1203").expect("1203 should parse");
        assert_eq!(flat.floor(), 12);
        assert_eq!(flat.unit(), 3);
        assert_eq!("302".parse::<FlatId>().unwrap(), FlatId::new(3, 2).unwrap());
    }

    #[test]
    fn parse_rejects_values_outside_space() {
        for raw in ["9901", "305", "1501", "0302", "300", "", " 302", "30a", "10001"] {
            let err = FlatId::parse(raw).expect_err("non-canonical key must fail");
            assert_eq!(err, InvalidKeyError::new(raw));
        }
    }

    #[test]
    fn new_rejects_out_of_range_parts() {
        assert_eq!(FlatId::new(0, 1).unwrap_err().key, "001");
        assert_eq!(FlatId::new(15, 1).unwrap_err().key, "1501");
        assert_eq!(FlatId::new(2, 5).unwrap_err().key, "205");
    }

    #[test]
    fn ordering_is_floor_major() {
        let mut flats = vec![
            FlatId::parse("1001").unwrap(),
            FlatId::parse("204").unwrap(),
            FlatId::parse("201").unwrap(),
        ];
        flats.sort();
        let keys: Vec<String> = flats.into_iter().map(FlatId::as_key).collect();
        assert_eq!(keys, vec!["201", "204", "1001"]);
    }
}
