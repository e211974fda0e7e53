//! Flat identifier space and occupancy classification.
//!
//! # Responsibility
//! - Enumerate the canonical identifier space.
//! - Classify identifiers as available or occupied from stored keys.
//! - Decide whether a flat may be chosen for a submission.
//!
//! # Invariants
//! - `all_identifiers()` is floor-major and always has `FLAT_COUNT` entries.
//! - `occupancy()` rejects stored keys outside the space instead of
//!   dropping them.
//! - A flat being edited stays assignable to its own record.

use crate::model::flat::{FlatId, InvalidKeyError, FLOOR_COUNT, UNITS_PER_FLOOR};
use std::collections::{BTreeMap, BTreeSet};

/// Availability of one flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Available,
    Occupied,
}

impl Occupancy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
        }
    }
}

/// Stateless registry over the fixed floor/unit space.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRegistry;

impl FlatRegistry {
    pub fn new() -> Self {
        Self
    }

    /// All identifiers, floor 1 unit 1 first and the top floor's last unit last.
    pub fn all_identifiers(&self) -> Vec<FlatId> {
        (1..=FLOOR_COUNT)
            .flat_map(|floor| (1..=UNITS_PER_FLOOR).map(move |unit| (floor, unit)))
            .filter_map(|(floor, unit)| FlatId::new(floor, unit).ok())
            .collect()
    }

    /// Whether `identifier` names a flat in the building.
    pub fn contains(&self, identifier: &str) -> bool {
        FlatId::parse(identifier).is_ok()
    }

    /// Parses stored keys, failing on the first key outside the space.
    pub fn parse_keys<I, K>(&self, existing_keys: I) -> Result<BTreeSet<FlatId>, InvalidKeyError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        existing_keys
            .into_iter()
            .map(|key| FlatId::parse(key.as_ref()))
            .collect()
    }

    /// Classifies every identifier against the stored key set.
    ///
    /// # Errors
    /// - `InvalidKeyError` when any stored key is outside the canonical space.
    pub fn occupancy<I, K>(
        &self,
        existing_keys: I,
    ) -> Result<BTreeMap<FlatId, Occupancy>, InvalidKeyError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let occupied = self.parse_keys(existing_keys)?;
        Ok(self.classify(&occupied))
    }

    /// Typed variant of [`FlatRegistry::occupancy`] for already-parsed keys.
    pub fn classify(&self, occupied: &BTreeSet<FlatId>) -> BTreeMap<FlatId, Occupancy> {
        self.all_identifiers()
            .into_iter()
            .map(|flat| {
                let state = if occupied.contains(&flat) {
                    Occupancy::Occupied
                } else {
                    Occupancy::Available
                };
                (flat, state)
            })
            .collect()
    }

    /// Whether `identifier` may be selected for a submission.
    ///
    /// True iff the identifier is canonical and either unoccupied or equal to
    /// `editing`. Stored keys outside the space cannot collide with a
    /// canonical identifier and are ignored here; `occupancy()` reports them.
    pub fn is_assignable<K: AsRef<str>>(
        &self,
        identifier: &str,
        existing_keys: &[K],
        editing: Option<&str>,
    ) -> bool {
        let Ok(flat) = FlatId::parse(identifier) else {
            return false;
        };
        let occupied: BTreeSet<FlatId> = existing_keys
            .iter()
            .filter_map(|key| FlatId::parse(key.as_ref()).ok())
            .collect();
        let editing = editing.and_then(|value| FlatId::parse(value).ok());
        is_flat_assignable(flat, &occupied, editing)
    }

    /// Identifiers a selection control should offer.
    pub fn assignable_identifiers(
        &self,
        occupied: &BTreeSet<FlatId>,
        editing: Option<FlatId>,
    ) -> Vec<FlatId> {
        self.all_identifiers()
            .into_iter()
            .filter(|flat| is_flat_assignable(*flat, occupied, editing))
            .collect()
    }
}

/// Typed assignability rule shared by the registry and the service.
pub fn is_flat_assignable(
    flat: FlatId,
    occupied: &BTreeSet<FlatId>,
    editing: Option<FlatId>,
) -> bool {
    !occupied.contains(&flat) || editing == Some(flat)
}

#[cfg(test)]
mod tests {
    use super::{FlatRegistry, Occupancy};
    use crate::model::flat::{FlatId, FLAT_COUNT};
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn all_identifiers_cover_space_in_floor_major_order() {
        let flats = FlatRegistry::new().all_identifiers();
        assert_eq!(flats.len(), FLAT_COUNT);
        assert_eq!(FLAT_COUNT, 56);

        let keys: Vec<String> = flats.iter().map(|flat| flat.as_key()).collect();
        assert_eq!(&keys[..5], &["101", "102", "103", "104", "201"]);
        assert_eq!(keys.last().map(String::as_str), Some("1404"));

        let distinct: HashSet<&String> = keys.iter().collect();
        assert_eq!(distinct.len(), 56);
        for key in &keys {
            let (floor, unit) = key.split_at(key.len() - 2);
            let floor: u8 = floor.parse().unwrap();
            assert!((1..=14).contains(&floor));
            assert!(["01", "02", "03", "04"].contains(&unit));
        }
    }

    #[test]
    fn occupancy_partitions_every_identifier() {
        let registry = FlatRegistry::new();
        let map = registry.occupancy(["302", "1404", "101"]).unwrap();

        assert_eq!(map.len(), 56);
        let occupied: Vec<String> = map
            .iter()
            .filter(|(_, state)| **state == Occupancy::Occupied)
            .map(|(flat, _)| flat.as_key())
            .collect();
        assert_eq!(occupied, vec!["101", "302", "1404"]);
        let available = map
            .values()
            .filter(|state| **state == Occupancy::Available)
            .count();
        assert_eq!(available, 53);
    }

    #[test]
    fn occupancy_rejects_keys_outside_space() {
        let err = FlatRegistry::new()
            .occupancy(["302", "9901"])
            .expect_err("corrupt key must surface");
        assert_eq!(err.key, "9901");
    }

    #[test]
    fn assignability_exempts_only_the_flat_being_edited() {
        let registry = FlatRegistry::new();
        let existing = ["302"];

        assert!(registry.is_assignable("302", &existing, Some("302")));
        assert!(!registry.is_assignable("302", &existing, None));
        assert!(!registry.is_assignable("302", &existing, Some("401")));
        assert!(registry.is_assignable("401", &existing, None));
        assert!(!registry.is_assignable("9901", &[] as &[&str], None));
    }

    #[test]
    fn editing_flat_missing_from_store_gets_no_exemption() {
        let registry = FlatRegistry::new();
        let existing = ["302"];

        assert!(registry.is_assignable("401", &existing, Some("401")));
        assert!(!registry.is_assignable("302", &existing, Some("9901")));
    }

    #[test]
    fn assignable_identifiers_skip_occupied_except_editing() {
        let registry = FlatRegistry::new();
        let occupied: BTreeSet<FlatId> = registry.parse_keys(["101", "102"]).unwrap();

        let fresh = registry.assignable_identifiers(&occupied, None);
        assert_eq!(fresh.len(), 54);
        assert_eq!(fresh[0].as_key(), "103");

        let editing = registry.assignable_identifiers(&occupied, FlatId::parse("102").ok());
        assert_eq!(editing.len(), 55);
        assert_eq!(editing[0].as_key(), "102");
    }
}
