use society_core::{FlatId, FlatRegistry, Occupancy, FLAT_COUNT};
use std::collections::BTreeSet;

#[test]
fn identifiers_are_distinct_and_canonical() {
    let registry = FlatRegistry::new();
    let flats = registry.all_identifiers();

    assert_eq!(flats.len(), FLAT_COUNT);
    let distinct: BTreeSet<FlatId> = flats.iter().copied().collect();
    assert_eq!(distinct.len(), FLAT_COUNT);
    for flat in &flats {
        let key = flat.as_key();
        assert_eq!(FlatId::parse(&key).unwrap(), *flat);
        assert_eq!(key, format!("{}{:02}", flat.floor(), flat.unit()));
    }
}

#[test]
fn occupancy_partitions_for_every_prefix_of_the_space() {
    let registry = FlatRegistry::new();
    let keys: Vec<String> = registry
        .all_identifiers()
        .into_iter()
        .map(FlatId::as_key)
        .collect();

    for taken in [0, 1, 17, FLAT_COUNT] {
        let existing = &keys[..taken];
        let map = registry.occupancy(existing).unwrap();
        assert_eq!(map.len(), FLAT_COUNT);

        let occupied: BTreeSet<String> = map
            .iter()
            .filter(|(_, state)| **state == Occupancy::Occupied)
            .map(|(flat, _)| flat.as_key())
            .collect();
        let expected: BTreeSet<String> = existing.iter().cloned().collect();
        assert_eq!(occupied, expected);
        assert_eq!(
            map.values()
                .filter(|state| **state == Occupancy::Available)
                .count(),
            FLAT_COUNT - taken
        );
    }
}

#[test]
fn occupancy_surfaces_corrupt_keys() {
    let err = FlatRegistry::new()
        .occupancy(vec!["101".to_string(), "0".to_string()])
        .unwrap_err();
    assert_eq!(err.key, "0");
    assert!(err.to_string().contains("outside canonical space"));
}

#[test]
fn assignability_rules() {
    let registry = FlatRegistry::new();

    assert!(registry.is_assignable("302", &["302"], Some("302")));
    assert!(!registry.is_assignable("302", &["302"], None));
    assert!(!registry.is_assignable("9901", &[] as &[&str], None));
    assert!(registry.is_assignable("1404", &["302"], None));
}

#[test]
fn assignability_ignores_out_of_space_keys_without_hiding_real_ones() {
    let registry = FlatRegistry::new();
    let existing = ["9901", "302"];

    assert!(!registry.is_assignable("302", &existing, None));
    assert!(registry.is_assignable("401", &existing, None));
    assert!(registry.is_assignable("302", &existing, Some("302")));
    assert!(registry.occupancy(existing).is_err());
}
