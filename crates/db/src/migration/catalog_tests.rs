//! Tests for catalog ordering and registration.

use proptest::prelude::*;
use rstest::rstest;

use super::*;
use crate::migration::definition::Sql;

fn noop(id: &str) -> MigrationDefinition {
    MigrationDefinition::new(id, Sql("SELECT 1"), Sql("SELECT 1"))
}

fn catalog_of(ids: &[&str]) -> Catalog {
    ids.iter()
        .fold(Catalog::new(), |catalog, id| catalog.register(noop(id)))
}

#[rstest]
#[case(&["002", "001", "003"])]
#[case(&["003", "002", "001"])]
#[case(&["001", "002", "003"])]
fn test_all_is_ascending_regardless_of_registration_order(#[case] ids: &[&str]) {
    let catalog = catalog_of(ids);
    let ordered: Vec<&str> = catalog.ids().collect();
    assert_eq!(ordered, vec!["001", "002", "003"]);
}

#[test]
fn test_zero_padded_ids_keep_insertion_stable() {
    let catalog = catalog_of(&[
        "010_add_index",
        "002_create_contacts_table",
        "001_create_users_table",
    ]);
    let ordered: Vec<&str> = catalog.ids().collect();
    assert_eq!(
        ordered,
        vec![
            "001_create_users_table",
            "002_create_contacts_table",
            "010_add_index"
        ]
    );
}

#[test]
#[should_panic(expected = "duplicate migration id: 001")]
fn test_register_duplicate_panics() {
    let _ = catalog_of(&["001", "002", "001"]);
}

#[test]
fn test_get_finds_registered_ids_only() {
    let catalog = catalog_of(&["001", "002"]);
    assert_eq!(catalog.get("002").map(MigrationDefinition::id), Some("002"));
    assert!(catalog.get("003").is_none());
}

#[test]
fn test_empty_catalog() {
    let catalog = Catalog::new();
    assert!(catalog.is_empty());
    assert_eq!(catalog.len(), 0);
    assert!(catalog.all().is_empty());
}

/// Unique ids in a random registration order.
fn shuffled_ids() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[0-9]{3}_[a-z]{1,8}", 1..24)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_all_is_sorted_and_complete(ids in shuffled_ids()) {
        let catalog = ids
            .iter()
            .fold(Catalog::new(), |catalog, id| catalog.register(noop(id)));

        let mut expected = ids.clone();
        expected.sort();
        let actual: Vec<String> = catalog.ids().map(str::to_owned).collect();

        prop_assert_eq!(actual, expected);
    }
}
