//! Property tests for the symlink indices.

use linkdex_core::{Index, IndexSpec, NonUniqueIndex, UniqueIndex};
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, IndexSpec) {
    let temp = TempDir::new().unwrap();
    let files = temp.path().join("docs");
    fs::create_dir_all(&files).unwrap();
    let spec = IndexSpec::new("Doc", "Tag", files, &temp.path().join("index.disk"));
    (temp, spec)
}

fn id_strategy() -> impl Strategy<Value = String> {
    "[a-z]{5}-[0-9]{3}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9@._-]{1,16}".prop_filter("not a dot entry", |v| v != "." && v != "..")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn non_unique_round_trip(
        pairs in prop::collection::btree_set((id_strategy(), value_strategy()), 1..12)
    ) {
        let (_temp, spec) = setup();
        let index = NonUniqueIndex::new(spec);
        index.init().unwrap();

        for (id, value) in &pairs {
            index.add(id, value).unwrap();
        }
        for (id, value) in &pairs {
            let ids = index.lookup(value).unwrap();
            prop_assert_eq!(ids.iter().filter(|i| *i == id).count(), 1);
        }
    }

    #[test]
    fn non_unique_duplicate_rejected(id in id_strategy(), value in value_strategy()) {
        let (_temp, spec) = setup();
        let index = NonUniqueIndex::new(spec);
        index.init().unwrap();

        index.add(&id, &value).unwrap();
        let err = index.add(&id, &value).unwrap_err();
        prop_assert!(err.is_already_exists());
        prop_assert_eq!(index.lookup(&value).unwrap(), vec![id]);
    }

    #[test]
    fn unique_rejects_second_id(
        id1 in id_strategy(),
        id2 in id_strategy(),
        value in value_strategy(),
    ) {
        prop_assume!(id1 != id2);
        let (_temp, spec) = setup();
        let index = UniqueIndex::new(spec);
        index.init().unwrap();

        index.add(&id1, &value).unwrap();
        prop_assert!(index.add(&id2, &value).unwrap_err().is_already_exists());
        prop_assert_eq!(index.lookup(&value).unwrap(), vec![id1]);
    }

    #[test]
    fn update_preserves_identity(
        id in id_strategy(),
        old in value_strategy(),
        new in value_strategy(),
    ) {
        prop_assume!(old != new);
        let (_temp, spec) = setup();
        let index = NonUniqueIndex::new(spec);
        index.init().unwrap();

        index.add(&id, &old).unwrap();
        index.update(&id, &old, &new).unwrap();

        prop_assert!(index.lookup(&old).unwrap_err().is_not_found());
        prop_assert!(index.lookup(&new).unwrap().contains(&id));
        prop_assert!(!index.index_root_dir().join(&old).exists());
    }

    #[test]
    fn never_added_is_not_found(value in value_strategy()) {
        let (_temp, spec) = setup();
        let index = NonUniqueIndex::new(spec.clone());
        index.init().unwrap();
        prop_assert!(index.lookup(&value).unwrap_err().is_not_found());
        prop_assert!(index.search(&value).unwrap_err().is_not_found());

        let unique = UniqueIndex::new(spec);
        prop_assert!(unique.lookup(&value).unwrap_err().is_not_found());
    }
}
