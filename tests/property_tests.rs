//! Property-based tests for corpus enumeration
//!
//! These use proptest to verify the determinism contract over many randomly
//! generated corpora: discovery is exactly "filter by extension, sort
//! lexicographically", and re-enumerating an unchanged tree yields the same
//! sequence.

use std::fs;
use std::path::{Path, PathBuf};

use gencheck::corpus::{discover_spec_files, has_extension};
use proptest::prelude::*;

fn file_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", prop_oneof!["asn", "py", "txt"]).prop_map(|(stem, ext)| format!("{}.{}", stem, ext))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn discovery_is_filtered_and_sorted(names in prop::collection::btree_set(file_name(), 0..20)) {
        let root = std::env::temp_dir()
            .join(format!("gencheck_prop_discovery_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).unwrap();
        for name in &names {
            fs::write(root.join(name), "").unwrap();
        }

        let found = discover_spec_files(&root, "asn").unwrap();

        let mut expected: Vec<PathBuf> = names
            .iter()
            .filter(|n| has_extension(Path::new(n), "asn"))
            .map(|n| root.join(n))
            .collect();
        expected.sort();
        prop_assert_eq!(&found, &expected);

        // Restartable: the same unchanged tree enumerates identically.
        let again = discover_spec_files(&root, "asn").unwrap();
        prop_assert_eq!(found, again);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn extension_match_is_exact(stem in "[a-z]{1,8}", ext in "[a-z]{1,4}", other in "[a-z]{1,4}") {
        let path = PathBuf::from(format!("{}.{}", stem, ext));
        prop_assert!(has_extension(&path, &ext));
        if ext != other {
            prop_assert!(!has_extension(&path, &other));
        }
    }
}
