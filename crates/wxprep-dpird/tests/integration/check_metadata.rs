//! `dpird check` against the metadata table.

use std::collections::BTreeSet;

use wxprep_dpird::check;

use crate::common;

#[test]
fn test_check_defaults_to_newest_month() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("raw");
    common::raw_tree(&raw);
    common::write_station(&raw, "2022-04", "OLD", "time\n");
    common::write_station(&raw, "2022-05", "NEW", "time\n");
    let config = common::config(root.path(), &[]);

    let missing = check(&config, None).unwrap();
    assert_eq!(missing, BTreeSet::from(["NEW".to_string()]));
}

#[test]
fn test_check_explicit_dir_and_exclusions() {
    let root = tempfile::tempdir().unwrap();
    let raw = root.path().join("raw");
    common::raw_tree(&raw);
    common::write_station(&raw, "2022-04", "OLD", "time\n");
    common::write_station(&raw, "2022-04", "GONE", "time\n");
    let config = common::config(root.path(), &["GONE"]);

    let missing = check(&config, Some(&raw.join("2022-04"))).unwrap();
    assert_eq!(missing, BTreeSet::from(["OLD".to_string()]));
}

#[test]
fn test_check_all_known() {
    let root = tempfile::tempdir().unwrap();
    common::raw_tree(&root.path().join("raw"));
    let config = common::config(root.path(), &[]);
    assert!(check(&config, None).unwrap().is_empty());
}
