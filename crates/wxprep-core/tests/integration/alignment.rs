//! Inner alignment keeps values attached to their labels.

use std::collections::BTreeSet;

use proptest::prelude::*;
use wxprep_core::{Dataset, VALID_TIME};

use crate::common::{hour, series};

#[test]
fn test_align_then_merge() {
    let mut parts = vec![series("tp", &[0, 1, 2, 3]), series("t2m", &[1, 2, 3, 4, 5])];
    Dataset::align_inner(&mut parts).unwrap();
    let merged = Dataset::merge(&parts).unwrap();

    assert_eq!(merged.time_values(VALID_TIME).unwrap(), [hour(1), hour(2), hour(3)]);
    assert_eq!(merged.var("tp").unwrap().data().as_slice().unwrap(), [1.0, 2.0, 3.0]);
    assert_eq!(merged.var("t2m").unwrap().data().as_slice().unwrap(), [1.0, 2.0, 3.0]);
}

#[test]
fn test_disjoint_series_align_to_empty() {
    let mut parts = vec![series("a", &[0, 1]), series("b", &[5, 6])];
    Dataset::align_inner(&mut parts).unwrap();
    assert_eq!(parts[0].dim_len(VALID_TIME), Some(0));
    assert_eq!(parts[1].dim_len(VALID_TIME), Some(0));
}

proptest! {
    #[test]
    fn prop_alignment_is_label_intersection(
        a in prop::collection::btree_set(0u32..72, 0..40),
        b in prop::collection::btree_set(0u32..72, 0..40),
    ) {
        let a: Vec<u32> = a.into_iter().collect();
        let b: Vec<u32> = b.into_iter().collect();
        let mut parts = vec![series("a", &a), series("b", &b)];
        Dataset::align_inner(&mut parts).unwrap();

        let expected: Vec<u32> = a
            .iter()
            .copied()
            .filter(|h| b.contains(h))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for (ds, var) in parts.iter().zip(["a", "b"]) {
            let times = ds.time_values(VALID_TIME).unwrap();
            prop_assert_eq!(times.len(), expected.len());
            let data = ds.var(var).unwrap().data();
            for (i, &h) in expected.iter().enumerate() {
                prop_assert_eq!(times[i], hour(h));
                prop_assert_eq!(data[[i]], h as f32);
            }
        }
    }
}
