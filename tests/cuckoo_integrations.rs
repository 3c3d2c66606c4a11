use gauze::{CuckooFilter, Filter, FilterError};

#[test]
fn saturation_rejects_without_corrupting_lookups() {
    let mut filter = CuckooFilter::new(1, 0.9).expect("couldn't construct Cuckoo filter.");

    for word in ["foo", "bar", "baz", "boz"] {
        assert!(filter.add(word), "expected {word} to be accepted");
    }

    // the table is now full; a further insert is expected to be rejected
    // without disturbing anything already accepted.
    let rejected = !filter.add("bust");
    assert!(rejected, "expected the fifth insert into a full table to fail");

    for word in ["foo", "bar", "baz", "boz"] {
        assert!(filter.contains(word), "{word} should survive a failed insert elsewhere");
    }
}

#[test]
fn delete_then_readd() {
    let mut filter = CuckooFilter::new(100, 0.03).expect("couldn't construct Cuckoo filter.");

    assert!(filter.add("x"));
    assert_eq!(filter.remove("x"), Ok(true));
    assert!(!filter.contains("x"));
    assert_eq!(filter.len_u64(), 0);

    assert!(filter.add("x"));
    assert!(filter.contains("x"));
}

#[test]
fn serialization_round_trip_of_100_four_byte_ints() {
    let mut filter = CuckooFilter::new(100, 0.032).expect("couldn't construct Cuckoo filter.");

    let values: Vec<u32> = (0..100).collect();
    for v in &values {
        assert!(filter.add(v.to_be_bytes()));
    }

    let bytes = filter.to_bytes();
    let restored = CuckooFilter::from_bytes(&bytes).expect("round trip should decode");

    for v in &values {
        assert!(restored.contains(v.to_be_bytes()));
    }
    assert_eq!(restored.len_u64(), filter.len_u64());
    assert_eq!(restored.capacity(), filter.capacity());
    assert_eq!(restored.fpp(), filter.fpp());
}

#[test]
fn incompatible_peers_reject_with_invalid_argument_before_mutation() {
    let small = CuckooFilter::new(10, 0.03).unwrap();
    let mut large = CuckooFilter::new(100_000, 0.03).unwrap();
    assert!(!large.is_compatible(&small));

    let len_before = large.len_u64();
    assert!(matches!(
        large.add_all_from(&small),
        Err(FilterError::InvalidArgument { .. })
    ));
    assert_eq!(large.len_u64(), len_before);

    assert!(matches!(
        large.contains_all_from(&small),
        Err(FilterError::InvalidArgument { .. })
    ));
    assert!(matches!(
        large.remove_all_from(&small),
        Err(FilterError::InvalidArgument { .. })
    ));
}

#[test]
fn peer_union_then_containment() {
    let mut a = CuckooFilter::new(10_000, 0.03).unwrap();
    let mut b = CuckooFilter::new(10_000, 0.03).unwrap();
    assert!(a.is_compatible(&b));

    let items: Vec<String> = (0..500).map(|i| format!("item-{i}")).collect();
    for item in &items {
        a.add(item);
    }

    assert!(b.add_all_from(&a).unwrap());
    assert!(b.contains_all_from(&a).unwrap());
    assert!(a.equivalent(&b).unwrap());

    for item in &items {
        assert!(b.contains(item));
    }
}

#[test]
fn false_positive_rate_near_target_for_even_keys() {
    let capacity = 100_000u64;
    let mut filter = CuckooFilter::new(capacity, 0.03).expect("couldn't construct Cuckoo filter.");

    for i in (0..2 * capacity).step_by(2) {
        filter.add(i.to_string());
    }
    for i in (0..2 * capacity).step_by(2) {
        assert!(filter.contains(i.to_string()), "missing even key {i}");
    }

    let sample_size = 20_000u64;
    let false_positives = (1..sample_size)
        .step_by(2)
        .filter(|i| filter.contains(i.to_string()))
        .count();
    let observed_fpp = false_positives as f64 / (sample_size / 2) as f64;
    assert!(
        observed_fpp < 0.06,
        "observed false positive rate {observed_fpp} too far from target 0.03"
    );
}

#[test]
fn copy_shares_no_mutable_state() {
    let mut filter = CuckooFilter::new(1_000, 0.03).unwrap();
    filter.add("original");

    let mut copy = filter.copy();
    assert!(copy.contains("original"));

    copy.add("copy-only");
    assert!(!filter.contains("copy-only"));

    filter.remove("original").unwrap();
    assert!(!filter.contains("original"));
    assert!(copy.contains("original"));
}
