/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use effano::dict::elias_fano_monotone::EliasFanoMonotoneBuilder;
use effano::dict::{
    EliasFanoBigMonotone, EliasFanoIndexedMonotone, EliasFanoNonDecreasing, EliasFanoPrefixSum,
};
use effano::traits::ConvertTo;

fn build_monotone(values: &[u64], u: u64) -> effano::dict::DefaultEliasFanoMonotone {
    let mut b = EliasFanoMonotoneBuilder::new(values.len(), u);
    for &v in values {
        b.push(v).unwrap();
    }
    b.build().unwrap()
}

#[test]
fn monotone_to_indexed_upgrade_preserves_values() {
    let x = [3u64, 5, 5, 9, 11];
    let ef = build_monotone(&x, 12);
    let indexed: EliasFanoIndexedMonotone = ef.convert_to().unwrap();

    for i in 0..x.len() {
        assert_eq!(indexed.get(i), x[i]);
    }
    assert_eq!(indexed.successor(6), Some(9));
    assert_eq!(indexed.predecessor(6), Some(5));
    assert_eq!(indexed.weak_predecessor(5), Some(5));
    assert!(indexed.contains(9));
    assert!(!indexed.contains(10));
}

#[test]
fn prefix_sum_round_trips_through_delta_and_direct_sum() {
    let summands = [2u64, 0, 3, 4, 0, 7];
    let ps = EliasFanoPrefixSum::from_slice(&summands).unwrap();
    assert_eq!(ps.len(), summands.len());

    let mut running = 0u64;
    for (i, &a) in summands.iter().enumerate() {
        assert_eq!(ps.prefix_sum(i), running);
        assert_eq!(ps.get(i), a);
        running += a;
    }
    assert_eq!(ps.prefix_sum(summands.len()), running);

    let collected: Vec<u64> = ps.iter().collect();
    assert_eq!(collected, summands);
}

#[test]
fn non_decreasing_round_trips_non_monotone_input() {
    let a = [1u64, 1, 2, 1, 100, 1, 1, 50];
    let nd = EliasFanoNonDecreasing::from_slice(&a, 1).unwrap();
    assert_eq!(nd.len(), a.len());
    for i in 0..a.len() {
        assert_eq!(nd.get(i), a[i]);
    }
}

#[test]
fn big_monotone_matches_flat_monotone() {
    // Segment-boundary crossing itself is exercised by bits::big's own
    // #[cfg(test)]-shrunk WORDS_PER_SEGMENT (not in effect for this
    // integration binary); this checks get()-for-get() agreement with
    // the flat structure end to end.
    let values: Vec<u64> = (0..5000u64).map(|i| i * 3).collect();
    let u = values.last().copied().unwrap() + 1;

    let flat = build_monotone(&values, u);
    let big = EliasFanoBigMonotone::from_iter(values.len(), u, values.iter().copied()).unwrap();

    assert_eq!(flat.len(), big.len());
    for i in (0..values.len()).step_by(37) {
        assert_eq!(flat.get(i), big.get(i));
    }
    assert_eq!(flat.get(values.len() - 1), big.get(values.len() - 1));
}

#[test]
fn indexed_iterator_skip_to_matches_linear_scan() {
    let values: Vec<u64> = (0..200u64).map(|i| i * 5).collect();
    let ef = build_monotone(&values, values.last().copied().unwrap() + 1);
    let indexed: EliasFanoIndexedMonotone = ef.convert_to().unwrap();

    let targets = [0u64, 17, 250, 999];
    let mut it = indexed.iter();
    let mut last_skip = None;
    for &t in &targets {
        let expected = values.iter().copied().find(|&v| v >= t);
        let got = it.skip_to(t);
        if let Some(last) = last_skip {
            if t <= last {
                assert_eq!(got, Some(last));
                continue;
            }
        }
        assert_eq!(got, expected);
        last_skip = got;
    }
}

#[cfg(feature = "mmap")]
#[test]
fn mapped_monotone_round_trips_through_disk() {
    use effano::dict::mapped_elias_fano::{Endianness, MappedEliasFanoMonotone};

    let values = [0u64, 7, 7, 200, 5000, 5000, 9999];
    let ef = build_monotone(&values, 10_000);

    let dir = tempfile::tempdir().unwrap();
    let basename = dir.path().join("roundtrip");
    MappedEliasFanoMonotone::dump(&ef, &basename, Endianness::Little).unwrap();
    let mapped = MappedEliasFanoMonotone::load(&basename).unwrap();

    assert_eq!(mapped.len(), ef.len());
    assert_eq!(mapped.universe(), ef.universe());
    for i in 0..values.len() {
        assert_eq!(mapped.get(i), ef.get(i));
    }
}
