/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

[`EliasFanoMonotone`] augmented with a select-zero index over the same
upper bits, giving successor/predecessor/contains/index-of queries and
a skip-to iterator.

 */

use crate::bits::{BitFieldVec, CountBitVec};
use crate::dict::elias_fano_monotone::{DefaultEliasFanoMonotone, EliasFanoMonotone, SelectMany};
use crate::rank_sel::{SimpleSelect, SimpleSelectZero};
use crate::traits::*;
use std::cell::Cell;

/// Consecutive-bucket distance beyond which `skip_to` jumps via
/// `selectZero` rather than scanning forward one element at a time.
const SKIPPING_THRESHOLD: usize = 8;

/// An [`EliasFanoMonotone`] augmented with ordered-search primitives.
///
/// Composes (does not inherit from) an `EliasFanoMonotone`: overriding
/// `get` to mean something else (as `EliasFanoPrefixSum` does) would
/// leak through an `is-a` relationship, so every derived view here owns
/// its base structure instead.
#[derive(Debug, Clone)]
pub struct EliasFanoIndexedMonotone {
    monotone: DefaultEliasFanoMonotone,
    select_zero: SimpleSelectZero<CountBitVec>,
    first: Option<u64>,
    last: Option<u64>,
    /// `Unset` is `None`; `AtRank(r)` is `Some(r)`. Mutated through
    /// `&self` so the value-returning successor/predecessor family can
    /// keep read-like signatures.
    cursor: Cell<Option<usize>>,
}

impl EliasFanoIndexedMonotone {
    pub fn from_monotone(monotone: DefaultEliasFanoMonotone) -> Self {
        let n = monotone.len();
        let bits = monotone.high_bits().bits().clone();
        let select_zero = SimpleSelectZero::new(bits);
        let first = if n > 0 { Some(monotone.get(0)) } else { None };
        let last = if n > 0 { Some(monotone.get(n - 1)) } else { None };
        Self {
            monotone,
            select_zero,
            first,
            last,
            cursor: Cell::new(None),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.monotone.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.monotone.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> u64 {
        self.monotone.get(i)
    }

    pub fn monotone(&self) -> &DefaultEliasFanoMonotone {
        &self.monotone
    }

    /// The rank last reported by a successor/predecessor call, or
    /// `None` if the cursor has never been set.
    #[inline(always)]
    pub fn index(&self) -> Option<u64> {
        self.cursor.get().map(|r| r as u64)
    }

    fn low_bits(&self) -> &BitFieldVec {
        self.monotone.low_bits()
    }

    #[inline(always)]
    fn l(&self) -> u32 {
        self.monotone.lower_bit_width()
    }

    fn words(&self) -> &[u64] {
        self.monotone.high_bits().as_ref()
    }

    #[inline(always)]
    fn combine(&self, high_pos: usize, rank: usize) -> u64 {
        let high = (high_pos - rank) as u64;
        let low = if self.l() > 0 {
            self.low_bits().get(rank)
        } else {
            0
        };
        (high << self.l()) | low
    }

    /// Scans forward from `(word_idx, window, rank)` for the first
    /// element satisfying `pred`, mirroring
    /// [`crate::dict::elias_fano_monotone::EliasFanoMonotoneIterator::next_unsafe`]
    /// but seeded from an arbitrary bit position rather than
    /// `select(rank)`.
    fn forward_find(
        &self,
        mut word_idx: usize,
        mut window: u64,
        mut rank: usize,
        mut pred: impl FnMut(u64) -> bool,
    ) -> Option<(u64, usize)> {
        let words = self.words();
        loop {
            while window == 0 {
                word_idx += 1;
                if word_idx >= words.len() {
                    return None;
                }
                window = words[word_idx];
            }
            let high_pos = word_idx * 64 + window.trailing_zeros() as usize;
            let value = self.combine(high_pos, rank);
            if pred(value) {
                return Some((value, rank));
            }
            window &= window - 1;
            rank += 1;
        }
    }

    /// Position in `upper_bits` and the rank of the first element whose
    /// upper-bits bucket is `>= bucket`, via the
    /// `zeros_to_skip`/`selectZero` derivation.
    fn seek_bucket(&self, bucket: usize) -> (usize, usize) {
        let position = if bucket == 0 {
            0
        } else {
            unsafe { self.select_zero.select_zero_unchecked(bucket - 1) + 1 }
        };
        let rank = position - bucket;
        (position, rank)
    }

    fn window_at(&self, position: usize) -> (usize, u64) {
        let word_idx = position / 64;
        let bit_idx = position % 64;
        let window = self.words()[word_idx] & !((1u64 << bit_idx) - 1);
        (word_idx, window)
    }

    fn successor_raw(&self, lb: u64) -> Option<(u64, usize)> {
        if self.monotone.is_empty() {
            return None;
        }
        if lb <= self.first.unwrap() {
            return Some((self.first.unwrap(), 0));
        }
        if lb > self.last.unwrap() {
            return None;
        }
        let bucket = (lb >> self.l()) as usize;
        let (position, rank) = self.seek_bucket(bucket);
        let (word_idx, window) = self.window_at(position);
        self.forward_find(word_idx, window, rank, |v| v >= lb)
    }

    fn strict_successor_raw(&self, lb: u64) -> Option<(u64, usize)> {
        if lb == u64::MAX {
            return None;
        }
        self.successor_raw(lb + 1)
    }

    fn predecessor_raw(&self, ub: u64) -> Option<(u64, usize)> {
        if self.monotone.is_empty() {
            return None;
        }
        if ub > self.last.unwrap() {
            let n = self.monotone.len();
            return Some((self.last.unwrap(), n - 1));
        }
        if ub <= self.first.unwrap() {
            return None;
        }
        let bucket = (ub >> self.l()) as usize;
        let (position, rank_at_bucket) = self.seek_bucket(bucket);

        let mut best = if rank_at_bucket > 0 {
            let r = rank_at_bucket - 1;
            Some((self.monotone.get(r), r))
        } else {
            None
        };

        let (word_idx, window) = self.window_at(position);
        match self.forward_find(word_idx, window, rank_at_bucket, |v| v >= ub) {
            Some((_, r)) if r > rank_at_bucket => {
                let br = r - 1;
                best = Some((self.monotone.get(br), br));
            }
            Some(_) => {}
            None => {
                let n = self.monotone.len();
                best = Some((self.monotone.get(n - 1), n - 1));
            }
        }
        best
    }

    fn weak_predecessor_raw(&self, ub: u64) -> Option<(u64, usize)> {
        match ub.checked_add(1) {
            Some(ub1) => self.predecessor_raw(ub1),
            None => {
                let n = self.monotone.len();
                if n == 0 {
                    None
                } else {
                    Some((self.last.unwrap(), n - 1))
                }
            }
        }
    }

    /// The first `x_i >= lb`, or `None` if no such element exists
    /// (spec's `+∞` sentinel). Transitions the cursor to the returned
    /// rank.
    pub fn successor(&self, lb: u64) -> Option<u64> {
        let (v, r) = self.successor_raw(lb)?;
        self.cursor.set(Some(r));
        Some(v)
    }

    /// Does not mutate the cursor.
    pub fn successor_index(&self, lb: u64) -> Option<u64> {
        self.successor_raw(lb).map(|(_, r)| r as u64)
    }

    pub fn strict_successor(&self, lb: u64) -> Option<u64> {
        let (v, r) = self.strict_successor_raw(lb)?;
        self.cursor.set(Some(r));
        Some(v)
    }

    pub fn strict_successor_index(&self, lb: u64) -> Option<u64> {
        self.strict_successor_raw(lb).map(|(_, r)| r as u64)
    }

    /// The last `x_i < ub`, or `None` if no such element exists.
    pub fn predecessor(&self, ub: u64) -> Option<u64> {
        let (v, r) = self.predecessor_raw(ub)?;
        self.cursor.set(Some(r));
        Some(v)
    }

    pub fn predecessor_index(&self, ub: u64) -> Option<u64> {
        self.predecessor_raw(ub).map(|(_, r)| r as u64)
    }

    /// The last `x_i <= ub`.
    pub fn weak_predecessor(&self, ub: u64) -> Option<u64> {
        let (v, r) = self.weak_predecessor_raw(ub)?;
        self.cursor.set(Some(r));
        Some(v)
    }

    pub fn weak_predecessor_index(&self, ub: u64) -> Option<u64> {
        self.weak_predecessor_raw(ub).map(|(_, r)| r as u64)
    }

    /// Whether `x` appears in the sequence. Does not mutate the cursor.
    pub fn contains(&self, x: u64) -> bool {
        self.index_of(x).is_some()
    }

    /// The smallest index `i` with `x_i = x`, or `None`. Does not
    /// mutate the cursor.
    pub fn index_of(&self, x: u64) -> Option<u64> {
        if let (Some(first), Some(last)) = (self.first, self.last) {
            if x < first || x > last {
                return None;
            }
        } else {
            return None;
        }
        match self.successor_raw(x) {
            Some((v, r)) if v == x => Some(r as u64),
            _ => None,
        }
    }

    pub fn iter(&self) -> EliasFanoIndexedIterator<'_> {
        EliasFanoIndexedIterator::new(self)
    }
}

/// A forward iterator with `skip_to`.
pub struct EliasFanoIndexedIterator<'a> {
    ef: &'a EliasFanoIndexedMonotone,
    index: usize,
    word_idx: usize,
    window: u64,
    last_returned: Option<u64>,
}

impl<'a> EliasFanoIndexedIterator<'a> {
    fn new(ef: &'a EliasFanoIndexedMonotone) -> Self {
        let mut it = Self {
            ef,
            index: 0,
            word_idx: 0,
            window: 0,
            last_returned: None,
        };
        if ef.len() > 0 {
            let words = ef.words();
            it.window = words[0];
        }
        it
    }

    fn bucket_of(&self, v: u64) -> usize {
        (v >> self.ef.l()) as usize
    }

    pub fn next(&mut self) -> Option<u64> {
        let words = self.ef.words();
        if self.index >= self.ef.len() {
            return None;
        }
        while self.window == 0 {
            self.word_idx += 1;
            self.window = words[self.word_idx];
        }
        let high_pos = self.word_idx * 64 + self.window.trailing_zeros() as usize;
        let value = self.ef.combine(high_pos, self.index);
        self.window &= self.window - 1;
        self.index += 1;
        self.last_returned = Some(value);
        Some(value)
    }

    pub fn next_index(&self) -> usize {
        self.index
    }

    /// Advances to the first element `>= lb`. If `lb` is at or before
    /// the last emitted value, this is a no-op that returns the cached
    /// value (spec's idempotence contract).
    pub fn skip_to(&mut self, lb: u64) -> Option<u64> {
        if let Some(last) = self.last_returned {
            if lb <= last {
                return Some(last);
            }
        }
        if self.index >= self.ef.len() {
            return None;
        }

        let last_bucket = self.last_returned.map(|v| self.bucket_of(v)).unwrap_or(0);
        let target_bucket = self.bucket_of(lb);

        let found = if target_bucket.saturating_sub(last_bucket) >= SKIPPING_THRESHOLD {
            let (position, rank) = self.ef.seek_bucket(target_bucket);
            let (word_idx, window) = self.ef.window_at(position);
            self.ef.forward_find(word_idx, window, rank, |v| v >= lb)
        } else {
            loop {
                let words = self.ef.words();
                if self.index >= self.ef.len() {
                    break None;
                }
                while self.window == 0 {
                    self.word_idx += 1;
                    self.window = words[self.word_idx];
                }
                let high_pos = self.word_idx * 64 + self.window.trailing_zeros() as usize;
                let value = self.ef.combine(high_pos, self.index);
                if value >= lb {
                    break Some((value, self.index));
                }
                self.window &= self.window - 1;
                self.index += 1;
            }
        };

        if let Some((value, rank)) = found {
            let position = unsafe { self.ef.monotone.high_bits().select_unchecked(rank) };
            let (word_idx, mut window) = self.ef.window_at(position);
            window &= window - 1;
            self.word_idx = word_idx;
            self.window = window;
            self.index = rank + 1;
            self.last_returned = Some(value);
            Some(value)
        } else {
            self.index = self.ef.len();
            None
        }
    }
}

impl ConvertTo<EliasFanoIndexedMonotone> for DefaultEliasFanoMonotone {
    fn convert_to(self) -> anyhow::Result<EliasFanoIndexedMonotone> {
        Ok(EliasFanoIndexedMonotone::from_monotone(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::elias_fano_monotone::EliasFanoMonotoneBuilder;

    fn build(values: &[u64], u: u64) -> EliasFanoIndexedMonotone {
        let mut b = EliasFanoMonotoneBuilder::new(values.len(), u);
        for &v in values {
            b.push(v).unwrap();
        }
        EliasFanoIndexedMonotone::from_monotone(b.build().unwrap())
    }

    #[test]
    fn test_scenario_1() {
        let ef = build(&[3, 5, 5, 9, 11], 12);
        assert_eq!(ef.successor(6), Some(9));
        assert_eq!(ef.successor_index(6), Some(3));
        assert_eq!(ef.predecessor(5), Some(3));
        assert_eq!(ef.predecessor_index(5), Some(0));
        assert_eq!(ef.weak_predecessor(5), Some(5));
        assert_eq!(ef.weak_predecessor_index(5), Some(2));
        assert!(!ef.contains(7));
        assert!(ef.contains(9));
    }

    #[test]
    fn test_scenario_2_l_zero() {
        let ef = build(&[0, 0, 0, 1], 2);
        assert_eq!(ef.successor(1), Some(1));
        assert_eq!(ef.successor_index(1), Some(3));
        assert_eq!(ef.successor(2), None);
    }

    #[test]
    fn test_cursor_transitions() {
        let ef = build(&[3, 5, 5, 9, 11], 12);
        assert_eq!(ef.index(), None);
        ef.successor(6);
        assert_eq!(ef.index(), Some(3));
        ef.index_of(9);
        assert_eq!(ef.index(), Some(3), "index_of must not move the cursor");
        ef.contains(9);
        assert_eq!(ef.index(), Some(3), "contains must not move the cursor");
        ef.predecessor(5);
        assert_eq!(ef.index(), Some(0));
    }

    #[test]
    fn test_skip_to_iterator_scenario_5() {
        let ef = build(&[10, 20, 30, 40, 50], 51);
        let mut it = ef.iter();
        assert_eq!(it.skip_to(25), Some(30));
        assert_eq!(it.next_index(), 3);
        assert_eq!(it.skip_to(25), Some(30));
        assert_eq!(it.next(), Some(40));
    }

    #[test]
    fn test_skip_to_large_jump() {
        let values: Vec<u64> = (0..1000).map(|i| i * 2).collect();
        let ef = build(&values, 2001);
        let mut it = ef.iter();
        assert_eq!(it.skip_to(1500), Some(1500));
        assert_eq!(it.next_index(), 751);
        assert_eq!(it.skip_to(1400), Some(1500), "must be idempotent going backward");
    }

    #[test]
    fn test_successor_predecessor_random() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};
        let mut rng = SmallRng::seed_from_u64(3);
        let mut values = Vec::new();
        let mut v = 0u64;
        for _ in 0..500 {
            v += rng.gen_range(0..5);
            values.push(v);
        }
        let u = v + 1;
        let ef = build(&values, u);
        for _ in 0..200 {
            let lb = rng.gen_range(0..u);
            let expected = values.iter().copied().find(|&x| x >= lb);
            assert_eq!(ef.successor(lb), expected);
        }
        for _ in 0..200 {
            let ub = rng.gen_range(1..u + 1);
            let expected = values.iter().copied().rev().find(|&x| x < ub);
            assert_eq!(ef.predecessor(ub), expected);
        }
    }

    #[test]
    fn test_contains_index_of() {
        let ef = build(&[3, 5, 5, 9, 11], 12);
        assert_eq!(ef.index_of(5), Some(1));
        assert_eq!(ef.index_of(7), None);
        assert!(ef.contains(3));
        assert!(ef.contains(11));
        assert!(!ef.contains(0));
        assert!(!ef.contains(12));
    }

    #[test]
    fn test_empty() {
        let ef = build(&[], 0);
        assert_eq!(ef.successor(0), None);
        assert_eq!(ef.predecessor(0), None);
        assert!(!ef.contains(0));
        assert_eq!(ef.index(), None);
    }
}
