/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The two-level ("big") analogue of [`crate::dict::EliasFanoMonotone`],
backed by [`BitVecBig`]/[`BitFieldVecBig`] so no single contiguous
allocation grows past the practical limit of a flat array.

Query semantics are bit-for-bit identical to the flat structure;
`SelectBig` forgoes the dense/sparse sub-inventory split
[`crate::rank_sel::SimpleSelect`] uses (a pure performance
optimization, not a correctness requirement) and always finishes with a
linear scan, since the big variant's whole reason to exist is capacity
rather than peak query speed.

 */

use crate::bits::{BitFieldVecBig, BitVecBig};
use crate::error::{EfError, Result};
use crate::traits::BitLength;
use crate::utils::broadword::select_in_word;

/// A sparse-sampled select index over a [`BitVecBig`].
#[derive(Debug, Clone)]
struct SelectBig {
    bits: BitVecBig,
    inventory: Box<[usize]>,
    ones_per_inventory: usize,
    num_ones: usize,
}

impl SelectBig {
    fn new(bits: BitVecBig) -> Self {
        let num_ones = bits.count_ones();
        let ones_per_inventory = if num_ones <= 1 {
            1
        } else {
            let log2n = (num_ones as f64).log2();
            ((num_ones as f64 / log2n) as usize).max(1)
        };

        let num_inventories = num_ones.div_ceil(ones_per_inventory);
        let mut inventory = Vec::with_capacity(num_inventories + 1);

        let mut past_ones = 0usize;
        let mut next_quantum = 0usize;
        for word_idx in 0..bits.num_words() {
            let word = unsafe { bits.word_unchecked(word_idx) };
            let ones_in_word = word.count_ones() as usize;
            while past_ones + ones_in_word > next_quantum {
                let in_word = select_in_word(word, next_quantum - past_ones);
                inventory.push(word_idx * 64 + in_word);
                next_quantum += ones_per_inventory;
            }
            past_ones += ones_in_word;
        }
        inventory.push(bits.len());

        Self {
            bits,
            inventory: inventory.into_boxed_slice(),
            ones_per_inventory,
            num_ones,
        }
    }

    #[inline(always)]
    fn num_ones(&self) -> usize {
        self.num_ones
    }

    /// # Safety
    /// `rank` must be smaller than `num_ones()`.
    unsafe fn select_unchecked(&self, rank: usize) -> usize {
        let block = rank / self.ones_per_inventory;
        let hint_pos = self.inventory[block];
        let rank_at_hint = block * self.ones_per_inventory;
        let mut word_idx = hint_pos / 64;
        let bit_idx = hint_pos % 64;
        let mut residual = rank - rank_at_hint;
        let mut word = self.bits.word_unchecked(word_idx) & !((1u64 << bit_idx) - 1);
        loop {
            let ones = word.count_ones() as usize;
            if residual < ones {
                return word_idx * 64 + select_in_word(word, residual);
            }
            residual -= ones;
            word_idx += 1;
            word = self.bits.word_unchecked(word_idx);
        }
    }
}

/// The two-level analogue of [`crate::dict::EliasFanoMonotone`].
#[derive(Debug, Clone)]
pub struct EliasFanoBigMonotone {
    n: usize,
    u: u64,
    l: u32,
    low_bits: BitFieldVecBig,
    high_bits: SelectBig,
}

impl EliasFanoBigMonotone {
    /// Builds from a nondecreasing iterator of `n` values, all `< u`.
    pub fn from_iter<I: IntoIterator<Item = u64>>(n: usize, u: u64, iter: I) -> Result<Self> {
        let l = crate::dict::elias_fano_monotone::optimal_l(n, u);
        let high_len = n + (u >> l) as usize + 2;
        let mut low_bits = BitFieldVecBig::new(l as usize, n);
        let mut high_bits = BitVecBig::new(high_len);

        let mut count = 0usize;
        let mut last_value = 0u64;
        for value in iter {
            if count >= n {
                return Err(EfError::Overrun { expected: n });
            }
            if value >= u {
                return Err(EfError::OutOfRange {
                    index: count,
                    value,
                    upper_bound: u,
                });
            }
            if count > 0 && value < last_value {
                return Err(EfError::OutOfOrder {
                    index: count,
                    previous: last_value,
                    value,
                });
            }
            if l > 0 {
                low_bits.set(count, value & ((1u64 << l) - 1));
            }
            high_bits.set((value >> l) as usize + count, true);
            last_value = value;
            count += 1;
        }
        if count < n {
            return Err(EfError::Truncated { expected: n, got: count });
        }

        Ok(Self {
            n,
            u,
            l,
            low_bits,
            high_bits: SelectBig::new(high_bits),
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline(always)]
    pub fn universe(&self) -> u64 {
        self.u
    }

    pub fn get(&self, i: usize) -> u64 {
        assert!(i < self.n, "index out of bounds");
        unsafe { self.get_unchecked(i) }
    }

    /// # Safety
    /// `i` must be smaller than [`EliasFanoBigMonotone::len`].
    pub unsafe fn get_unchecked(&self, i: usize) -> u64 {
        let high = self.high_bits.select_unchecked(i) - i;
        let low = if self.l > 0 { self.low_bits.get_unchecked(i) } else { 0 };
        ((high as u64) << self.l) | low
    }

    pub fn delta(&self, i: usize) -> u64 {
        assert!(i + 1 < self.n, "delta undefined for the last element");
        self.get(i + 1) - self.get(i)
    }

    pub fn get_many(&self, i: usize, dest: &mut [u64], len: usize) {
        assert!(i + len <= self.n, "range out of bounds");
        for k in 0..len {
            dest[k] = self.get(i + k);
        }
    }

    pub fn num_ones(&self) -> usize {
        self.high_bits.num_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_equals_flat_scenario_1() {
        let x = [3u64, 5, 5, 9, 11];
        let big = EliasFanoBigMonotone::from_iter(x.len(), 12, x.iter().copied()).unwrap();
        for i in 0..x.len() {
            assert_eq!(big.get(i), x[i]);
        }
    }

    #[test]
    fn test_big_matches_flat_random() {
        use crate::dict::elias_fano_monotone::EliasFanoMonotoneBuilder;
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(5);
        let mut values = Vec::new();
        let mut v = 0u64;
        for _ in 0..2000 {
            v += rng.gen_range(0..8);
            values.push(v);
        }
        let u = v + 1;

        let mut flat_builder = EliasFanoMonotoneBuilder::new(values.len(), u);
        for &x in &values {
            flat_builder.push(x).unwrap();
        }
        let flat = flat_builder.build().unwrap();
        let big = EliasFanoBigMonotone::from_iter(values.len(), u, values.iter().copied()).unwrap();

        for i in 0..values.len() {
            assert_eq!(big.get(i), flat.get(i));
        }
    }

    #[test]
    fn test_empty() {
        let big = EliasFanoBigMonotone::from_iter(0, 0, std::iter::empty()).unwrap();
        assert_eq!(big.len(), 0);
        assert!(big.is_empty());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let err = EliasFanoBigMonotone::from_iter(2, 100, [10u64, 5]).unwrap_err();
        assert_eq!(
            err,
            EfError::OutOfOrder {
                index: 1,
                previous: 10,
                value: 5
            }
        );
    }
}
