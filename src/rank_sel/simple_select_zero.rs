/*
 * SPDX-FileCopyrightText: 2024 Michele Andreata
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2024 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A select-zero structure over the bit complement, with the same
dense/sparse sub-inventory layout as [`crate::rank_sel::SimpleSelect`]
but a sampling density chosen from the actual number of zeros at
construction time rather than fixed at compile time.

 */

use crate::traits::*;
use crate::utils::broadword::select_in_word;

const DENSE_THRESHOLD_WORDS: usize = 1024;

#[derive(Debug, Clone)]
enum SubInventory {
    Sparse,
    Dense(Box<[usize]>),
}

/// A sparse-sampled select-zero index over an owned bit vector `B`.
#[derive(Debug, Clone)]
pub struct SimpleSelectZero<B> {
    bits: B,
    inventory: Box<[usize]>,
    sub_inventory: Box<[SubInventory]>,
    zeros_per_inventory: usize,
    num_zeros: usize,
}

impl<B: BitLength + AsRef<[u64]>> SimpleSelectZero<B> {
    /// Builds a select-zero index over `bits`. `num_zeros` is `bits.len()
    /// - ` the bit vector's population count, computed here by scanning
    /// the complemented words rather than requiring a cached count.
    pub fn new(bits: B) -> Self {
        let len = BitLength::len(&bits);
        let words = bits.as_ref();

        let num_zeros = {
            let mut count = 0usize;
            let full_words = len / 64;
            for &word in &words[..full_words] {
                count += (!word).count_ones() as usize;
            }
            let rem = len % 64;
            if rem > 0 {
                let tail = !words[full_words] & ((1u64 << rem) - 1);
                count += tail.count_ones() as usize;
            }
            count
        };

        let zeros_per_inventory = if num_zeros <= 1 {
            1
        } else {
            let log2n = (num_zeros as f64).log2();
            ((num_zeros as f64 / log2n) as usize).max(1)
        };

        let num_inventories = num_zeros.div_ceil(zeros_per_inventory);
        let mut inventory = Vec::with_capacity(num_inventories + 1);

        let mut past_zeros = 0usize;
        let mut next_quantum = 0usize;
        for (word_idx, &word) in words.iter().enumerate() {
            let word = complement_masked(word, word_idx, len);
            let zeros_in_word = word.count_ones() as usize;
            while past_zeros + zeros_in_word > next_quantum {
                let in_word = select_in_word(word, next_quantum - past_zeros);
                inventory.push(word_idx * 64 + in_word);
                next_quantum += zeros_per_inventory;
            }
            past_zeros += zeros_in_word;
        }
        inventory.push(len);

        let mut sub_inventory = Vec::with_capacity(num_inventories);
        for block in 0..num_inventories {
            let start = inventory[block];
            let end = inventory[block + 1];
            let span_words = end.div_ceil(64).saturating_sub(start / 64).max(1);
            if span_words > DENSE_THRESHOLD_WORDS {
                let rank_start = block * zeros_per_inventory;
                let rank_end = (rank_start + zeros_per_inventory).min(num_zeros);
                let mut positions = Vec::with_capacity(rank_end - rank_start);
                for r in rank_start..rank_end {
                    positions.push(Self::linear_select(words, len, r, start, rank_start));
                }
                sub_inventory.push(SubInventory::Dense(positions.into_boxed_slice()));
            } else {
                sub_inventory.push(SubInventory::Sparse);
            }
        }

        Self {
            bits,
            inventory: inventory.into_boxed_slice(),
            sub_inventory: sub_inventory.into_boxed_slice(),
            zeros_per_inventory,
            num_zeros,
        }
    }

    fn linear_select(
        words: &[u64],
        len: usize,
        rank: usize,
        hint_pos: usize,
        rank_at_hint: usize,
    ) -> usize {
        let mut word_idx = hint_pos / 64;
        let bit_idx = hint_pos % 64;
        let mut residual = rank - rank_at_hint;
        let mut word = complement_masked(words[word_idx], word_idx, len) & !((1u64 << bit_idx) - 1);
        loop {
            let zeros = word.count_ones() as usize;
            if residual < zeros {
                return word_idx * 64 + select_in_word(word, residual);
            }
            residual -= zeros;
            word_idx += 1;
            word = complement_masked(words[word_idx], word_idx, len);
        }
    }

    pub fn into_inner(self) -> B {
        self.bits
    }
}

/// Complements `word`, masking off any bits at or beyond `len` in the
/// last word so they never register as zeros belonging to the vector.
#[inline(always)]
fn complement_masked(word: u64, word_idx: usize, len: usize) -> u64 {
    let word = !word;
    let word_start = word_idx * 64;
    if word_start >= len {
        0
    } else if word_start + 64 > len {
        word & ((1u64 << (len - word_start)) - 1)
    } else {
        word
    }
}

impl<B: BitLength> BitLength for SimpleSelectZero<B> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.bits.len()
    }
}

impl<B> SimpleSelectZero<B> {
    #[inline(always)]
    pub fn num_zeros(&self) -> usize {
        self.num_zeros
    }
}

impl<B: BitLength + AsRef<[u64]>> SelectZero for SimpleSelectZero<B> {
    #[inline]
    fn select_zero(&self, rank: usize) -> Option<usize> {
        if rank >= self.num_zeros {
            return None;
        }
        Some(unsafe { self.select_zero_unchecked(rank) })
    }

    #[inline]
    unsafe fn select_zero_unchecked(&self, rank: usize) -> usize {
        let block = rank / self.zeros_per_inventory;
        let within = rank % self.zeros_per_inventory;
        match &self.sub_inventory[block] {
            SubInventory::Dense(positions) => positions[within],
            SubInventory::Sparse => {
                let hint_pos = self.inventory[block];
                let rank_at_hint = block * self.zeros_per_inventory;
                Self::linear_select(
                    self.bits.as_ref(),
                    BitLength::len(&self.bits),
                    rank,
                    hint_pos,
                    rank_at_hint,
                )
            }
        }
    }
}

impl<B: BitLength + AsRef<[u64]>> SelectZeroHinted for SimpleSelectZero<B> {
    #[inline]
    unsafe fn select_zero_unchecked_hinted(
        &self,
        rank: usize,
        pos: usize,
        rank_at_pos: usize,
    ) -> usize {
        Self::linear_select(
            self.bits.as_ref(),
            BitLength::len(&self.bits),
            rank,
            pos,
            rank_at_pos,
        )
    }
}

impl<B, T> AsRef<T> for SimpleSelectZero<B>
where
    B: AsRef<T>,
{
    fn as_ref(&self) -> &T {
        self.bits.as_ref()
    }
}
