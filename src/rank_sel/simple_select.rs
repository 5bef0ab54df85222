/*
 * SPDX-FileCopyrightText: 2024 Michele Andreata
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2024 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A select structure over a bit vector using sparse sampling, generalizing
a compile-time-constant-quantum select index's layout
to inventory parameters chosen at construction time from the actual
density of the bit vector, as required when the density is not known
in advance (as for a general monotone sequence's upper bits).

 */

use crate::traits::*;
use crate::utils::broadword::select_in_word;

/// A span of the bit vector covering more than this many words gets an
/// explicit ("dense") sub-inventory of every one's position, so the
/// final lookup is O(1) instead of a linear scan. Kept well below the
/// span sizes produced by a half-density bit vector (the common case
/// for Elias–Fano's upper bits) so that dense spans are rare and the
/// extra sub-inventory storage stays `o(n)` overall.
const DENSE_THRESHOLD_WORDS: usize = 1024;

#[derive(Debug, Clone)]
enum SubInventory {
    /// Linear-scan this span starting from the inventory's recorded
    /// position.
    Sparse,
    /// The absolute position of every one-bit with rank in this span,
    /// indexed by `rank % ones_per_inventory`.
    Dense(Box<[usize]>),
}

/// A sparse-sampled select index over an owned bit vector `B`.
///
/// `B` must expose its bits as a flat `[u64]` slice (`AsRef<[u64]>`)
/// and know its own length and population count.
#[derive(Debug, Clone)]
pub struct SimpleSelect<B> {
    bits: B,
    /// Position of the `(i * ones_per_inventory)`-th one, for every
    /// inventory index `i`, plus a final sentinel equal to `bits.len()`.
    inventory: Box<[usize]>,
    sub_inventory: Box<[SubInventory]>,
    ones_per_inventory: usize,
    num_ones: usize,
}

impl<B: BitLength + BitCount + AsRef<[u64]>> SimpleSelect<B> {
    /// Builds a select index over `bits`.
    pub fn new(bits: B) -> Self {
        let num_ones = bits.count_ones();
        let ones_per_inventory = if num_ones <= 1 {
            1
        } else {
            let log2n = (num_ones as f64).log2();
            ((num_ones as f64 / log2n) as usize).max(1)
        };

        let num_inventories = num_ones.div_ceil(ones_per_inventory);
        let mut inventory = Vec::with_capacity(num_inventories + 1);

        let words = bits.as_ref();
        let mut past_ones = 0usize;
        let mut next_quantum = 0usize;

        for (word_idx, &word) in words.iter().enumerate() {
            let ones_in_word = word.count_ones() as usize;
            while past_ones + ones_in_word > next_quantum {
                let in_word = select_in_word(word, next_quantum - past_ones);
                let pos = word_idx * 64 + in_word;
                inventory.push(pos);
                next_quantum += ones_per_inventory;
            }
            past_ones += ones_in_word;
        }

        inventory.push(BitLength::len(&bits));

        // Second pass: for each span decide sparse vs dense by counting
        // words it covers; dense spans collect every one's absolute
        // position.
        let mut sub_inventory = Vec::with_capacity(num_inventories);
        for block in 0..num_inventories {
            let start = inventory[block];
            let end = inventory[block + 1];
            let span_words = end.div_ceil(64).saturating_sub(start / 64).max(1);
            if span_words > DENSE_THRESHOLD_WORDS {
                let rank_start = block * ones_per_inventory;
                let rank_end = (rank_start + ones_per_inventory).min(num_ones);
                let mut positions = Vec::with_capacity(rank_end - rank_start);
                for r in rank_start..rank_end {
                    positions.push(Self::linear_select(words, r, start, rank_start));
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
            ones_per_inventory,
            num_ones,
        }
    }

    fn linear_select(words: &[u64], rank: usize, hint_pos: usize, rank_at_hint: usize) -> usize {
        let mut word_idx = hint_pos / 64;
        let bit_idx = hint_pos % 64;
        let mut residual = rank - rank_at_hint;
        let mut word = (words[word_idx] >> bit_idx) << bit_idx;
        loop {
            let ones = word.count_ones() as usize;
            if residual < ones {
                return word_idx * 64 + select_in_word(word, residual);
            }
            residual -= ones;
            word_idx += 1;
            word = words[word_idx];
        }
    }

    pub fn into_inner(self) -> B {
        self.bits
    }

    /// Borrows the underlying bit vector, e.g. to clone it into a
    /// separate [`crate::rank_sel::SimpleSelectZero`] over the same bits
    /// (as [`crate::dict::EliasFanoIndexedMonotone`] does).
    pub fn bits(&self) -> &B {
        &self.bits
    }

    pub fn map<C>(self, f: impl FnOnce(B) -> C) -> SimpleSelect<C>
    where
        C: BitLength + BitCount + AsRef<[u64]>,
    {
        SimpleSelect {
            bits: f(self.bits),
            inventory: self.inventory,
            sub_inventory: self.sub_inventory,
            ones_per_inventory: self.ones_per_inventory,
            num_ones: self.num_ones,
        }
    }

    /// Writes `select(first), select(first + 1), ..., select(first + len - 1)`
    /// into `dest[..len]`.
    ///
    /// Within a sparse span, consecutive ranks are served by continuing
    /// to pop bits off the same cached word instead of re-reading it
    /// from the inventory hint on every call.
    pub fn select_many(&self, first: usize, dest: &mut [usize], len: usize) {
        assert!(first + len <= self.num_ones);
        if len == 0 {
            return;
        }
        let words = self.bits.as_ref();
        let mut rank = first;
        let mut out = 0;
        while out < len {
            let block = rank / self.ones_per_inventory;
            let block_end_rank = ((block + 1) * self.ones_per_inventory).min(self.num_ones);
            match &self.sub_inventory[block] {
                SubInventory::Dense(positions) => {
                    while out < len && rank < block_end_rank {
                        dest[out] = positions[rank % self.ones_per_inventory];
                        out += 1;
                        rank += 1;
                    }
                }
                SubInventory::Sparse => {
                    let hint_pos = self.inventory[block];
                    let rank_at_hint = block * self.ones_per_inventory;
                    let bit_idx = hint_pos % 64;
                    let mut word_idx = hint_pos / 64;
                    let mut word = (words[word_idx] >> bit_idx) << bit_idx;
                    let mut cursor_rank = rank_at_hint;
                    while out < len && rank < block_end_rank {
                        loop {
                            if word == 0 {
                                word_idx += 1;
                                word = words[word_idx];
                                continue;
                            }
                            if cursor_rank == rank {
                                dest[out] = word_idx * 64 + word.trailing_zeros() as usize;
                                break;
                            }
                            word &= word - 1;
                            cursor_rank += 1;
                        }
                        out += 1;
                        rank += 1;
                    }
                }
            }
        }
    }
}

impl<B: BitLength> BitLength for SimpleSelect<B> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.bits.len()
    }
}

impl<B> NumBits for SimpleSelect<B> {
    #[inline(always)]
    fn num_ones(&self) -> usize {
        self.num_ones
    }
}

impl<B: AsRef<[u64]>> Select for SimpleSelect<B> {
    #[inline]
    fn select(&self, rank: usize) -> Option<usize> {
        if rank >= self.num_ones {
            return None;
        }
        Some(unsafe { self.select_unchecked(rank) })
    }

    #[inline]
    unsafe fn select_unchecked(&self, rank: usize) -> usize {
        let block = rank / self.ones_per_inventory;
        let within = rank % self.ones_per_inventory;
        match &self.sub_inventory[block] {
            SubInventory::Dense(positions) => positions[within],
            SubInventory::Sparse => {
                let hint_pos = self.inventory[block];
                let rank_at_hint = block * self.ones_per_inventory;
                let words = self.bits.as_ref();
                Self::linear_select(words, rank, hint_pos, rank_at_hint)
            }
        }
    }
}

impl<B: AsRef<[u64]>> SelectHinted for SimpleSelect<B> {
    #[inline]
    unsafe fn select_unchecked_hinted(
        &self,
        rank: usize,
        pos: usize,
        rank_at_pos: usize,
    ) -> usize {
        Self::linear_select(self.bits.as_ref(), rank, pos, rank_at_pos)
    }
}

impl<B, T> AsRef<T> for SimpleSelect<B>
where
    B: AsRef<T>,
{
    fn as_ref(&self) -> &T {
        self.bits.as_ref()
    }
}
