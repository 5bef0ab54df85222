/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

A view encoding an arbitrary sequence of naturals, not necessarily
monotone, possibly skewed toward small values: each element's bit
length is stored via an [`EliasFanoMonotone`] over prefix-summed
lengths, and the element's bits (minus the implicit leading one) are
packed into a flat bit array.

 */

use crate::bits::BitVec;
use crate::dict::elias_fano_monotone::{DefaultEliasFanoMonotone, EliasFanoMonotoneBuilder};
use crate::error::{EfError, Result};

/// A sequence of naturals stored via per-element bit-length boundaries
/// plus a packed bit array, achieving at most one bit of overhead per
/// element over its exact binary length.
#[derive(Debug, Clone)]
pub struct EliasFanoNonDecreasing {
    /// `o = -lower_bound + 1`, the shift making every stored value `>= 1`.
    offset: i64,
    /// Prefix sums of each element's MSB-derived bit length; boundaries
    /// has `len() == n + 1`.
    boundaries: DefaultEliasFanoMonotone,
    bits: BitVec,
}

impl EliasFanoNonDecreasing {
    /// Builds from `values`, none of which may be smaller than
    /// `lower_bound`.
    pub fn from_slice(values: &[u64], lower_bound: u64) -> Result<Self> {
        let n = values.len();
        let offset = 1i64 - lower_bound as i64;

        let mut shifted = Vec::with_capacity(n);
        let mut msbs = Vec::with_capacity(n);
        let mut total_bits = 0usize;
        for (index, &v) in values.iter().enumerate() {
            if v < lower_bound {
                return Err(EfError::LowerBoundExceeded {
                    index,
                    value: v,
                    lower_bound,
                });
            }
            let shifted_v = (v as i64 + offset) as u64;
            debug_assert!(shifted_v >= 1);
            let msb = 63 - shifted_v.leading_zeros();
            shifted.push(shifted_v);
            msbs.push(msb as u64);
            total_bits += msb as usize;
        }

        let mut boundaries_builder = EliasFanoMonotoneBuilder::new(n + 1, total_bits as u64 + 1);
        let mut running = 0u64;
        boundaries_builder.push(running)?;
        for &msb in &msbs {
            running += msb;
            boundaries_builder.push(running)?;
        }
        let boundaries = boundaries_builder.build()?;

        let mut bits = BitVec::new(total_bits);
        let mut pos = 0usize;
        for (i, &shifted_v) in shifted.iter().enumerate() {
            let msb = msbs[i] as usize;
            if msb > 0 {
                bits.set_long(pos, msb, shifted_v & ((1u64 << msb) - 1));
            }
            pos += msb;
        }

        Ok(Self {
            offset,
            boundaries,
            bits,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> u64 {
        assert!(i < self.len(), "index out of bounds");
        let from = self.boundaries.get(i) as usize;
        let to = self.boundaries.get(i + 1) as usize;
        let width = to - from;
        let low_bits = if width > 0 { self.bits.get_long(from, width) } else { 0 };
        let shifted_v = (1u64 << width) | low_bits;
        (shifted_v as i64 - self.offset) as u64
    }
}
