/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Same logical layout as [`crate::dict::EliasFanoMonotone`], but the
lower-bits array is a memory-mapped sequence of 64-bit words rather
than an owned `Vec`.

Dump format: two files, `<basename>.object` (version tag, length, `l`,
endianness, and the raw upper-bits words) and `<basename>.lowerbits`
(`n * l` bits rounded up to 64-bit words, no header, in the declared
endianness). The select index over the upper bits is never persisted:
`load` rebuilds it from the deserialized words with
[`SimpleSelect::new`], the same way construction does.

 */

use crate::bits::{BitVec, CountBitVec};
use crate::error::{EfError, Result};
use crate::rank_sel::SimpleSelect;
use crate::traits::{Select, VSlice, VSliceCore};
use log::debug;
use mmap_rs::{Mmap, MmapOptions};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    fn tag(self) -> u8 {
        match self {
            Endianness::Big => 0,
            Endianness::Little => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Endianness::Big),
            1 => Ok(Endianness::Little),
            other => Err(EfError::Format {
                reason: format!("unknown endianness tag {other}"),
            }),
        }
    }

    fn read_u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Endianness::Big => u64::from_be_bytes(bytes),
            Endianness::Little => u64::from_le_bytes(bytes),
        }
    }

    fn write_u64(self, value: u64) -> [u8; 8] {
        match self {
            Endianness::Big => value.to_be_bytes(),
            Endianness::Little => value.to_le_bytes(),
        }
    }
}

/// A read-only view over a `.lowerbits` file, mapped into memory and
/// shared (via [`Arc`]) by every lightweight copy of the structure.
#[derive(Clone)]
struct MappedLowerBits {
    mmap: Arc<Mmap>,
    bit_width: usize,
    len: usize,
}

impl std::fmt::Debug for MappedLowerBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedLowerBits")
            .field("bit_width", &self.bit_width)
            .field("len", &self.len)
            .finish()
    }
}

impl MappedLowerBits {
    fn words(&self) -> &[u64] {
        let ptr = self.mmap.as_ptr() as *const u64;
        let num_words = self.mmap.len() / 8;
        unsafe { std::slice::from_raw_parts(ptr, num_words) }
    }
}

impl VSliceCore for MappedLowerBits {
    #[inline(always)]
    fn bit_width(&self) -> usize {
        self.bit_width
    }
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }
}

impl VSlice for MappedLowerBits {
    #[inline(always)]
    unsafe fn get_unchecked(&self, index: usize) -> u64 {
        if self.bit_width == 0 {
            return 0;
        }
        crate::utils::read_bits(self.words(), index * self.bit_width, self.bit_width)
    }
}

/// A memory-mapped [`crate::dict::EliasFanoMonotone`].
#[derive(Debug, Clone)]
pub struct MappedEliasFanoMonotone {
    n: usize,
    u: u64,
    l: u32,
    low_bits: MappedLowerBits,
    high_bits: SimpleSelect<CountBitVec>,
}

impl MappedEliasFanoMonotone {
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
    /// `i` must be smaller than [`MappedEliasFanoMonotone::len`].
    pub unsafe fn get_unchecked(&self, i: usize) -> u64 {
        let high = self.high_bits.select_unchecked(i) - i;
        let low = if self.l > 0 {
            VSlice::get_unchecked(&self.low_bits, i)
        } else {
            0
        };
        ((high as u64) << self.l) | low
    }

    /// Dumps the in-memory structure to `<basename>.object` and
    /// `<basename>.lowerbits`.
    pub fn dump(
        ef: &crate::dict::DefaultEliasFanoMonotone,
        basename: impl AsRef<Path>,
        endianness: Endianness,
    ) -> Result<()> {
        let basename = basename.as_ref();
        let object_path = with_ext(basename, "object");
        let lowerbits_path = with_ext(basename, "lowerbits");
        debug!("dumping EliasFanoMonotone to {}", basename.display());

        let (n, u, l, low_bits, high_bits) = ef.clone().into_raw_parts();
        let upper_words = high_bits.bits().as_ref();
        let upper_len = high_bits.bits().len();

        let mut object_file = File::create(&object_path)?;
        object_file.write_all(&[FORMAT_VERSION])?;
        object_file.write_all(&endianness.write_u64(n as u64))?;
        object_file.write_all(&endianness.write_u64(u))?;
        object_file.write_all(&endianness.write_u64(l as u64))?;
        object_file.write_all(&endianness.write_u64(upper_len as u64))?;
        object_file.write_all(&endianness.write_u64(upper_words.len() as u64))?;
        object_file.write_all(&[endianness.tag()])?;
        for &word in upper_words {
            object_file.write_all(&endianness.write_u64(word))?;
        }

        let num_low_words = (n * l as usize).div_ceil(64).max(1);
        let mut lowerbits_file = File::create(&lowerbits_path)?;
        for i in 0..num_low_words {
            let word = if l > 0 {
                pack_low_word(&low_bits, l as usize, i, n)
            } else {
                0
            };
            lowerbits_file.write_all(&endianness.write_u64(word))?;
        }
        Ok(())
    }

    /// Loads a structure previously written by [`Self::dump`], mapping
    /// `<basename>.lowerbits` into memory.
    pub fn load(basename: impl AsRef<Path>) -> Result<Self> {
        let basename = basename.as_ref();
        let object_path = with_ext(basename, "object");
        let lowerbits_path = with_ext(basename, "lowerbits");

        let mut object_bytes = Vec::new();
        File::open(&object_path)?.read_to_end(&mut object_bytes)?;
        if object_bytes.is_empty() {
            return Err(EfError::Format {
                reason: "empty .object file".to_string(),
            });
        }
        let version = object_bytes[0];
        if version != FORMAT_VERSION {
            return Err(EfError::Format {
                reason: format!("unsupported object version {version}"),
            });
        }
        if object_bytes.len() < 1 + 8 * 5 + 1 {
            return Err(EfError::Format {
                reason: "truncated .object header".to_string(),
            });
        }
        // endianness is stored right after the header's fixed fields,
        // but we need it to interpret those fields, so peek it first.
        let endianness = Endianness::from_tag(object_bytes[1 + 8 * 5])?;
        let read_field = |off: usize| -> u64 {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&object_bytes[off..off + 8]);
            endianness.read_u64(bytes)
        };
        let n = read_field(1) as usize;
        let u = read_field(9);
        let l = read_field(17) as u32;
        let upper_len = read_field(25) as usize;
        let num_upper_words = read_field(33) as usize;

        let header_len = 1 + 8 * 5 + 1;
        if object_bytes.len() != header_len + num_upper_words * 8 {
            return Err(EfError::Format {
                reason: "object file length inconsistent with declared word count".to_string(),
            });
        }
        let mut upper_words = Vec::with_capacity(num_upper_words);
        for i in 0..num_upper_words {
            let off = header_len + i * 8;
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&object_bytes[off..off + 8]);
            upper_words.push(endianness.read_u64(bytes));
        }
        let upper_bits = unsafe { BitVec::from_raw_parts(upper_words, upper_len) };
        let high_bits = SimpleSelect::new(upper_bits.with_count());

        let file = File::open(&lowerbits_path)?;
        let file_len = file.metadata()?.len() as usize;
        // mmap-rs panics on a zero-length mapping, so an empty lowerbits
        // file (n == 0 or l == 0) still maps one padding byte.
        let mmap = unsafe {
            MmapOptions::new(file_len.max(1))
                .map_err(|e| EfError::Io(e.to_string()))?
                .with_file(&file, 0)
                .map()
                .map_err(|e| EfError::Io(e.to_string()))?
        };

        Ok(Self {
            n,
            u,
            l,
            low_bits: MappedLowerBits {
                mmap: Arc::new(mmap),
                bit_width: l as usize,
                len: n,
            },
            high_bits,
        })
    }

    /// A lightweight copy sharing the same underlying memory mapping.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

fn with_ext(basename: &Path, ext: &str) -> PathBuf {
    let mut path = basename.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Packs word `word_idx` of the `n` `l`-bit fields in `low_bits` into a
/// single 64-bit word, matching the on-disk layout `load` expects.
fn pack_low_word(low_bits: &crate::bits::BitFieldVec, l: usize, word_idx: usize, n: usize) -> u64 {
    let mut word = 0u64;
    let bit_start = word_idx * 64;
    if n == 0 {
        return 0;
    }
    let first_field = bit_start / l;
    let last_field = ((bit_start + 63) / l).min(n - 1);
    for field in first_field..=last_field.max(first_field) {
        if field >= n {
            break;
        }
        let field_bit_start = field * l;
        if field_bit_start >= bit_start + 64 || field_bit_start + l <= bit_start {
            continue;
        }
        let value = low_bits.get(field);
        let rel = field_bit_start as i64 - bit_start as i64;
        if rel >= 0 {
            word |= value.checked_shl(rel as u32).unwrap_or(0);
        } else {
            word |= value >> (-rel);
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::elias_fano_monotone::EliasFanoMonotoneBuilder;
    use tempfile::tempdir;

    #[test]
    fn test_dump_load_scenario_6() {
        let values = [0u64, 100, 200, 10_000];
        let mut b = EliasFanoMonotoneBuilder::new(values.len(), 20_000);
        for &v in &values {
            b.push(v).unwrap();
        }
        let ef = b.build().unwrap();

        let dir = tempdir().unwrap();
        let basename = dir.path().join("ef");
        MappedEliasFanoMonotone::dump(&ef, &basename, Endianness::Little).unwrap();
        let mapped = MappedEliasFanoMonotone::load(&basename).unwrap();

        assert_eq!(mapped.len(), ef.len());
        for i in 0..values.len() {
            assert_eq!(mapped.get(i), ef.get(i));
        }
    }

    #[test]
    fn test_dump_load_big_endian() {
        let values = [1u64, 2, 3, 4, 5, 1000, 1000, 50_000];
        let mut b = EliasFanoMonotoneBuilder::new(values.len(), 100_000);
        for &v in &values {
            b.push(v).unwrap();
        }
        let ef = b.build().unwrap();

        let dir = tempdir().unwrap();
        let basename = dir.path().join("ef_be");
        MappedEliasFanoMonotone::dump(&ef, &basename, Endianness::Big).unwrap();
        let mapped = MappedEliasFanoMonotone::load(&basename).unwrap();
        for i in 0..values.len() {
            assert_eq!(mapped.get(i), ef.get(i));
        }
    }

    #[test]
    fn test_copy_shares_mapping() {
        let values = [1u64, 2, 3, 4, 5];
        let mut b = EliasFanoMonotoneBuilder::new(values.len(), 10);
        for &v in &values {
            b.push(v).unwrap();
        }
        let ef = b.build().unwrap();

        let dir = tempdir().unwrap();
        let basename = dir.path().join("ef2");
        MappedEliasFanoMonotone::dump(&ef, &basename, Endianness::Little).unwrap();
        let mapped = MappedEliasFanoMonotone::load(&basename).unwrap();
        let copy = mapped.copy();
        for i in 0..values.len() {
            assert_eq!(copy.get(i), mapped.get(i));
        }
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = tempdir().unwrap();
        let basename = dir.path().join("bad");
        std::fs::write(with_ext(&basename, "object"), [99u8]).unwrap();
        std::fs::write(with_ext(&basename, "lowerbits"), []).unwrap();
        let err = MappedEliasFanoMonotone::load(&basename).unwrap_err();
        assert!(matches!(err, EfError::Format { .. }));
    }
}
