/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Error types returned by construction and query paths.

Construction errors are rich: they carry the offending index and/or
value so callers can report a useful diagnostic. Query-time errors
(`OutOfBounds`) are minimal by design: the precondition violation itself
is the only useful fact, and the `_unchecked` family of methods elides
the check entirely.

 */

use thiserror::Error;

/// Errors produced by the structures in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EfError {
    /// The input iterator yielded a value smaller than its predecessor.
    #[error("value {value} at index {index} is smaller than the previous value {previous}")]
    OutOfOrder {
        index: usize,
        previous: u64,
        value: u64,
    },

    /// The input value is greater than or equal to the declared strict
    /// upper bound.
    #[error("value {value} at index {index} is not smaller than the upper bound {upper_bound}")]
    OutOfRange {
        index: usize,
        value: u64,
        upper_bound: u64,
    },

    /// The input iterator ended before producing the declared number of
    /// items.
    #[error("expected {expected} values but the iterator yielded only {got}")]
    Truncated { expected: usize, got: usize },

    /// The input iterator yielded more items than declared.
    #[error("expected exactly {expected} values but the iterator yielded more")]
    Overrun { expected: usize },

    /// (`EliasFanoNonDecreasing`) the input value is smaller than the
    /// declared lower bound.
    #[error("value {value} at index {index} is smaller than the declared lower bound {lower_bound}")]
    LowerBoundExceeded {
        index: usize,
        value: u64,
        lower_bound: u64,
    },

    /// A file-system error occurred while mapping or closing a dump.
    #[error("I/O error: {0}")]
    Io(String),

    /// The dump format version or metadata is inconsistent.
    #[error("format error: {reason}")]
    Format { reason: String },

    /// A safe accessor was called with an out-of-range index.
    #[error("index {index} is out of bounds for a sequence of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl From<std::io::Error> for EfError {
    fn from(e: std::io::Error) -> Self {
        EfError::Io(e.to_string())
    }
}

pub type Result<T> = core::result::Result<T, EfError>;
