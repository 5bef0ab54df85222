/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Owned bit and bit-field storage: the flat [`BitVec`]/[`BitFieldVec`]
//! pair used by every in-memory structure, and their two-level `*Big`
//! counterparts used by [`crate::dict::EliasFanoBigMonotone`].

pub mod big;
pub mod bit_field_vec;
pub mod bit_vec;

pub use big::{BitFieldVecBig, BitVecBig};
pub use bit_field_vec::BitFieldVec;
pub use bit_vec::{BitVec, CountBitVec};
