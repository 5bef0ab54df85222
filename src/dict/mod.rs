/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Succinct integer-sequence structures built on Elias–Fano encoding.

```
use effano::dict::elias_fano_monotone::EliasFanoMonotoneBuilder;

let mut builder = EliasFanoMonotoneBuilder::new(5, 12);
for v in [3u64, 5, 5, 9, 11] {
    builder.push(v).unwrap();
}
let ef = builder.build().unwrap();
assert_eq!(ef.get(0), 3);
assert_eq!(ef.get(4), 11);

// Enriching a plain monotone sequence with successor/predecessor
// queries follows the crate's usual `ConvertTo` upgrade pattern.
use effano::traits::ConvertTo;
use effano::dict::EliasFanoIndexedMonotone;
let indexed: EliasFanoIndexedMonotone = ef.convert_to().unwrap();
assert_eq!(indexed.successor(6), Some(9));
```

 */

pub mod elias_fano_big;
pub mod elias_fano_indexed;
pub mod elias_fano_monotone;
pub mod elias_fano_non_decreasing;
pub mod elias_fano_prefix_sum;
#[cfg(feature = "mmap")]
pub mod mapped_elias_fano;

pub use elias_fano_big::EliasFanoBigMonotone;
pub use elias_fano_indexed::EliasFanoIndexedMonotone;
pub use elias_fano_monotone::{DefaultEliasFanoMonotone, EliasFanoMonotone, EliasFanoMonotoneBuilder};
pub use elias_fano_non_decreasing::EliasFanoNonDecreasing;
pub use elias_fano_prefix_sum::EliasFanoPrefixSum;
#[cfg(feature = "mmap")]
pub use mapped_elias_fano::MappedEliasFanoMonotone;
