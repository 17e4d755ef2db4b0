//! # Counting / Radix Sort
//!
//! A stable counting sort that operates directly on record stores: keys come
//! from a caller-supplied extractor, records move via a caller-supplied
//! mapper, and the bucket table is itself a one-int record store. When the
//! key space is large relative to the record count, the sort splits into two
//! or three passes over bit-chunks of the key, trading extra linear passes
//! for a much smaller peak bucket table.
//!
//! ## Stability
//!
//! Each pass scatters in *reverse* source order into bucket-end pointers
//! that are decremented before every write, so equal keys keep their
//! original relative order. Multi-pass splitting sorts low bits first;
//! because every pass is stable, the composition orders by the full key.

pub mod radix;

pub use radix::{sort_in_place, sort_to, sort_with_index, PassCount};
