//! # Configuration Constants
//!
//! Central home for the crate's tunable defaults. Values that interact are
//! kept together so their relationship stays visible.

/// Initial byte capacity of a string pool's first segment.
pub const DEFAULT_STRING_POOL_CAPACITY: u32 = 4096;

/// Smallest segment the pool will allocate; growth doubles from here. Must
/// leave room for a maximal 5-byte varint prefix plus at least one byte of
/// payload.
pub const MIN_STRING_SEGMENT_CAPACITY: u32 = 16;

/// Extension of per-record-type store files inside a saved directory.
pub const RECORD_FILE_EXTENSION: &str = "rec";

/// File name of the persisted string pool inside a saved directory.
pub const STRINGS_FILE_NAME: &str = "strings.dat";
