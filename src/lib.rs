//! # PackDB - Struct-of-Arrays Record Storage
//!
//! PackDB is an in-process storage engine for fixed-shape records packed
//! into flat 32-bit-word buffers. Each record type is laid out as a
//! bit-packed tuple of integer, boolean, reference, and string fields,
//! stored contiguously in one growable buffer, and addressed by integer
//! offsets ("handles") instead of object pointers. The result is a compact,
//! cache-friendly in-memory database core with persistence and a stable
//! radix sort that operates directly on the stores.
//!
//! ## Quick Start
//!
//! ```ignore
//! use packdb::{flat_struct, FlatArray, FlatDb};
//!
//! flat_struct! {
//!     pub struct Word {
//!         pub frequency: int,
//!         pub keyword: bool,
//!         pub text: str,
//!     }
//! }
//!
//! let (layout, fields) = WordFields::build()?;
//! let mut db = FlatDb::new();
//! let words = db.create_array(&layout)?;
//!
//! let at = words.push();
//! fields.frequency.set(at, words, 42);
//! db.save_all("./corpus.db".as_ref())?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------+
//! |              FlatDb (store container)             |
//! |   one FlatArray per record type + string pool     |
//! +-------------------------+-------------------------+
//! |  field descriptors      |  counting/radix sort    |
//! |  (typed get/set views)  |  (operates on stores)   |
//! +-------------------------+-------------------------+
//! |            FlatArray (record store)               |
//! |       handles, ranges, hand-off, save/load        |
//! +---------------------------------------------------+
//! |          WordBuffer (flat u32 storage)            |
//! +---------------------------------------------------+
//! ```
//!
//! ## Module Overview
//!
//! - [`layout`]: bit-packing allocator and sealed record layouts
//! - [`fields`]: typed field descriptors, range views, sentinel closing
//! - [`handle`]: phantom-typed handles and handle ranges
//! - [`store`]: record stores and the owning container with persistence
//! - [`strings`]: staging string pool with stable offsets and interning
//! - [`sort`]: adaptive multi-pass stable counting sort
//! - [`encoding`]: varint length prefixes for the string pool
//! - [`memory`]: the flat word buffer under every store
//!
//! ## Design Constraints
//!
//! Single-threaded and synchronous: no internal locking, no blocking, every
//! operation bounded and CPU-bound. Handles are raw offsets with no validity
//! tracking: using a handle against the wrong store is a caller bug the
//! engine does not detect (the phantom type parameter catches cross-*type*
//! misuse at compile time). Buffer growth may reallocate; handles stay valid
//! across growth precisely because they are offsets, not addresses.

#[macro_use]
mod macros;

pub mod config;
pub mod encoding;
pub mod error;
pub mod fields;
pub mod handle;
pub mod layout;
pub mod memory;
pub mod sort;
pub mod store;
pub mod strings;

pub use error::StoreError;
pub use fields::{
    BoolField, Field, IntField, IntPartField, RangeField, RefField, RefPartField, SentinelField,
    StrField, StrPartField,
};
pub use handle::{Ref, RefIter, RefRange};
pub use layout::{FlatStruct, Layout, LayoutBuilder};
pub use sort::{sort_in_place, sort_to, sort_with_index, PassCount};
pub use store::{FlatArray, FlatDb, FlatDbBuilder};
pub use strings::{Distinct, FlatStr, StrRef, StringPool, Strings};
