//! # Record Stores and Their Container
//!
//! One [`FlatArray`] holds every record of one type, packed back to back in a
//! flat word buffer. A [`FlatDb`] owns one store per record type plus the
//! shared string pool, and moves the whole set to and from disk as a
//! directory of per-type files.

pub mod array;
pub mod container;

pub use array::FlatArray;
pub use container::{FlatDb, FlatDbBuilder};
