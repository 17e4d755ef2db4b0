//! # Flat Word Storage
//!
//! The storage primitive under every record store: a growable flat array of
//! 32-bit words. Record stores address into it with word offsets, which is
//! what keeps handles valid across growth: an offset survives reallocation,
//! a pointer would not.

pub mod word_buffer;

pub use word_buffer::WordBuffer;
