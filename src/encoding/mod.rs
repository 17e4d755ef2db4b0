//! # Binary Encoding Primitives
//!
//! Length prefixes in the persisted string pool are continuation-bit varints;
//! this module owns that encoding. Record stores themselves need no framing:
//! they persist as bare little-endian word streams (see
//! [`crate::store::FlatArray::save`]).

pub mod varint;

pub use varint::{decode_varint, encode_varint, varint_len};
