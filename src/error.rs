//! # Error Taxonomy
//!
//! All failures in this crate signal programmer error in a schema definition,
//! miswired container setup, or corrupt persisted state. None are recoverable
//! at runtime: callers are expected to fail fast rather than attempt partial
//! recovery.
//!
//! Fallible operations return [`eyre::Result`]; the typed variant travels
//! inside the report, so callers that need to branch on the failure class can
//! downcast:
//!
//! ```ignore
//! match report.downcast_ref::<StoreError>() {
//!     Some(StoreError::DuplicateStoreRequest { type_name }) => ...,
//!     _ => ...,
//! }
//! ```

use thiserror::Error;

/// Failure classes for schema construction, container wiring, and persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A full-word field was requested while the layout's bit cursor was
    /// mid-word.
    #[error("full-word field requested at bit {bit_size}; the cursor must be word-aligned")]
    MisalignedField { bit_size: u32 },

    /// A part field was requested with more bits than remain in the current
    /// word. Part fields never straddle a word boundary.
    #[error("part field of {bits} bits exceeds the {remaining} bits left in the current word")]
    FieldTooLarge { bits: u32, remaining: u32 },

    /// A container was asked to create a second store for a record type it
    /// already owns.
    #[error("store for record type `{type_name}` already exists in this container")]
    DuplicateStoreRequest { type_name: &'static str },

    /// A store lookup by record type failed. Raised by typed accessors and by
    /// range finalization when a referenced record type has no store.
    #[error("no store registered for record type `{type_name}`")]
    UnknownReferencedStore { type_name: &'static str },

    /// A load encountered a truncated or inconsistent byte stream.
    #[error("malformed persisted data: {reason}")]
    MalformedPersistedData { reason: String },
}
