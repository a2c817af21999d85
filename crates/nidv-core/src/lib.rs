//! # nidv-core — Foundational Types for the National ID Validator
//!
//! This crate is the leaf of the workspace DAG. It owns the pure,
//! deterministic half of the system: the governorate code table and the
//! decoder that turns a 14-digit national identity number into structured
//! attributes or a specific validation failure.
//!
//! ## Key Design Principles
//!
//! 1. **Fail-fast decoding.** Checks run in a fixed order and the first
//!    failing check determines the reported [`ValidationError`]. No partial
//!    results are ever returned.
//!
//! 2. **Pure functions.** [`decode_at()`] takes the reference date as an
//!    argument, performs no I/O and holds no state, so it is safe to call
//!    from any number of request tasks without synchronization.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with seconds
//!    precision for every persisted record.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nidv-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod governorate;
pub mod national_id;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{NidvError, ValidationError};
pub use governorate::{governorate_name, GOVERNORATES, FOREIGN_CODE};
pub use national_id::{decode, decode_at, DecodedIdentity, Gender, NATIONAL_ID_LENGTH};
pub use temporal::Timestamp;
