//! Foundation utilities shared by every vibesafe crate.
//!
//! Provides the error taxonomy, exit code mapping, atomic filesystem writes,
//! unit-id sanitization, and structured logging setup that the rest of the
//! pipeline (extraction, hashing, templating, provider calls, validation,
//! storage, verification, loading) all build on.

pub mod atomic_write;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod paths;
pub mod unit_id;
