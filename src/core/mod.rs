//! In-memory record book and history filter.

/// History list filter.
pub mod filter;
/// Authoritative record book, export snapshot and store errors.
pub mod store;
