//! Shared helpers for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the embedded cluster bootstrap and HTTP plumbing live here rather than
//! being repeated per suite.

pub mod cluster;
pub mod http;

pub use cluster::database_or_skip;

