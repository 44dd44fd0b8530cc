//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **storage**: uploaded files on the local filesystem via `cap-std`
//! - **security**: bcrypt password hashing and HS256 bearer tokens
//! - **mail**: SMTP welcome messages via `lettre`
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod mail;
pub mod persistence;
pub mod security;
pub mod storage;
