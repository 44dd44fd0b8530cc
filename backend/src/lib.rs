//! Mercado: a marketplace backend for buying and selling digital files.
//!
//! The crate follows a ports-and-adapters layout: [`domain`] owns the
//! entities, rules, and ports; [`inbound`] exposes them over HTTP;
//! [`outbound`] implements the ports with PostgreSQL, the filesystem,
//! bcrypt, JWT, and SMTP.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
