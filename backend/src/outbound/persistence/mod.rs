//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Ownership and role rules stay in the domain services.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Row-level locking**: guarded deletes and cover changes lock the rows
//!   they inspect with `SELECT ... FOR UPDATE` inside one transaction.
//!
//! # Example
//!
//! ```ignore
//! use mercado::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/mercado")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_catalog_repository;
mod diesel_image_repository;
mod diesel_product_repository;
mod diesel_transaction_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalog_repository::DieselCatalogRepository;
pub use diesel_image_repository::DieselImageRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_transaction_repository::DieselTransactionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
