//! Driving port for the lookup-table endpoints.

use async_trait::async_trait;

use crate::domain::{Actor, CatalogEntry, CatalogId, CatalogKind, Error};

/// Domain use-case port for catalog reads and administration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalogs: Send + Sync {
    /// All rows of a table.
    async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, Error>;

    /// One row.
    async fn get(&self, kind: CatalogKind, id: CatalogId) -> Result<CatalogEntry, Error>;

    /// Add a row (administrators only).
    async fn create(
        &self,
        actor: Actor,
        kind: CatalogKind,
        name: String,
    ) -> Result<CatalogEntry, Error>;

    /// Rename a row (administrators only).
    async fn rename(
        &self,
        actor: Actor,
        kind: CatalogKind,
        id: CatalogId,
        name: String,
    ) -> Result<CatalogEntry, Error>;

    /// Delete an unreferenced, non-system row (administrators only).
    async fn delete(&self, actor: Actor, kind: CatalogKind, id: CatalogId) -> Result<(), Error>;
}
