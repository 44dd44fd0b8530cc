//! Port for the six lookup tables behind the catalog endpoints.

use async_trait::async_trait;

use crate::domain::{CatalogEntry, CatalogId, CatalogKind, CatalogName};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog repository adapters.
    pub enum CatalogRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "catalog repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "catalog repository query failed: {message}",
        /// Another row of the same table already uses the name.
        DuplicateName { name: String } => "catalog name already exists: {name}",
    }
}

/// Outcome of a guarded catalog delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogDeletion {
    /// The row was removed.
    Deleted,
    /// No row has the id.
    NotFound,
    /// Rows of other tables still point at it; nothing was removed.
    Referenced {
        /// Number of referencing rows found.
        count: i64,
    },
}

/// Port for reading and writing lookup tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All rows of a table ordered by name.
    async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, CatalogRepositoryError>;

    /// One row by id.
    async fn find(
        &self,
        kind: CatalogKind,
        id: CatalogId,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError>;

    /// One row by exact name.
    async fn find_by_name(
        &self,
        kind: CatalogKind,
        name: &str,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError>;

    /// Insert a row.
    async fn create(
        &self,
        kind: CatalogKind,
        name: &CatalogName,
    ) -> Result<CatalogEntry, CatalogRepositoryError>;

    /// Rename a row; `None` when the id is unknown.
    async fn rename(
        &self,
        kind: CatalogKind,
        id: CatalogId,
        name: &CatalogName,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError>;

    /// Delete a row unless other tables reference it.
    ///
    /// The reference count and the delete run in one transaction holding a
    /// lock on the row, so a concurrent insert cannot slip in between.
    async fn delete_unreferenced(
        &self,
        kind: CatalogKind,
        id: CatalogId,
    ) -> Result<CatalogDeletion, CatalogRepositoryError>;
}
