//! Lookup-table reads and administration.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::port_errors::{admin_required, map_catalog_error};
use crate::domain::ports::{CatalogDeletion, CatalogRepository, Catalogs};
use crate::domain::{Actor, CatalogEntry, CatalogId, CatalogKind, CatalogName, Error};

fn entry_not_found(kind: CatalogKind, id: CatalogId) -> Error {
    Error::not_found(format!("{kind} {id} not found"))
}

fn parse_name(kind: CatalogKind, raw: &str) -> Result<CatalogName, Error> {
    CatalogName::parse(kind, raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "field": "nombre" }))
    })
}

/// Service implementing the [`Catalogs`] driving port.
pub struct CatalogService<C> {
    catalogs: Arc<C>,
}

impl<C> CatalogService<C> {
    /// Create a service backed by the catalog repository.
    pub fn new(catalogs: Arc<C>) -> Self {
        Self { catalogs }
    }
}

#[async_trait]
impl<C> Catalogs for CatalogService<C>
where
    C: CatalogRepository,
{
    async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, Error> {
        self.catalogs.list(kind).await.map_err(map_catalog_error)
    }

    async fn get(&self, kind: CatalogKind, id: CatalogId) -> Result<CatalogEntry, Error> {
        self.catalogs
            .find(kind, id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| entry_not_found(kind, id))
    }

    async fn create(
        &self,
        actor: Actor,
        kind: CatalogKind,
        name: String,
    ) -> Result<CatalogEntry, Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        let name = parse_name(kind, &name)?;
        let entry = self
            .catalogs
            .create(kind, &name)
            .await
            .map_err(map_catalog_error)?;
        info!(catalog = %kind, id = %entry.id, "catalog entry created");
        Ok(entry)
    }

    async fn rename(
        &self,
        actor: Actor,
        kind: CatalogKind,
        id: CatalogId,
        name: String,
    ) -> Result<CatalogEntry, Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        if kind.is_name_locked(id) {
            return Err(Error::conflict(format!(
                "{kind} {id} is a system entry and cannot be renamed"
            )));
        }
        let name = parse_name(kind, &name)?;
        self.catalogs
            .rename(kind, id, &name)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(|| entry_not_found(kind, id))
    }

    async fn delete(&self, actor: Actor, kind: CatalogKind, id: CatalogId) -> Result<(), Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        if kind.is_protected(id) {
            return Err(Error::conflict(format!(
                "{kind} {id} is a system entry and cannot be deleted"
            )));
        }
        match self
            .catalogs
            .delete_unreferenced(kind, id)
            .await
            .map_err(map_catalog_error)?
        {
            CatalogDeletion::Deleted => {
                info!(catalog = %kind, %id, "catalog entry deleted");
                Ok(())
            }
            CatalogDeletion::NotFound => Err(entry_not_found(kind, id)),
            CatalogDeletion::Referenced { count } => Err(Error::conflict(format!(
                "{kind} {id} is still in use"
            ))
            .with_details(json!({ "references": count }))),
        }
    }
}
