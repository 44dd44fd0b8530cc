//! PostgreSQL-backed `CatalogRepository` covering the six lookup tables.
//!
//! Every table has the same `(id, nombre)` shape, so one macro expands each
//! query once per table. Deletion locks the row, counts the rows that refer
//! to it, and only deletes when nothing does.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{CatalogDeletion, CatalogRepository, CatalogRepositoryError};
use crate::domain::{CatalogEntry, CatalogId, CatalogKind, CatalogName};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error, unique_violation};
use super::pool::{DbPool, PoolError};
use super::schema;

/// Expand `$body` for the table behind `$kind`, binding the table, its id
/// column, and optionally its `nombre` column.
macro_rules! with_catalog_table {
    ($kind:expr, |$table:ident, $id:ident $(, $name:ident)?| $body:expr) => {
        match $kind {
            CatalogKind::Category => {
                use schema::categoria_archivo::{table as $table, id_categoria as $id $(, nombre as $name)?};
                $body
            }
            CatalogKind::Extension => {
                use schema::extension_archivo::{table as $table, id_extension as $id $(, nombre as $name)?};
                $body
            }
            CatalogKind::Gender => {
                use schema::genero_usuario::{table as $table, id_genero as $id $(, nombre as $name)?};
                $body
            }
            CatalogKind::PaymentMethod => {
                use schema::metodos_pago::{table as $table, id_metodo_pago as $id $(, nombre as $name)?};
                $body
            }
            CatalogKind::UserType => {
                use schema::tipo_usuarios::{table as $table, id_tipo_usuario as $id $(, nombre as $name)?};
                $body
            }
            CatalogKind::TransactionStatus => {
                use schema::estado_transaccion::{table as $table, id_estado as $id $(, nombre as $name)?};
                $body
            }
        }
    };
}

/// Diesel-backed implementation of the `CatalogRepository` port.
#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogRepositoryError {
    map_basic_pool_error(error, |message| {
        CatalogRepositoryError::connection(message)
    })
}

fn map_diesel_error(error: diesel::result::Error) -> CatalogRepositoryError {
    map_basic_diesel_error(
        error,
        CatalogRepositoryError::query,
        CatalogRepositoryError::connection,
    )
}

fn map_write_error(error: diesel::result::Error, name: &CatalogName) -> CatalogRepositoryError {
    if unique_violation(&error).is_some() {
        return CatalogRepositoryError::duplicate_name(name.as_str());
    }
    map_diesel_error(error)
}

fn to_entry((id, name): (i32, String)) -> CatalogEntry {
    CatalogEntry::new(CatalogId::new(id), name)
}

/// Count rows in other tables that point at a lookup row.
async fn count_references(
    conn: &mut AsyncPgConnection,
    kind: CatalogKind,
    id: i32,
) -> QueryResult<i64> {
    use schema::{archivos, transacciones, usuarios};

    match kind {
        CatalogKind::Category => {
            archivos::table
                .filter(archivos::id_categoria.eq(id))
                .count()
                .get_result(conn)
                .await
        }
        CatalogKind::Extension => {
            archivos::table
                .filter(archivos::id_extension.eq(id))
                .count()
                .get_result(conn)
                .await
        }
        CatalogKind::Gender => {
            usuarios::table
                .filter(usuarios::id_genero.eq(id))
                .count()
                .get_result(conn)
                .await
        }
        CatalogKind::UserType => {
            usuarios::table
                .filter(usuarios::id_tipo_usuario.eq(id))
                .count()
                .get_result(conn)
                .await
        }
        CatalogKind::PaymentMethod => {
            transacciones::table
                .filter(transacciones::id_metodo_pago.eq(id))
                .count()
                .get_result(conn)
                .await
        }
        CatalogKind::TransactionStatus => {
            transacciones::table
                .filter(transacciones::id_estado.eq(id))
                .count()
                .get_result(conn)
                .await
        }
    }
}

#[async_trait]
impl CatalogRepository for DieselCatalogRepository {
    async fn list(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i32, String)> = with_catalog_table!(kind, |table, id_col, name_col| {
            table
                .select((id_col, name_col))
                .order_by(id_col.asc())
                .load(&mut conn)
                .await
        })
        .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(to_entry).collect())
    }

    async fn find(
        &self,
        kind: CatalogKind,
        id: CatalogId,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(i32, String)> = with_catalog_table!(kind, |table, id_col, name_col| {
            table
                .filter(id_col.eq(id.get()))
                .select((id_col, name_col))
                .first(&mut conn)
                .await
                .optional()
        })
        .map_err(map_diesel_error)?;
        Ok(row.map(to_entry))
    }

    async fn find_by_name(
        &self,
        kind: CatalogKind,
        name: &str,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(i32, String)> = with_catalog_table!(kind, |table, id_col, name_col| {
            table
                .filter(name_col.eq(name))
                .select((id_col, name_col))
                .first(&mut conn)
                .await
                .optional()
        })
        .map_err(map_diesel_error)?;
        Ok(row.map(to_entry))
    }

    async fn create(
        &self,
        kind: CatalogKind,
        name: &CatalogName,
    ) -> Result<CatalogEntry, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: (i32, String) = with_catalog_table!(kind, |table, id_col, name_col| {
            diesel::insert_into(table)
                .values(name_col.eq(name.as_str()))
                .returning((id_col, name_col))
                .get_result(&mut conn)
                .await
        })
        .map_err(|error| map_write_error(error, name))?;
        Ok(to_entry(row))
    }

    async fn rename(
        &self,
        kind: CatalogKind,
        id: CatalogId,
        name: &CatalogName,
    ) -> Result<Option<CatalogEntry>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(i32, String)> = with_catalog_table!(kind, |table, id_col, name_col| {
            diesel::update(table.filter(id_col.eq(id.get())))
                .set(name_col.eq(name.as_str()))
                .returning((id_col, name_col))
                .get_result(&mut conn)
                .await
                .optional()
        })
        .map_err(|error| map_write_error(error, name))?;
        Ok(row.map(to_entry))
    }

    async fn delete_unreferenced(
        &self,
        kind: CatalogKind,
        id: CatalogId,
    ) -> Result<CatalogDeletion, CatalogRepositoryError> {
        let raw = id.get();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let locked: Option<i32> = with_catalog_table!(kind, |table, id_col| {
                    table
                        .filter(id_col.eq(raw))
                        .select(id_col)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()
                })?;
                if locked.is_none() {
                    return Ok(CatalogDeletion::NotFound);
                }

                let count = count_references(conn, kind, raw).await?;
                if count > 0 {
                    return Ok(CatalogDeletion::Referenced { count });
                }

                with_catalog_table!(kind, |table, id_col| {
                    diesel::delete(table.filter(id_col.eq(raw)))
                        .execute(conn)
                        .await
                })?;
                Ok(CatalogDeletion::Deleted)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
