//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Registration inserts the `usuarios` row and the matching `vendedor` or
//! `cliente` extension row in one transaction. Role changes add the
//! extension row for the new role when it is missing.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use pagination::{Page, PageRequest};

use crate::domain::ports::{UserDeletion, UserPersistenceError, UserRepository};
use crate::domain::{
    CatalogId, NewUser, User, UserChanges, UserCredentials, UserFilter, UserId, UserRole,
};

use super::error_mapping::{
    contains_pattern, map_basic_diesel_error, map_basic_pool_error, row_total,
    unique_violation,
};
use super::models::{NewClientRow, NewSellerRow, NewUserRow, UserRow, UserUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::{archivos, cliente, transacciones, usuarios, vendedor};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, |message| UserPersistenceError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Map write failures, reporting `usuarios_email_key` violations as
/// duplicate emails.
fn map_write_error(error: diesel::result::Error, email: Option<&str>) -> UserPersistenceError {
    match (unique_violation(&error), email) {
        (Some(_), Some(email)) => UserPersistenceError::duplicate_email(email),
        _ => map_diesel_error(error),
    }
}

fn row_to_credentials(row: UserRow) -> Result<UserCredentials, UserPersistenceError> {
    let role = UserRole::try_from(row.id_tipo_usuario)
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
    Ok(UserCredentials {
        user: User {
            id: UserId::new(row.id_usuario),
            name: row.nombre,
            email: row.email,
            birth_date: row.fecha_nacimiento,
            registered_at: row.fecha_registro,
            role,
            gender_id: row.id_genero.map(CatalogId::new),
        },
        password_hash: row.contrasena,
    })
}

fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    row_to_credentials(row).map(|credentials| credentials.user)
}

/// Insert the extension row a role needs, ignoring rows that already exist.
async fn ensure_role_row(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    role: UserRole,
) -> QueryResult<()> {
    match role {
        UserRole::Client => {
            diesel::insert_into(cliente::table)
                .values(NewClientRow {
                    id_usuario: user_id,
                })
                .on_conflict(cliente::id_usuario)
                .do_nothing()
                .execute(conn)
                .await?;
        }
        UserRole::Seller => {
            diesel::insert_into(vendedor::table)
                .values(NewSellerRow {
                    id_usuario: user_id,
                })
                .on_conflict(vendedor::id_usuario)
                .do_nothing()
                .execute(conn)
                .await?;
        }
        UserRole::Admin | UserRole::SuperAdmin => {}
    }
    Ok(())
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            nombre: &user.name,
            email: &user.email,
            contrasena: &user.password_hash,
            fecha_nacimiento: user.birth_date,
            id_tipo_usuario: user.role.id(),
            id_genero: user.gender_id.map(CatalogId::get),
        };
        let role = user.role;

        let row = conn
            .transaction(|conn| {
                async move {
                    let row: UserRow = diesel::insert_into(usuarios::table)
                        .values(&new_row)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    ensure_role_row(conn, row.id_usuario, role).await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_write_error(error, Some(&user.email)))?;

        row_to_user(row)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        self.find_credentials_by_id(id)
            .await
            .map(|found| found.map(|credentials| credentials.user))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = usuarios::table
            .filter(usuarios::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_credentials).transpose()
    }

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<UserCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = usuarios::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_credentials).transpose()
    }

    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pattern = filter.search.as_deref().map(contains_pattern);
        let role = filter.role.map(UserRole::id);

        let filtered = || {
            let mut query: usuarios::BoxedQuery<'_, Pg> = usuarios::table.into_boxed();
            if let Some(pattern) = pattern.as_deref() {
                query = query.filter(
                    usuarios::nombre
                        .ilike(pattern.to_owned())
                        .or(usuarios::email.ilike(pattern.to_owned())),
                );
            }
            if let Some(role) = role {
                query = query.filter(usuarios::id_tipo_usuario.eq(role));
            }
            query
        };

        let total: i64 = filtered()
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<UserRow> = filtered()
            .select(UserRow::as_select())
            .order_by(usuarios::id_usuario.asc())
            .limit(page.sql_limit())
            .offset(page.offset())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let users = rows
            .into_iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()?;
        let total = row_total(total).map_err(UserPersistenceError::query)?;
        Ok(Page::new(users, total, page))
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = UserUpdate {
            nombre: changes.name.as_ref().map(|name| name.as_str()),
            email: changes.email.as_ref().map(|email| email.as_str()),
            fecha_nacimiento: changes.birth_date,
            id_tipo_usuario: changes.role.map(UserRole::id),
            id_genero: changes.gender_id.map(|gender| gender.map(CatalogId::get)),
        };
        let role = changes.role;
        let raw_id = id.get();

        let row = conn
            .transaction(|conn| {
                async move {
                    let row: Option<UserRow> = diesel::update(usuarios::table.find(raw_id))
                        .set(&update)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    if let (Some(row), Some(role)) = (row.as_ref(), role) {
                        ensure_role_row(conn, row.id_usuario, role).await?;
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| {
                map_write_error(error, changes.email.as_ref().map(|email| email.as_str()))
            })?;

        row.map(row_to_user).transpose()
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(usuarios::table.find(id.get()))
            .set(usuarios::contrasena.eq(password_hash))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_unreferenced(&self, id: UserId) -> Result<UserDeletion, UserPersistenceError> {
        let raw_id = id.get();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                let locked: Option<i32> = usuarios::table
                    .find(raw_id)
                    .select(usuarios::id_usuario)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Ok(UserDeletion::NotFound);
                }

                let products: i64 = archivos::table
                    .inner_join(vendedor::table)
                    .filter(vendedor::id_usuario.eq(raw_id))
                    .count()
                    .get_result(conn)
                    .await?;
                let transactions: i64 = transacciones::table
                    .filter(transacciones::id_usuario.eq(raw_id))
                    .count()
                    .get_result(conn)
                    .await?;
                if products > 0 || transactions > 0 {
                    return Ok(UserDeletion::Referenced {
                        products,
                        transactions,
                    });
                }

                diesel::delete(usuarios::table.find(raw_id))
                    .execute(conn)
                    .await?;
                Ok(UserDeletion::Deleted)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion and error mapping coverage.
    use super::*;
    use chrono::{TimeZone, Utc};
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    fn row(role: i32) -> UserRow {
        UserRow {
            id_usuario: 7,
            nombre: "Ana".to_owned(),
            email: "ana@example.com".to_owned(),
            contrasena: "$2b$12$hash".to_owned(),
            fecha_nacimiento: None,
            fecha_registro: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("timestamp"),
            id_tipo_usuario: role,
            id_genero: Some(2),
        }
    }

    #[rstest]
    fn rows_convert_to_credentials() {
        let credentials = row_to_credentials(row(2)).expect("valid row");
        assert_eq!(credentials.user.id, UserId::new(7));
        assert_eq!(credentials.user.role, UserRole::Seller);
        assert_eq!(credentials.user.gender_id, Some(CatalogId::new(2)));
        assert_eq!(credentials.password_hash, "$2b$12$hash");
    }

    #[rstest]
    fn unknown_role_ids_are_query_errors() {
        let error = row_to_credentials(row(42)).expect_err("unknown role");
        assert!(matches!(error, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn email_violations_map_to_duplicate_email() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_owned()),
        );
        assert_eq!(
            map_write_error(error, Some("ana@example.com")),
            UserPersistenceError::duplicate_email("ana@example.com")
        );
    }
}
