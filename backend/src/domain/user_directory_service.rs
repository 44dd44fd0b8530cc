//! User administration and self-service profile maintenance.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::info;

use crate::domain::port_errors::{
    admin_required, map_catalog_error, map_hash_error, map_user_error,
};
use crate::domain::ports::{
    CatalogRepository, PasswordChange, PasswordHasher, UserDeletion, UserDirectory,
    UserRepository,
};
use crate::domain::{Actor, CatalogKind, Error, User, UserChanges, UserFilter, UserId, UserRole};

fn user_not_found(id: UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

/// Service implementing the [`UserDirectory`] driving port.
pub struct UserDirectoryService<U, C, H> {
    users: Arc<U>,
    catalogs: Arc<C>,
    hasher: Arc<H>,
}

impl<U, C, H> UserDirectoryService<U, C, H> {
    /// Create a service from its collaborators.
    pub fn new(users: Arc<U>, catalogs: Arc<C>, hasher: Arc<H>) -> Self {
        Self {
            users,
            catalogs,
            hasher,
        }
    }
}

impl<U, C, H> UserDirectoryService<U, C, H>
where
    U: UserRepository,
    C: CatalogRepository,
    H: PasswordHasher,
{
    fn ensure_self_or_admin(actor: Actor, id: UserId) -> Result<(), Error> {
        if actor.is_self_or_admin(id) {
            Ok(())
        } else {
            Err(Error::forbidden("you may only access your own account"))
        }
    }

    fn ensure_role_change_allowed(actor: Actor, role: Option<UserRole>) -> Result<(), Error> {
        match role {
            None => Ok(()),
            Some(_) if !actor.is_admin() => Err(admin_required()),
            Some(UserRole::SuperAdmin) if actor.role != UserRole::SuperAdmin => Err(
                Error::forbidden("only a super administrator can grant that role"),
            ),
            Some(_) => Ok(()),
        }
    }

    /// Only a super administrator may modify or delete another super
    /// administrator.
    async fn ensure_target_manageable(&self, actor: Actor, id: UserId) -> Result<(), Error> {
        if actor.role == UserRole::SuperAdmin || actor.id == id {
            return Ok(());
        }
        let target = self
            .users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id))?;
        if target.role == UserRole::SuperAdmin {
            return Err(Error::forbidden(
                "only a super administrator can manage a super administrator",
            ));
        }
        Ok(())
    }

    async fn ensure_gender_exists(&self, changes: &UserChanges) -> Result<(), Error> {
        let Some(Some(gender_id)) = changes.gender_id else {
            return Ok(());
        };
        self.catalogs
            .find(CatalogKind::Gender, gender_id)
            .await
            .map_err(map_catalog_error)?
            .map(|_| ())
            .ok_or_else(|| Error::invalid_request(format!("unknown gender: {gender_id}")))
    }
}

#[async_trait]
impl<U, C, H> UserDirectory for UserDirectoryService<U, C, H>
where
    U: UserRepository,
    C: CatalogRepository,
    H: PasswordHasher,
{
    async fn list(
        &self,
        actor: Actor,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        self.users
            .list(&filter, page)
            .await
            .map_err(map_user_error)
    }

    async fn get(&self, actor: Actor, id: UserId) -> Result<User, Error> {
        Self::ensure_self_or_admin(actor, id)?;
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id))
    }

    async fn update(&self, actor: Actor, id: UserId, changes: UserChanges) -> Result<User, Error> {
        Self::ensure_self_or_admin(actor, id)?;
        Self::ensure_role_change_allowed(actor, changes.role)?;
        if changes.is_empty() {
            return Err(Error::invalid_request("no fields to update"));
        }
        self.ensure_target_manageable(actor, id).await?;
        self.ensure_gender_exists(&changes).await?;

        let user = self
            .users
            .update(id, &changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id))?;
        if let Some(role) = changes.role {
            info!(user_id = %id, %role, changed_by = %actor.id, "user role changed");
        }
        Ok(user)
    }

    async fn change_password(
        &self,
        actor: Actor,
        id: UserId,
        change: PasswordChange,
    ) -> Result<(), Error> {
        if actor.id != id {
            return Err(Error::forbidden("you may only change your own password"));
        }
        let stored = self
            .users
            .find_credentials_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id))?;
        let matches = self
            .hasher
            .verify(&change.current, &stored.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            return Err(Error::invalid_request("current password is incorrect"));
        }

        let hash = self
            .hasher
            .hash(&change.new)
            .await
            .map_err(map_hash_error)?;
        let updated = self
            .users
            .update_password_hash(id, &hash)
            .await
            .map_err(map_user_error)?;
        if !updated {
            return Err(user_not_found(id));
        }
        info!(user_id = %id, "password changed");
        Ok(())
    }

    async fn delete(&self, actor: Actor, id: UserId) -> Result<(), Error> {
        if !actor.is_admin() {
            return Err(admin_required());
        }
        if actor.id == id {
            return Err(Error::invalid_request("you cannot delete your own account"));
        }
        self.ensure_target_manageable(actor, id).await?;
        match self
            .users
            .delete_unreferenced(id)
            .await
            .map_err(map_user_error)?
        {
            UserDeletion::Deleted => {
                info!(user_id = %id, deleted_by = %actor.id, "user deleted");
                Ok(())
            }
            UserDeletion::NotFound => Err(user_not_found(id)),
            UserDeletion::Referenced {
                products,
                transactions,
            } => Err(
                Error::conflict("user still owns products or transactions").with_details(json!({
                    "archivos": products,
                    "transacciones": transactions,
                })),
            ),
        }
    }
}

#[cfg(test)]
#[path = "user_directory_service_tests.rs"]
mod tests;
