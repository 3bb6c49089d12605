use uuid::Uuid;

use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Resources whose mutations are restricted to a single user (plus admins).
#[async_trait::async_trait]
pub trait HasOwner {
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid>;
}

/// Whether `ctx` may act on `resource` as its owner.
pub async fn is_owner<T: HasOwner + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<bool> {
    // admin can manage all resources
    if ctx.user_role() == UserRole::Admin {
        return Ok(true);
    }

    let actual_owner = resource.get_owner_id(mm, ctx).await?;
    Ok(actual_owner == ctx.user_id())
}

pub async fn check_access<T: HasOwner + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<()> {
    if is_owner(mm, ctx, resource).await? {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
