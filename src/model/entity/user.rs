use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{
    ModelManager, error::DatabaseError, error::DatabaseResult,
    repo::{CrudRepository, ListRepository},
};

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: uuid::Uuid,
    username: String,
    #[serde(skip)]
    password_hash: String,
    role: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UserEntityCreateUpdate {
    pub username: String,
    pub password_hash: String,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }
}

#[async_trait]
impl CrudRepository for UserEntity {
    type Input = UserEntityCreateUpdate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        let role = UserRole::User.to_string();
        let created = sqlx::query_as(
            "INSERT INTO users (id, username, password_hash, role) VALUES ($1,$2,$3,$4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&role)
        .fetch_one(mm.executor())
        .await
        .map_err(|e| {
            DatabaseError::from(e).on_unique(DatabaseError::Conflict("username is already taken"))
        })?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreateUpdate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET username = $1 WHERE id = $2")
            .bind(&data.username)
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(|e| {
                DatabaseError::from(e)
                    .on_unique(DatabaseError::Conflict("username is already taken"))
            })?;

        self.username = data.username;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(|e| {
                DatabaseError::from(e).on_foreign_key(DatabaseError::Conflict(
                    "user still teaches courses, holds memberships or owns categories",
                ))
            })?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl ListRepository for UserEntity {
    type Filter = ();

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _filter: &(),
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY username LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _filter: &(),
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for UserEntity {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.id) // owners of users are themselves
    }
}

impl UserEntity {
    pub async fn find_by_username(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        username: &str,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(mm.executor())
                .await,
        )
    }

    /// Promotes or demotes an account. Only reachable from admin tooling.
    pub async fn set_role(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        role: UserRole,
    ) -> DatabaseResult<Self> {
        let role = role.to_string();
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(&role)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.role = role;
        Ok(self)
    }
}
