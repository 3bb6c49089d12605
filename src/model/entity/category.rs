use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, error::DatabaseError, error::DatabaseResult,
    repo::{CrudRepository, ListRepository},
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const CATEGORY_NAME_MAX_LEN: usize = 255;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Category {
    id: Uuid,
    name: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for Category {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Category
    }
}

impl Category {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The creator is always the acting user.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CategoryCreate {
    pub name: String,
}

impl CategoryCreate {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("category name must not be empty");
        }
        if name.chars().count() > CATEGORY_NAME_MAX_LEN {
            return Err("category name must not exceed 255 characters");
        }
        Ok(())
    }
}

fn name_taken(e: sqlx::Error) -> DatabaseError {
    DatabaseError::from(e).on_unique(DatabaseError::Conflict("category name is already taken"))
}

#[async_trait]
impl CrudRepository for Category {
    type Input = CategoryCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CategoryCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO categories (id, name, created_by) VALUES ($1,$2,$3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await
        .map_err(name_taken)?;

        Ok(created)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CategoryCreate,
    ) -> DatabaseResult<Self> {
        let name = data.name.trim().to_string();
        sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
            .bind(&name)
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(name_taken)?;

        self.name = name;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        // courses drop the tag through ON DELETE SET NULL
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM categories WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl ListRepository for Category {
    type Filter = ();

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _filter: &(),
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM categories ORDER BY name LIMIT $1 OFFSET $2")
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
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Category {
    pub async fn find_by_name(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        name: &str,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM categories WHERE name = $1")
                .bind(name.trim())
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl HasOwner for Category {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.created_by)
    }
}
