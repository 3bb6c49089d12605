use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, ResourceType, error::DatabaseError, error::DatabaseResult,
    repo::{CrudRepository, ListRepository},
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct ContentCompletion {
    id: Uuid,
    content_id: Uuid,
    user_id: Uuid,
    completed_at: DateTime<Utc>,
}

impl ResourceTyped for ContentCompletion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::ContentCompletion
    }
}

impl ContentCompletion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content_id(&self) -> Uuid {
        self.content_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

pub struct ContentCompletionCreate {
    content_id: Uuid,
    user_id: Uuid,
}

impl ContentCompletionCreate {
    pub fn new(content_id: Uuid, user_id: Uuid) -> Self {
        Self {
            content_id,
            user_id,
        }
    }
}

fn completion_error(e: sqlx::Error) -> DatabaseError {
    DatabaseError::from(e)
        .on_unique(DatabaseError::Conflict("content is already completed"))
        .on_foreign_key(DatabaseError::NotFound(ResourceType::CourseContent))
}

#[async_trait]
impl CrudRepository for ContentCompletion {
    type Input = ContentCompletionCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ContentCompletionCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO content_completions (id, content_id, user_id)
            VALUES ($1,$2,$3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.content_id)
        .bind(data.user_id)
        .fetch_one(mm.executor())
        .await
        .map_err(completion_error)?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ContentCompletionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE content_completions SET content_id = $1, user_id = $2 WHERE id = $3")
            .bind(data.content_id)
            .bind(data.user_id)
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(completion_error)?;

        self.content_id = data.content_id;
        self.user_id = data.user_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM content_completions WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM content_completions WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl ListRepository for ContentCompletion {
    type Filter = ();

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        _filter: &(),
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM content_completions
            WHERE user_id = $1
            ORDER BY completed_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        _filter: &(),
    ) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_completions WHERE user_id = $1")
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for ContentCompletion {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.user_id)
    }
}
