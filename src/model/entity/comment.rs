use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, ResourceType, error::DatabaseError, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Comment {
    id: Uuid,
    content_id: Uuid,
    member_id: Uuid,
    comment: String,
    is_approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for Comment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Comment
    }
}

impl Comment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content_id(&self) -> Uuid {
        self.content_id
    }

    pub fn member_id(&self) -> Uuid {
        self.member_id
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn is_approved(&self) -> bool {
        self.is_approved
    }
}

/// New comments always start unapproved.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CommentCreate {
    pub content_id: Uuid,
    pub member_id: Uuid,
    pub comment: String,
}

#[async_trait]
impl CrudRepository for Comment {
    type Input = CommentCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CommentCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO comments (id, content_id, member_id, comment, is_approved)
            VALUES ($1,$2,$3,$4,FALSE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.content_id)
        .bind(data.member_id)
        .bind(&data.comment)
        .fetch_one(mm.executor())
        .await
        .map_err(|e| {
            DatabaseError::from(e)
                .on_foreign_key(DatabaseError::NotFound(ResourceType::CourseContent))
        })?;

        Ok(created)
    }

    /// Edits the text only; approval changes go through [`Comment::moderate`].
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CommentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE comments SET comment = $1, updated_at = now() WHERE id = $2")
            .bind(&data.comment)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.comment = data.comment;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM comments WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

impl Comment {
    pub async fn moderate(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        is_approved: bool,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE comments SET is_approved = $1, updated_at = now() WHERE id = $2")
            .bind(is_approved)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        tracing::info!(comment_id = %self.id, is_approved, "comment moderated");
        self.is_approved = is_approved;
        Ok(self)
    }

    pub async fn find_by_content_and_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        content_id: Uuid,
        comment_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM comments WHERE content_id = $1 AND id = $2")
                .bind(content_id)
                .bind(comment_id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

/// Moderation belongs to the teacher of the course the comment lives in.
#[async_trait]
impl HasOwner for Comment {
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        let teacher: Uuid = sqlx::query_scalar(
            r#"
            SELECT c.teacher_id
            FROM course_contents cc
            JOIN courses c ON c.id = cc.course_id
            WHERE cc.id = $1
            "#,
        )
        .bind(self.content_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(teacher)
    }
}

// Utils

/// A comment together with its author's username.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct CommentRow {
    pub id: Uuid,
    pub content_id: Uuid,
    pub member_id: Uuid,
    pub username: String,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    /// Comments of a content in one moderation state, oldest first.
    pub async fn all_by_content(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        content_id: Uuid,
        is_approved: bool,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                cm.id,
                cm.content_id,
                cm.member_id,
                u.username,
                cm.comment,
                cm.is_approved,
                cm.created_at
            FROM comments cm
            JOIN course_members m ON m.id = cm.member_id
            JOIN users u ON u.id = m.user_id
            WHERE cm.content_id = $1 AND cm.is_approved = $2
            ORDER BY cm.created_at ASC
            "#,
        )
        .bind(content_id)
        .bind(is_approved)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
