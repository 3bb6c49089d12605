use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, ResourceType, Scheduled, VisibilityWindow, error::DatabaseError,
    error::DatabaseResult,
    repo::{CrudRepository, ListRepository},
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Announcement {
    id: Uuid,
    course_id: Uuid,
    title: String,
    content: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for Announcement {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Announcement
    }
}

impl Announcement {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_by(&self) -> Uuid {
        self.created_by
    }
}

impl Scheduled for Announcement {
    fn window(&self) -> VisibilityWindow {
        VisibilityWindow::new(self.start_date, self.end_date)
    }

    fn course_id(&self) -> Uuid {
        self.course_id
    }
}

/// Announcement listing filters.
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnnouncementFilter {
    pub course_id: Option<Uuid>,
}

/// `created_by` is never taken from input, it is the acting user.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AnnouncementCreate {
    pub course_id: Uuid,
    pub title: String,
    pub content: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl AnnouncementCreate {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("announcement title must not be empty");
        }
        if !VisibilityWindow::new(self.start_date, self.end_date).is_valid() {
            return Err("start_date must not be after end_date");
        }
        Ok(())
    }
}

#[async_trait]
impl CrudRepository for Announcement {
    type Input = AnnouncementCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: AnnouncementCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO announcements (id, course_id, title, content, start_date, end_date, created_by)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(data.title.trim())
        .bind(&data.content)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await
        .map_err(|e| {
            DatabaseError::from(e).on_foreign_key(DatabaseError::NotFound(ResourceType::Course))
        })?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AnnouncementCreate,
    ) -> DatabaseResult<Self> {
        if data.course_id != self.course_id {
            return Err(DatabaseError::Invalid("announcement cannot move to another course"));
        }

        let updated = sqlx::query_as(
            r#"
            UPDATE announcements
            SET title = $1, content = $2, start_date = $3, end_date = $4, updated_at = now()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(&data.content)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM announcements WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM announcements WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

// Admins see everything. Everybody else sees announcements inside their
// window, plus the ones of courses they teach or wrote themselves.
#[async_trait]
impl ListRepository for Announcement {
    type Filter = AnnouncementFilter;

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &AnnouncementFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT a.* FROM announcements a
            JOIN courses c ON c.id = a.course_id
            WHERE ($1::uuid IS NULL OR a.course_id = $1)
              AND (
                $2
                OR c.teacher_id = $3
                OR a.created_by = $3
                OR ((a.start_date IS NULL OR a.start_date <= $4)
                    AND (a.end_date IS NULL OR a.end_date >= $4))
              )
            ORDER BY a.created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.course_id)
        .bind(actor.is_admin())
        .bind(actor.user_id())
        .bind(Utc::now())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &AnnouncementFilter,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM announcements a
            JOIN courses c ON c.id = a.course_id
            WHERE ($1::uuid IS NULL OR a.course_id = $1)
              AND (
                $2
                OR c.teacher_id = $3
                OR a.created_by = $3
                OR ((a.start_date IS NULL OR a.start_date <= $4)
                    AND (a.end_date IS NULL OR a.end_date >= $4))
              )
            "#,
        )
        .bind(filter.course_id)
        .bind(actor.is_admin())
        .bind(actor.user_id())
        .bind(Utc::now())
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }
}

impl Announcement {
    pub async fn visible_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Self>> {
        let all: Vec<Self> = sqlx::query_as(
            r#"
            SELECT * FROM announcements
            WHERE course_id = $1
            ORDER BY start_date DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(all
            .into_iter()
            .filter(|a| a.window().is_visible_at(now))
            .collect())
    }
}

#[async_trait]
impl HasOwner for Announcement {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.created_by)
    }
}
