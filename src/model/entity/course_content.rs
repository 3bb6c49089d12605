use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, ResourceType, Scheduled, VisibilityWindow, error::DatabaseError,
    error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseContent {
    id: Uuid,
    course_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
    description: String,
    file_attachment: Option<String>,
    scheduled_start: Option<DateTime<Utc>>,
    scheduled_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for CourseContent {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseContent
    }
}

impl CourseContent {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn file_attachment(&self) -> Option<&str> {
        self.file_attachment.as_deref()
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.window().is_visible_at(now)
    }
}

impl Scheduled for CourseContent {
    fn window(&self) -> VisibilityWindow {
        VisibilityWindow::new(self.scheduled_start, self.scheduled_end)
    }

    fn course_id(&self) -> Uuid {
        self.course_id
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseContentCreate {
    pub course_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

impl CourseContentCreate {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("content name must not be empty");
        }
        if !VisibilityWindow::new(self.scheduled_start, self.scheduled_end).is_valid() {
            return Err("scheduled_start must not be after scheduled_end");
        }
        Ok(())
    }
}

/// Rejects parents from other courses, self-parenting and cycles.
async fn check_parent(
    mm: &ModelManager,
    course_id: Uuid,
    content_id: Option<Uuid>,
    parent_id: Uuid,
) -> DatabaseResult<()> {
    if Some(parent_id) == content_id {
        return Err(DatabaseError::Invalid("content cannot be its own parent"));
    }

    let parent_course: Option<Uuid> =
        sqlx::query_scalar("SELECT course_id FROM course_contents WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(mm.executor())
            .await?;

    match parent_course {
        None => return Err(DatabaseError::NotFound(ResourceType::CourseContent)),
        Some(course) if course != course_id => {
            return Err(DatabaseError::Invalid("parent content belongs to another course"));
        }
        Some(_) => {}
    }

    let Some(content_id) = content_id else {
        return Ok(());
    };

    // walk up from the proposed parent; meeting ourselves means a cycle
    let creates_cycle: bool = sqlx::query_scalar(
        r#"
        WITH RECURSIVE ancestors AS (
            SELECT id, parent_id FROM course_contents WHERE id = $1
            UNION
            SELECT c.id, c.parent_id
            FROM course_contents c
            JOIN ancestors a ON c.id = a.parent_id
        )
        SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)
        "#,
    )
    .bind(parent_id)
    .bind(content_id)
    .fetch_one(mm.executor())
    .await?;

    if creates_cycle {
        return Err(DatabaseError::Invalid("content cannot be nested under its own descendant"));
    }
    Ok(())
}

#[async_trait]
impl CrudRepository for CourseContent {
    type Input = CourseContentCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseContentCreate,
    ) -> DatabaseResult<Self> {
        if let Some(parent_id) = data.parent_id {
            check_parent(mm, data.course_id, None, parent_id).await?;
        }

        let created = sqlx::query_as(
            r#"
            INSERT INTO course_contents
                (id, course_id, parent_id, name, description, scheduled_start, scheduled_end)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(data.parent_id)
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.scheduled_start)
        .bind(data.scheduled_end)
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
        data: CourseContentCreate,
    ) -> DatabaseResult<Self> {
        if data.course_id != self.course_id {
            return Err(DatabaseError::Invalid("content cannot move to another course"));
        }
        if let Some(parent_id) = data.parent_id {
            check_parent(mm, self.course_id, Some(self.id), parent_id).await?;
        }

        let updated = sqlx::query_as(
            r#"
            UPDATE course_contents
            SET parent_id = $1, name = $2, description = $3,
                scheduled_start = $4, scheduled_end = $5, updated_at = now()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(data.parent_id)
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.scheduled_start)
        .bind(data.scheduled_end)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM course_contents WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(|e| {
                DatabaseError::from(e)
                    .on_foreign_key(DatabaseError::Conflict("content still has child contents"))
            })?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM course_contents WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

impl CourseContent {
    /// Contents of a course that are visible at `now`, by start time.
    pub async fn visible_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Self>> {
        let all: Vec<Self> = sqlx::query_as(
            r#"
            SELECT * FROM course_contents
            WHERE course_id = $1
            ORDER BY scheduled_start ASC NULLS FIRST, created_at ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(all.into_iter().filter(|c| c.is_visible_at(now)).collect())
    }

    pub async fn set_attachment(mut self, mm: &ModelManager, path: String) -> DatabaseResult<Self> {
        sqlx::query("UPDATE course_contents SET file_attachment = $1, updated_at = now() WHERE id = $2")
            .bind(&path)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.file_attachment = Some(path);
        Ok(self)
    }
}

#[async_trait]
impl HasOwner for CourseContent {
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        let teacher: Uuid = sqlx::query_scalar("SELECT teacher_id FROM courses WHERE id = $1")
            .bind(self.course_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(teacher)
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    #[test]
    fn inverted_schedule_is_rejected() {
        let now = Utc::now();
        let data = CourseContentCreate {
            course_id: Uuid::new_v4(),
            parent_id: None,
            name: "Week 1".into(),
            description: String::new(),
            scheduled_start: Some(now),
            scheduled_end: Some(now - Duration::hours(1)),
        };
        assert!(data.validate().is_err());
    }
}
