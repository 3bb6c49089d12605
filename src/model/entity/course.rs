use crate::model::access::HasOwner;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{
    ModelManager, ResourceType, error::DatabaseError, error::DatabaseResult,
    repo::{CrudRepository, ListRepository},
};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const DEFAULT_MAX_STUDENTS: i32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    name: String,
    description: String,
    price: i32,
    image: Option<String>,
    teacher_id: Uuid,
    category_id: Option<Uuid>,
    max_students: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> i32 {
        self.price
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn teacher_id(&self) -> Uuid {
        self.teacher_id
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    pub fn max_students(&self) -> i32 {
        self.max_students
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i32,
    pub category_id: Option<Uuid>,
    pub max_students: Option<i32>,
    /// Honoured for admins only; everybody else teaches their own courses.
    pub teacher_id: Option<Uuid>,
}

impl CourseCreate {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("course name must not be empty");
        }
        if self.price < 0 {
            return Err("price must not be negative");
        }
        if self.max_students.is_some_and(|m| m < 0) {
            return Err("max_students must not be negative");
        }
        Ok(())
    }

    fn teacher_for(&self, actor: &AuthenticatedUser) -> Uuid {
        match (actor.user_role(), self.teacher_id) {
            (UserRole::Admin, Some(teacher)) => teacher,
            _ => actor.user_id(),
        }
    }
}

/// Course listing filters. `q` searches name, description and the teacher's username.
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilter {
    pub teacher_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub q: Option<String>,
}

impl CourseFilter {
    /// `q` as an ILIKE pattern with its wildcards escaped.
    fn pattern(&self) -> Option<String> {
        let q = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())?;
        let escaped = q
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

fn missing_reference(e: sqlx::Error) -> DatabaseError {
    let missing = match &e {
        sqlx::Error::Database(db) if db.constraint() == Some("courses_teacher_id_fkey") => {
            ResourceType::User
        }
        _ => ResourceType::Category,
    };
    DatabaseError::from(e).on_foreign_key(DatabaseError::NotFound(missing))
}

#[async_trait]
impl CrudRepository for Course {
    type Input = CourseCreate;
    type Id = Uuid;

    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO courses (id, name, description, price, teacher_id, category_id, max_students)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.price)
        .bind(data.teacher_for(actor))
        .bind(data.category_id)
        .bind(data.max_students.unwrap_or(DEFAULT_MAX_STUDENTS))
        .fetch_one(mm.executor())
        .await
        .map_err(missing_reference)?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let teacher_id = match (actor.user_role(), data.teacher_id) {
            (UserRole::Admin, Some(teacher)) => teacher,
            _ => self.teacher_id,
        };

        let updated = sqlx::query_as(
            r#"
            UPDATE courses
            SET name = $1, description = $2, price = $3, category_id = $4,
                max_students = $5, teacher_id = $6, updated_at = now()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.price)
        .bind(data.category_id)
        .bind(data.max_students.unwrap_or(self.max_students))
        .bind(teacher_id)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await
        .map_err(missing_reference)?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await
            .map_err(|e| {
                DatabaseError::from(e).on_foreign_key(DatabaseError::Conflict(
                    "course still has members or contents",
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
            sqlx::query_as("SELECT * FROM courses WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl ListRepository for Course {
    type Filter = CourseFilter;

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT c.* FROM courses c
            JOIN users t ON t.id = c.teacher_id
            WHERE ($1::uuid IS NULL OR c.teacher_id = $1)
              AND ($2::uuid IS NULL OR c.category_id = $2)
              AND ($3::text IS NULL OR c.name ILIKE $3 OR c.description ILIKE $3 OR t.username ILIKE $3)
            ORDER BY c.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.teacher_id)
        .bind(filter.category_id)
        .bind(filter.pattern())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        filter: &CourseFilter,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM courses c
            JOIN users t ON t.id = c.teacher_id
            WHERE ($1::uuid IS NULL OR c.teacher_id = $1)
              AND ($2::uuid IS NULL OR c.category_id = $2)
              AND ($3::text IS NULL OR c.name ILIKE $3 OR c.description ILIKE $3 OR t.username ILIKE $3)
            "#,
        )
        .bind(filter.teacher_id)
        .bind(filter.category_id)
        .bind(filter.pattern())
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }
}

impl Course {
    pub async fn enrolled_count(&self, mm: &ModelManager) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM course_members WHERE course_id = $1")
                .bind(self.id)
                .fetch_one(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn set_image(mut self, mm: &ModelManager, image: String) -> DatabaseResult<Self> {
        sqlx::query("UPDATE courses SET image = $1, updated_at = now() WHERE id = $2")
            .bind(&image)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.image = Some(image);
        Ok(self)
    }

    pub async fn find_by_name(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        name: &str,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM courses WHERE name = $1 ORDER BY created_at DESC LIMIT 1")
                .bind(name)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

#[async_trait]
impl HasOwner for Course {
    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Uuid> {
        Ok(self.teacher_id)
    }
}
