use std::str::FromStr;

use crate::model::access::HasOwner;
use crate::model::enrollment;
use crate::model::repo::{ResourceTyped, optional};
use crate::model::{ModelManager, error::DatabaseError, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    #[default]
    Student,
    Assistant,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for MemberRole {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "assistant" => Ok(Self::Assistant),
            _ => Err(DatabaseError::Invalid("unknown member role")),
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct CourseMember {
    id: Uuid,
    course_id: Uuid,
    user_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
}

impl ResourceTyped for CourseMember {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::CourseMember
    }
}

impl CourseMember {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> MemberRole {
        self.role.parse().unwrap_or_default()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseMemberCreate {
    pub course_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub role: MemberRole,
}

impl CourseMemberCreate {
    pub fn new(course_id: Uuid, user_id: Uuid) -> Self {
        Self {
            course_id,
            user_id,
            role: MemberRole::Student,
        }
    }
}

#[async_trait]
impl CrudRepository for CourseMember {
    type Input = CourseMemberCreate;
    type Id = Uuid;

    /// Goes through the capacity-checked enrollment path.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseMemberCreate,
    ) -> DatabaseResult<Self> {
        enrollment::enroll(mm, data.course_id, data.user_id, data.role).await
    }

    /// Only the role may change; moving a member to another course means re-enrolling.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseMemberCreate,
    ) -> DatabaseResult<Self> {
        if data.course_id != self.course_id || data.user_id != self.user_id {
            return Err(DatabaseError::Invalid("membership course and user are fixed"));
        }

        sqlx::query("UPDATE course_members SET role = $1 WHERE id = $2")
            .bind(data.role.as_str())
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.role = data.role.to_string();
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM course_members WHERE id = $1")
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
            sqlx::query_as("SELECT * FROM course_members WHERE id = $1")
                .bind(id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

impl CourseMember {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        role: Option<MemberRole>,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM course_members
            WHERE course_id = $1 AND ($2::text IS NULL OR role = $2)
            ORDER BY created_at
            "#,
        )
        .bind(course_id)
        .bind(role.map(|r| r.as_str()))
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn find_by_course_and_user(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        optional(
            sqlx::query_as("SELECT * FROM course_members WHERE course_id = $1 AND user_id = $2")
                .bind(course_id)
                .bind(user_id)
                .fetch_one(mm.executor())
                .await,
        )
    }
}

/// Memberships are managed by the course teacher.
#[async_trait]
impl HasOwner for CourseMember {
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
