//! Aggregate counts derived at read time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{DatabaseResult, ModelManager};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserStats {
    pub courses_as_student: i64,
    pub courses_created: i64,
    pub comments_written: i64,
    pub contents_completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseStats {
    pub members_count: i64,
    pub contents_count: i64,
    pub comments_count: i64,
}

async fn count_by(mm: &ModelManager, sql: &'static str, id: Uuid) -> DatabaseResult<i64> {
    let count: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(mm.executor()).await?;
    Ok(count)
}

impl UserStats {
    pub async fn for_user(mm: &ModelManager, user_id: Uuid) -> DatabaseResult<Self> {
        let (courses_as_student, courses_created, comments_written, contents_completed) = tokio::try_join!(
            count_by(
                mm,
                "SELECT COUNT(*) FROM course_members WHERE user_id = $1 AND role = 'student'",
                user_id
            ),
            count_by(mm, "SELECT COUNT(*) FROM courses WHERE teacher_id = $1", user_id),
            count_by(
                mm,
                r#"
                SELECT COUNT(*) FROM comments cm
                JOIN course_members m ON m.id = cm.member_id
                WHERE m.user_id = $1
                "#,
                user_id
            ),
            count_by(
                mm,
                "SELECT COUNT(*) FROM content_completions WHERE user_id = $1",
                user_id
            ),
        )?;

        Ok(Self {
            courses_as_student,
            courses_created,
            comments_written,
            contents_completed,
        })
    }
}

impl CourseStats {
    pub async fn for_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Self> {
        let (members_count, contents_count, comments_count) = tokio::try_join!(
            count_by(
                mm,
                "SELECT COUNT(*) FROM course_members WHERE course_id = $1",
                course_id
            ),
            count_by(
                mm,
                "SELECT COUNT(*) FROM course_contents WHERE course_id = $1",
                course_id
            ),
            count_by(
                mm,
                r#"
                SELECT COUNT(*) FROM comments cm
                JOIN course_contents cc ON cc.id = cm.content_id
                WHERE cc.course_id = $1
                "#,
                course_id
            ),
        )?;

        Ok(Self {
            members_count,
            contents_count,
            comments_count,
        })
    }
}
