//! Capacity-checked enrollment.
//!
//! Every enrollment runs in its own transaction which locks the course row
//! (`SELECT ... FOR UPDATE`) before counting members, so concurrent requests
//! against the same course are serialized and cannot overshoot `max_students`.
//! The `(course_id, user_id)` unique index backs the duplicate check.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::model::{
    DatabaseError, DatabaseResult, ModelManager, ResourceType,
    entity::{CourseMember, MemberRole},
};

/// Whether `requested` more members fit into a course with `current` members.
pub fn has_capacity(current: i64, requested: i64, max_students: i32) -> bool {
    current + requested <= i64::from(max_students)
}

fn available_slots(current: i64, max_students: i32) -> i64 {
    (i64::from(max_students) - current).max(0)
}

/// Outcome of a batch enrollment. Users that already were members are skipped.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BatchEnrollment {
    pub enrolled: Vec<CourseMember>,
    pub skipped: Vec<Uuid>,
}

async fn lock_course(conn: &mut PgConnection, course_id: Uuid) -> DatabaseResult<i32> {
    let max_students: Option<i32> =
        sqlx::query_scalar("SELECT max_students FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id)
            .fetch_optional(conn)
            .await?;

    max_students.ok_or(DatabaseError::NotFound(ResourceType::Course))
}

async fn ensure_users_exist(conn: &mut PgConnection, user_ids: &[Uuid]) -> DatabaseResult<()> {
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_one(conn)
        .await?;

    if found as usize != user_ids.len() {
        return Err(DatabaseError::NotFound(ResourceType::User));
    }
    Ok(())
}

async fn count_members(conn: &mut PgConnection, course_id: Uuid) -> DatabaseResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course_members WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

#[tracing::instrument(skip(mm))]
pub async fn enroll(
    mm: &ModelManager,
    course_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
) -> DatabaseResult<CourseMember> {
    let mut tx = mm.begin().await?;

    let max_students = lock_course(&mut tx, course_id).await?;
    ensure_users_exist(&mut tx, &[user_id]).await?;

    let already_enrolled: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM course_members WHERE course_id = $1 AND user_id = $2)",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    if already_enrolled {
        return Err(DatabaseError::AlreadyEnrolled);
    }

    let current = count_members(&mut tx, course_id).await?;
    if !has_capacity(current, 1, max_students) {
        tracing::debug!(current, max_students, "course is full");
        return Err(DatabaseError::CourseFull { max_students });
    }

    let member: CourseMember = sqlx::query_as(
        r#"
        INSERT INTO course_members (id, course_id, user_id, role)
        VALUES ($1,$2,$3,$4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| DatabaseError::from(e).on_unique(DatabaseError::AlreadyEnrolled))?;

    tx.commit().await?;
    tracing::info!(member_id = %member.id(), "user enrolled");

    Ok(member)
}

/// All-or-nothing: the whole batch is rejected unless every requested user
/// fits. Duplicate ids in `user_ids` count once.
#[tracing::instrument(skip(mm))]
pub async fn batch_enroll(
    mm: &ModelManager,
    course_id: Uuid,
    user_ids: &[Uuid],
) -> DatabaseResult<BatchEnrollment> {
    let mut seen = HashSet::with_capacity(user_ids.len());
    let requested: Vec<Uuid> = user_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

    let mut tx = mm.begin().await?;

    let max_students = lock_course(&mut tx, course_id).await?;
    ensure_users_exist(&mut tx, &requested).await?;

    let current = count_members(&mut tx, course_id).await?;
    let wanted = requested.len() as i64;
    if !has_capacity(current, wanted, max_students) {
        return Err(DatabaseError::NotEnoughSlots {
            available: available_slots(current, max_students),
            requested: wanted,
        });
    }

    let mut outcome = BatchEnrollment {
        enrolled: Vec::with_capacity(requested.len()),
        skipped: Vec::new(),
    };

    for user_id in requested {
        let member: Option<CourseMember> = sqlx::query_as(
            r#"
            INSERT INTO course_members (id, course_id, user_id, role)
            VALUES ($1,$2,$3,$4)
            ON CONFLICT (course_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(user_id)
        .bind(MemberRole::Student.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        match member {
            Some(member) => outcome.enrolled.push(member),
            None => outcome.skipped.push(user_id),
        }
    }

    tx.commit().await?;
    tracing::info!(
        enrolled = outcome.enrolled.len(),
        skipped = outcome.skipped.len(),
        "batch enrollment done"
    );

    Ok(outcome)
}
