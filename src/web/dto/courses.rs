use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::Course;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled_count: i64,
    pub is_full: bool,
}

impl CourseDetailResponse {
    pub fn new(course: Course, enrolled_count: i64) -> Self {
        let is_full = !crate::model::has_capacity(enrolled_count, 1, course.max_students());
        Self {
            course,
            enrolled_count,
            is_full,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    /// Path relative to `/api/v1/static/`
    pub path: String,
}
