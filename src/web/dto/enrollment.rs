use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::MemberRole;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnrollRequest {
    pub course_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchEnrollRequest {
    pub course_id: Uuid,
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MembersQuery {
    /// Only members holding this role
    pub role: Option<MemberRole>,
}
