use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CommentCreateRequest {
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModerateRequest {
    pub is_approved: bool,
}
