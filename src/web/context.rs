//! Request context, e.g. user id, its role, etc.
//!

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::model::ResourceType;
use crate::web::{WebResult, error::WebError};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    user_id: Uuid,
    user_role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, user_role: UserRole) -> Self {
        Self { user_id, user_role }
    }

    /// Internal actor for lookups made on behalf of the system, not a person.
    pub fn admin() -> Self {
        Self {
            user_role: UserRole::Admin,
            user_id: Uuid::max(), // admin ID
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn user_role(&self) -> UserRole {
        self.user_role.clone()
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == UserRole::Admin
    }

    pub fn require_admin(&self, resource_type: ResourceType) -> WebResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(WebError::resource_forbidden(resource_type))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserRole {
    Admin,
    User,
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    maybe_user: Option<AuthenticatedUser>,
}

impl RequestContext {
    pub fn new(maybe_user: Option<AuthenticatedUser>) -> Self {
        Self { maybe_user }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn maybe_user(&self) -> Option<&AuthenticatedUser> {
        self.maybe_user.as_ref()
    }

    pub fn user(&self) -> WebResult<&AuthenticatedUser> {
        self.maybe_user.as_ref().ok_or(WebError::auth_required())
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::anonymous))
    }
}
