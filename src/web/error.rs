use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceConflict: {resource_type:?}, {reason}")]
    ResourceConflict {
        resource_type: ResourceType,
        reason: &'static str,
    },

    #[error("ResourceInvalid: {resource_type:?}, {reason}")]
    ResourceInvalid {
        resource_type: ResourceType,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("EnrollmentCourseFull, max_students: {max_students}")]
    EnrollmentCourseFull { max_students: i32 },

    #[error("EnrollmentAlreadyEnrolled")]
    EnrollmentAlreadyEnrolled,

    #[error("EnrollmentNotEnoughSlots, available: {available}, requested: {requested}")]
    EnrollmentNotEnoughSlots { available: i64, requested: i64 },
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("RequestMalformedBody: {reason}")]
    RequestMalformedBody { reason: String },

    #[error("RequestBadUpload: {reason}")]
    RequestBadUpload { reason: String },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
    #[error("ServerIoError: {0}")]
    ServerIoError(#[from] std::io::Error),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
            Self::ResourceInvalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { resource_type } => {
                format!("Resource error, {resource_type:?} not found.")
            }
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceConflict { reason, .. } => format!("Resource error, {reason}."),
            Self::ResourceInvalid { reason, .. } => format!("Validation error, {reason}."),
        }
    }
}

impl EnrollmentError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::EnrollmentCourseFull { .. } => String::from("Course is full"),
            Self::EnrollmentAlreadyEnrolled => {
                String::from("Student is already enrolled in this course")
            }
            Self::EnrollmentNotEnoughSlots {
                available,
                requested,
            } => format!(
                "Not enough slots available for all students ({available} available, {requested} requested)"
            ),
        }
    }
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RequestMalformedBody { reason } => format!("Validation error, {reason}"),
            Self::RequestBadUpload { reason } => format!("Upload error, {reason}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("EnrollmentError - {0}")]
    EnrollmentError(#[from] EnrollmentError),
    #[error("RequestError - {0}")]
    RequestError(#[from] RequestError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_conflict(r#type: ResourceType, reason: &'static str) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
            reason,
        })
    }

    pub fn resource_invalid<S: Into<String>>(r#type: ResourceType, reason: S) -> Self {
        Self::ResourceError(ResourceError::ResourceInvalid {
            resource_type: r#type,
            reason: reason.into(),
        })
    }

    /// Maps a model error onto the matching client-facing error.
    pub fn resource_error(r#type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            DatabaseError::NotFound(missing) => Self::resource_not_found(missing),
            DatabaseError::Conflict(reason) => Self::resource_conflict(r#type, reason),
            DatabaseError::Invalid(reason) => Self::resource_invalid(r#type, reason),
            DatabaseError::CourseFull { max_students } => {
                Self::EnrollmentError(EnrollmentError::EnrollmentCourseFull { max_students })
            }
            DatabaseError::AlreadyEnrolled => {
                Self::EnrollmentError(EnrollmentError::EnrollmentAlreadyEnrolled)
            }
            DatabaseError::NotEnoughSlots {
                available,
                requested,
            } => Self::EnrollmentError(EnrollmentError::EnrollmentNotEnoughSlots {
                available,
                requested,
            }),
            other => Self::resource_fetch_error(r#type, other),
        }
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn malformed_body<S: Into<String>>(reason: S) -> Self {
        Self::RequestError(RequestError::RequestMalformedBody {
            reason: reason.into(),
        })
    }

    pub fn bad_upload<S: Into<String>>(reason: S) -> Self {
        Self::RequestError(RequestError::RequestBadUpload {
            reason: reason.into(),
        })
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn server_io_error(e: std::io::Error) -> Self {
        Self::ServerError(ServerError::ServerIoError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::EnrollmentError(e) => e.status_code(),
            Self::RequestError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::EnrollmentError(e) => e.client_display(),
            Self::RequestError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
