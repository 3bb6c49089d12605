use thiserror::Error;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

// postgres SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("referenced resource not found: {0:?}")]
    NotFound(crate::model::ResourceType),
    #[error("resource conflicts with an existing one: {0}")]
    Conflict(&'static str),
    #[error("course is full ({max_students} students)")]
    CourseFull { max_students: i32 },
    #[error("user is already enrolled in this course")]
    AlreadyEnrolled,
    #[error("not enough slots: {available} available, {requested} requested")]
    NotEnoughSlots { available: i64, requested: i64 },
    #[error("invalid input: {0}")]
    Invalid(&'static str),
}

impl DatabaseError {
    fn db_code(&self) -> Option<String> {
        match self {
            Self::SqlxError(sqlx::Error::Database(e)) => e.code().map(|c| c.into_owned()),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.db_code().as_deref() == Some(UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.db_code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    }

    /// Replaces a unique violation with `err`, other errors pass through.
    pub fn on_unique(self, err: DatabaseError) -> Self {
        if self.is_unique_violation() { err } else { self }
    }

    /// Replaces a foreign key violation with `err`, other errors pass through.
    pub fn on_foreign_key(self, err: DatabaseError) -> Self {
        if self.is_foreign_key_violation() { err } else { self }
    }
}
