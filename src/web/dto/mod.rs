pub mod comments;
pub mod courses;
pub mod enrollment;
