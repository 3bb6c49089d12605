//! Persistence traits every entity implements.

use serde::{Deserialize, Serialize};

use crate::{
    model::{ModelManager, error::DatabaseResult},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    Category,
    Course,
    CourseMember,
    CourseContent,
    Comment,
    ContentCompletion,
    Announcement,
}

/// A slice of a listing plus the number of rows matching its filter.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub trait ResourceTyped {
    fn get_resource_type() -> ResourceType;
}

/// Row level persistence. `Input` serves as both the create and the update payload.
#[async_trait::async_trait]
pub trait CrudRepository: ResourceTyped + Sized + Send {
    type Input: Send;
    type Id: Copy + Send + Sync;

    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: Self::Input,
    ) -> DatabaseResult<Self>;

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: Self::Input,
    ) -> DatabaseResult<Self>;

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()>;

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: Self::Id,
    ) -> DatabaseResult<Option<Self>>;
}

/// Listings narrowed by a per entity `Filter`.
///
/// `count` must apply the same predicate as `list`, including whatever the
/// actor is not allowed to see, or `Page::total` drifts from the items.
#[async_trait::async_trait]
pub trait ListRepository: Sized + Send {
    type Filter: Send + Sync;

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &Self::Filter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>>;

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &Self::Filter,
    ) -> DatabaseResult<i64>;

    async fn page(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &Self::Filter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Page<Self>> {
        let (items, total) = tokio::try_join!(
            Self::list(mm, actor, filter, limit, offset),
            Self::count(mm, actor, filter),
        )?;

        Ok(Page {
            items,
            total,
            limit,
            offset,
        })
    }
}

/// Maps a `fetch_one` result to `Ok(None)` when no row matched.
pub(crate) fn optional<T>(result: Result<T, sqlx::Error>) -> DatabaseResult<Option<T>> {
    match result {
        Ok(row) => Ok(Some(row)),
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
