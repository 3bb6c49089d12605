use crate::{
    Config,
    model::{
        CrudRepository, ModelManager, Scheduled,
        entity::Course,
        is_owner,
    },
    utils::uploads::{allowed_extension, store_upload},
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc},
};
use axum::{Router, extract::Multipart};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod announcements;
pub mod categories;
pub mod comments;
pub mod contents;
pub mod courses;
pub mod user;

const DEFAULT_PAGE_LIMIT: i64 = 20;
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Loads a resource by id, turning a missing row into a 404.
pub(crate) async fn fetch_or_404<T: CrudRepository>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: T::Id,
) -> WebResult<T> {
    T::find_by_id(mm, actor, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(T::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(T::get_resource_type()))
}

/// Like [`fetch_or_404`], but material outside of its window is reported as
/// missing to everybody except the course teacher and admins.
pub(crate) async fn fetch_visible<T>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    id: T::Id,
) -> WebResult<T>
where
    T: CrudRepository + Scheduled,
{
    let resource = fetch_or_404::<T>(mm, actor, id).await?;
    if resource.window().is_visible_now() {
        return Ok(resource);
    }

    let course = fetch_or_404::<Course>(mm, actor, resource.course_id()).await?;
    let teaches = is_owner(mm, actor, &course)
        .await
        .map_err(|e| WebError::resource_fetch_error(T::get_resource_type(), e))?;
    if teaches {
        Ok(resource)
    } else {
        Err(WebError::resource_not_found(T::get_resource_type()))
    }
}

/// Pulls the `file` field out of a multipart body and stores it under `category`.
pub(crate) async fn accept_upload(
    state: &AppState,
    mut multipart: Multipart,
    category: &str,
) -> WebResult<String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::bad_upload(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| WebError::bad_upload("file name is missing"))?;
        if allowed_extension(&filename).is_none() {
            return Err(WebError::bad_upload("file type is not allowed"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| WebError::bad_upload(e.body_text()))?;

        return store_upload(state.uploads_dir(), category, &filename, &bytes)
            .await
            .map_err(WebError::server_io_error);
    }

    Err(WebError::bad_upload("multipart field `file` is missing"))
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState, config: &'static Config) -> Router<S> {
    let mut router = Router::new()
        .nest("/api/v1/account/", user::routes(state.clone()))
        .nest("/api/v1/courses/", courses::routes(state.clone()))
        .nest("/api/v1/contents/", contents::routes(state.clone()))
        .nest("/api/v1/comments/", comments::routes(state.clone()))
        .nest("/api/v1/categories/", categories::routes(state.clone()))
        .nest("/api/v1/announcements/", announcements::routes(state.clone()))
        .nest_service("/api/v1/static/", ServeDir::new(state.uploads_dir()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}
