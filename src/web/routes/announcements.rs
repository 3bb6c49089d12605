use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ListRepository, ResourceTyped, check_access,
        entity::{Announcement, AnnouncementCreate, AnnouncementFilter, Course},
    },
    web::{
        AppState, JsonBody, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, fetch_or_404, fetch_visible},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/",
            get(announcement_list_handler).post(announcement_create_handler),
        )
        .route(
            "/{id}",
            get(announcement_get_handler)
                .put(announcement_update_handler)
                .delete(announcement_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements/",
    description = "Announcements the caller may see, newest first. Students only get the ones inside their window",
    params(PaginationQuery, AnnouncementFilter),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Announcement>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "announcements",
    security(
        ("cookie" = [])
    )
)]
async fn announcement_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(filter): Query<AnnouncementFilter>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let announcements = Announcement::page(state.pool(), user, &filter, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Announcement::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(announcements)))
}

#[utoipa::path(
    post,
    path = "/api/v1/announcements/",
    request_body = AnnouncementCreate,
    description = "Posts an announcement to a course the caller teaches",
    responses(
        (status = 201, description = "Announcement created", body = Announcement),
        (status = 400, description = "Empty title or inverted window", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "announcements",
    security(
        ("cookie" = [])
    )
)]
async fn announcement_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AnnouncementCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Announcement::get_resource_type(), reason))?;

    let course = fetch_or_404::<Course>(state.pool(), user, payload.course_id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    let created = Announcement::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/announcements/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the announcement")
    ),
    responses(
        (status = 200, description = "Announcement found", body = Announcement),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Announcement not found or outside of its window", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "announcements",
    security(
        ("cookie" = [])
    )
)]
async fn announcement_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let announcement = fetch_visible::<Announcement>(state.pool(), user, id).await?;

    Ok((StatusCode::OK, Json(announcement)))
}

#[utoipa::path(
    put,
    path = "/api/v1/announcements/{id}",
    request_body = AnnouncementCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the announcement to update")
    ),
    responses(
        (status = 200, description = "Announcement updated", body = Announcement),
        (status = 400, description = "Empty title, inverted window or course change", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the author or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "announcements",
    security(
        ("cookie" = [])
    )
)]
async fn announcement_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<AnnouncementCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Announcement::get_resource_type(), reason))?;

    let announcement = fetch_or_404::<Announcement>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &announcement)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    let updated = announcement
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/announcements/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the announcement to delete")
    ),
    responses(
        (status = 200, description = "Announcement deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the author or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "announcements",
    security(
        ("cookie" = [])
    )
)]
async fn announcement_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let announcement = fetch_or_404::<Announcement>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &announcement)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    announcement
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(Announcement::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
