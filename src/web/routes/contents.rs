use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{
            ContentCompletion, ContentCompletionCreate, Course, CourseContent,
            CourseContentCreate,
        },
    },
    utils::uploads::discard_upload,
    web::{
        AppState, JsonBody, RequestContext, WebError, WebResult,
        dto::courses::UploadResponse,
        error::ErrorResponse,
        middlewares,
        routes::{accept_upload, fetch_or_404, fetch_visible},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(content_create_handler))
        .route(
            "/{id}",
            get(content_get_handler)
                .put(content_update_handler)
                .delete(content_delete_handler),
        )
        .route("/{id}/complete", post(content_complete_handler))
        .route("/{id}/attachment", post(content_attachment_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/contents/",
    request_body = CourseContentCreate,
    description = "Adds a content item to a course the caller teaches",
    responses(
        (status = 201, description = "Content created", body = CourseContent),
        (status = 400, description = "Invalid content, window or parent", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course or parent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CourseContentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(CourseContent::get_resource_type(), reason))?;

    let course =
        fetch_or_404::<Course>(state.pool(), user, payload.course_id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    let created = CourseContent::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/contents/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 200, description = "Content found", body = CourseContent),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Content not found or not visible yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let content = fetch_visible::<CourseContent>(state.pool(), user, id).await?;

    Ok((StatusCode::OK, Json(content)))
}

#[utoipa::path(
    put,
    path = "/api/v1/contents/{id}",
    request_body = CourseContentCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the content to update")
    ),
    responses(
        (status = 200, description = "Content updated", body = CourseContent),
        (status = 400, description = "Invalid content, window or parent", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Content or parent not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CourseContentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(CourseContent::get_resource_type(), reason))?;

    let content = fetch_or_404::<CourseContent>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &content)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    let updated = content
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contents/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the content to delete")
    ),
    responses(
        (status = 200, description = "Content deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse),
        (status = 409, description = "Content still has child contents", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let content = fetch_or_404::<CourseContent>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &content)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    content
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/contents/{id}/complete",
    description = "Marks a visible content as completed by the caller",
    params(
        ("id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 201, description = "Completion recorded", body = ContentCompletion),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse),
        (status = 409, description = "Content is already completed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_complete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let content = fetch_visible::<CourseContent>(state.pool(), user, id).await?;

    let completion = ContentCompletion::create(
        state.pool(),
        user,
        ContentCompletionCreate::new(content.id(), user.user_id()),
    )
    .await
    .map_err(|e| WebError::resource_error(ContentCompletion::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(completion)))
}

#[utoipa::path(
    post,
    path = "/api/v1/contents/{id}/attachment",
    description = "Uploads the content attachment as multipart field `file`",
    params(
        ("id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 200, description = "Attachment stored", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "contents",
    security(
        ("cookie" = [])
    )
)]
async fn content_attachment_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let content = fetch_or_404::<CourseContent>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &content)
        .await
        .map_err(|e| WebError::resource_error(CourseContent::get_resource_type(), e))?;

    let path = accept_upload(&state, multipart, "content").await?;
    let content = match content.set_attachment(state.pool(), path.clone()).await {
        Ok(content) => content,
        Err(e) => {
            discard_upload(state.uploads_dir(), &path).await;
            return Err(WebError::resource_fetch_error(CourseContent::get_resource_type(), e));
        }
    };

    Ok((StatusCode::OK, Json(UploadResponse { id: content.id(), path })))
}
