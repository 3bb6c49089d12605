use axum::{
    Json, Router,
    extract::{Path, State},
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
            Comment, CommentCreate, CommentRow, Course, CourseContent, CourseMember,
        },
    },
    web::{
        AppState, JsonBody, RequestContext, WebError, WebResult,
        dto::comments::{CommentCreateRequest, ModerateRequest},
        error::ErrorResponse,
        middlewares,
        routes::{fetch_or_404, fetch_visible},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/{content_id}",
            get(comments_list_handler).post(comment_create_handler),
        )
        .route("/pending/{content_id}", get(comments_pending_handler))
        .route(
            "/moderate/{content_id}/{comment_id}",
            post(comment_moderate_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{content_id}",
    description = "Approved comments of a content, oldest first",
    params(
        ("content_id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 200, description = "Approved comments", body = Vec<CommentRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Content not found or not visible yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "comments",
    security(
        ("cookie" = [])
    )
)]
async fn comments_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let content = fetch_visible::<CourseContent>(state.pool(), user, content_id).await?;

    let comments = CommentRow::all_by_content(state.pool(), user, content.id(), true)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(comments)))
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/pending/{content_id}",
    description = "Moderation queue: comments of a content still waiting for approval",
    params(
        ("content_id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 200, description = "Unapproved comments", body = Vec<CommentRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Content not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "comments",
    security(
        ("cookie" = [])
    )
)]
async fn comments_pending_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let content = fetch_or_404::<CourseContent>(state.pool(), user, content_id).await?;

    let course = fetch_or_404::<Course>(state.pool(), user, content.course_id()).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(Comment::get_resource_type(), e))?;

    let pending = CommentRow::all_by_content(state.pool(), user, content.id(), false)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(pending)))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{content_id}",
    request_body = CommentCreateRequest,
    description = "Leaves a comment on a content. It stays hidden until moderated",
    params(
        ("content_id" = Uuid, Path, description = "ID of the content")
    ),
    responses(
        (status = 201, description = "Comment stored for moderation", body = Comment),
        (status = 400, description = "Comment is empty", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not a member of this course", body = ErrorResponse),
        (status = 404, description = "Content not found or not visible yet", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "comments",
    security(
        ("cookie" = [])
    )
)]
async fn comment_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(content_id): Path<Uuid>,
    JsonBody(payload): JsonBody<CommentCreateRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.comment.trim().is_empty() {
        return Err(WebError::resource_invalid(
            Comment::get_resource_type(),
            "comment must not be empty",
        ));
    }

    let content = fetch_visible::<CourseContent>(state.pool(), user, content_id).await?;

    let member = CourseMember::find_by_course_and_user(
        state.pool(),
        user,
        content.course_id(),
        user.user_id(),
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(CourseMember::get_resource_type(), e))?
    .ok_or_else(|| WebError::resource_forbidden(Comment::get_resource_type()))?;

    let data = CommentCreate {
        content_id: content.id(),
        member_id: member.id(),
        comment: payload.comment,
    };
    let created = Comment::create(state.pool(), user, data)
        .await
        .map_err(|e| WebError::resource_error(Comment::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/moderate/{content_id}/{comment_id}",
    request_body = ModerateRequest,
    params(
        ("content_id" = Uuid, Path, description = "ID of the content"),
        ("comment_id" = Uuid, Path, description = "ID of the comment")
    ),
    responses(
        (status = 200, description = "Comment moderated", body = Comment),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "comments",
    security(
        ("cookie" = [])
    )
)]
async fn comment_moderate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((content_id, comment_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<ModerateRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let comment = Comment::find_by_content_and_id(state.pool(), user, content_id, comment_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Comment::get_resource_type()))?;

    check_access(state.pool(), user, &comment)
        .await
        .map_err(|e| WebError::resource_error(Comment::get_resource_type(), e))?;

    let moderated = comment
        .moderate(state.pool(), user, payload.is_approved)
        .await
        .map_err(|e| WebError::resource_fetch_error(Comment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(moderated)))
}
