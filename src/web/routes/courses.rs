use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    model::{
        BatchEnrollment, CourseStats, CrudRepository, ListRepository, ResourceTyped,
        batch_enroll, check_access, enroll, is_owner,
        entity::{
            Announcement, Course, CourseContent, CourseCreate, CourseFilter, CourseMember,
            MemberRole,
        },
    },
    utils::uploads::discard_upload,
    web::{
        AppState, JsonBody, RequestContext, WebError, WebResult,
        dto::{
            courses::{CourseDetailResponse, UploadResponse},
            enrollment::{BatchEnrollRequest, EnrollRequest, MembersQuery},
        },
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, accept_upload, fetch_or_404},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(course_list_handler).post(course_create_handler))
        .route("/enroll", post(course_enroll_handler))
        .route("/batch_enroll", post(course_batch_enroll_handler))
        .route(
            "/{id}",
            get(course_get_handler)
                .put(course_update_handler)
                .delete(course_delete_handler),
        )
        .route("/{id}/members", get(course_members_handler))
        .route("/{id}/members/{user_id}", delete(course_leave_handler))
        .route("/{id}/contents", get(course_contents_handler))
        .route("/{id}/announcements", get(course_announcements_handler))
        .route("/{id}/analytics", get(course_analytics_handler))
        .route("/{id}/image", post(course_image_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/",
    params(PaginationQuery, CourseFilter),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(filter): Query<CourseFilter>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let courses = Course::page(state.pool(), user, &filter, page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    request_body = CourseCreate,
    description = "Creates a course taught by the caller",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid course data", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Category or teacher not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Course::get_resource_type(), reason))?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course with its enrollment state", body = CourseDetailResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;

    let enrolled = course
        .enrolled_count(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(CourseDetailResponse::new(course, enrolled))))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the course to update")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Invalid course data", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Course::get_resource_type(), reason))?;

    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(Course::get_resource_type(), e))?;

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course to delete")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "Course still has members or contents", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(Course::get_resource_type(), e))?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(Course::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/enroll",
    request_body = EnrollRequest,
    description = "Enrolls one user. Anyone may enroll themselves as a student, \
        the course teacher and admins may enroll anybody in any role",
    responses(
        (status = 201, description = "User enrolled", body = CourseMember),
        (status = 400, description = "Course is full or user is already enrolled", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You may only enroll yourself", body = ErrorResponse),
        (status = 404, description = "Course or user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EnrollRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course =
        fetch_or_404::<Course>(state.pool(), user, payload.course_id).await?;

    let self_enroll = payload.user_id == user.user_id() && payload.role == MemberRole::Student;
    if !self_enroll {
        check_access(state.pool(), user, &course)
            .await
            .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;
    }

    let member = enroll(state.pool(), course.id(), payload.user_id, payload.role)
        .await
        .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/batch_enroll",
    request_body = BatchEnrollRequest,
    description = "Enrolls several users as students at once. Either every new user fits \
        into the course or nobody is enrolled",
    responses(
        (status = 201, description = "Users enrolled, already-enrolled ones skipped", body = BatchEnrollment),
        (status = 400, description = "Not enough slots or empty list", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course or some user not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_batch_enroll_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<BatchEnrollRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if payload.user_ids.is_empty() {
        return Err(WebError::resource_invalid(
            CourseMember::get_resource_type(),
            "user_ids must not be empty",
        ));
    }

    let course =
        fetch_or_404::<Course>(state.pool(), user, payload.course_id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;

    let outcome = batch_enroll(state.pool(), course.id(), &payload.user_ids)
        .await
        .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/members",
    params(
        ("id" = Uuid, Path, description = "ID of the course"),
        MembersQuery
    ),
    responses(
        (status = 200, description = "Course members in enrollment order", body = Vec<CourseMember>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_members_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<MembersQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;

    let members = CourseMember::all_by_course(state.pool(), user, course.id(), query.role)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseMember::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(members)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}/members/{user_id}",
    description = "Removes a membership. Members may leave on their own, \
        the teacher and admins may remove anybody",
    params(
        ("id" = Uuid, Path, description = "ID of the course"),
        ("user_id" = Uuid, Path, description = "ID of the member's user")
    ),
    responses(
        (status = 200, description = "Membership removed"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "Membership not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_leave_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let member = CourseMember::find_by_course_and_user(state.pool(), user, id, user_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseMember::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(CourseMember::get_resource_type()))?;

    if member.user_id() != user.user_id() {
        check_access(state.pool(), user, &member)
            .await
            .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;
    }

    member
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(CourseMember::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/contents",
    description = "Contents visible right now, ordered by scheduled start",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Visible contents", body = Vec<CourseContent>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_contents_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;

    let contents = CourseContent::visible_by_course(state.pool(), user, course.id(), Utc::now())
        .await
        .map_err(|e| WebError::resource_fetch_error(CourseContent::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(contents)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/announcements",
    description = "Announcements visible right now",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Visible announcements", body = Vec<Announcement>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_announcements_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;

    let announcements =
        Announcement::visible_by_course(state.pool(), user, course.id(), Utc::now())
            .await
            .map_err(|e| WebError::resource_fetch_error(Announcement::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(announcements)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/analytics",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course counters", body = CourseStats),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_analytics_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;

    let stats = CourseStats::for_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{id}/image",
    description = "Uploads the course image as multipart field `file`",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file or unsupported type", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the teacher or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses",
    security(
        ("cookie" = [])
    )
)]
async fn course_image_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = fetch_or_404::<Course>(state.pool(), user, id).await?;
    if !is_owner(state.pool(), user, &course)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
    {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let path = accept_upload(&state, multipart, "course").await?;
    let course = match course.set_image(state.pool(), path.clone()).await {
        Ok(course) => course,
        Err(e) => {
            discard_upload(state.uploads_dir(), &path).await;
            return Err(WebError::resource_fetch_error(Course::get_resource_type(), e));
        }
    };

    Ok((StatusCode::OK, Json(UploadResponse { id: course.id(), path })))
}
