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
        entity::{Category, CategoryCreate},
    },
    web::{
        AppState, JsonBody, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, fetch_or_404},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(category_list_handler).post(category_create_handler))
        .route(
            "/{id}",
            get(category_get_handler)
                .put(category_update_handler)
                .delete(category_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Category>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories",
    security(
        ("cookie" = [])
    )
)]
async fn category_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let categories = Category::page(state.pool(), user, &(), page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(Category::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(categories)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories/",
    request_body = CategoryCreate,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Name is empty or too long", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 409, description = "Category name is already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories",
    security(
        ("cookie" = [])
    )
)]
async fn category_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CategoryCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Category::get_resource_type(), reason))?;

    let created = Category::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Category::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the category")
    ),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories",
    security(
        ("cookie" = [])
    )
)]
async fn category_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let category = fetch_or_404::<Category>(state.pool(), user, id).await?;

    Ok((StatusCode::OK, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    request_body = CategoryCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the category to rename")
    ),
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 400, description = "Name is empty or too long", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the creator or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category name is already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories",
    security(
        ("cookie" = [])
    )
)]
async fn category_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CategoryCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload
        .validate()
        .map_err(|reason| WebError::resource_invalid(Category::get_resource_type(), reason))?;

    let category = fetch_or_404::<Category>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &category)
        .await
        .map_err(|e| WebError::resource_error(Category::get_resource_type(), e))?;

    let updated = category
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(Category::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    description = "Deletes a category. Courses in it become uncategorized",
    params(
        ("id" = Uuid, Path, description = "ID of the category to delete")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Only the creator or an admin may do this", body = ErrorResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "categories",
    security(
        ("cookie" = [])
    )
)]
async fn category_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let category = fetch_or_404::<Category>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &category)
        .await
        .map_err(|e| WebError::resource_error(Category::get_resource_type(), e))?;

    category
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(Category::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}
