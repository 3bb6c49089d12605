use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, ListRepository, ResourceTyped, UserStats, check_access,
        entity::{ContentCompletion, UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, JsonBody, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
        routes::{PaginationQuery, fetch_or_404},
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserCreateUpdateBody {
    pub username: String,
    pub password: String,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/page", get(user_list_handler))
        .route("/verify", get(user_verify_handler))
        .route("/completions", get(user_completions_handler))
        .route(
            "/{id}",
            put(user_update_handler).delete(user_delete_handler),
        )
        .route("/{id}/activity", get(user_activity_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .merge(protected)
        .with_state(state)
}

async fn set_auth_cookie(cookies: &Cookies, user_id: Uuid) -> WebResult<()> {
    let jwt_key = Config::get_or_init(false).await.app().jwt();
    let token = auth::generate_token(UserClaims::for_user(user_id), jwt_key)
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = UserCreateUpdateBody,
    description = "Creates new user in database",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Username or password is empty", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(payload): JsonBody<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(WebError::resource_invalid(
            UserEntity::get_resource_type(),
            "username and password are required",
        ));
    }

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: hash,
    };

    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| WebError::resource_error(UserEntity::get_resource_type(), e))?;

    set_auth_cookie(&cookies, created.id()).await?;

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = UserCreateUpdateBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(payload): JsonBody<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_auth_cookie(&cookies, found.id()).await?;

    Ok((StatusCode::OK, Json(found)))
}

async fn user_verify_handler(ctx: RequestContext) -> WebResult<impl IntoResponse> {
    if ctx.maybe_user().is_none() {
        return Ok(StatusCode::UNAUTHORIZED);
    }

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 403, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    user.require_admin(UserEntity::get_resource_type())?;

    let users = UserEntity::page(state.pool(), user, &(), page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UserCreateUpdateBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user to update")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You doesn't have enough permissions to do this", body = ErrorResponse),
        (status = 409, description = "Username is taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found: UserEntity = fetch_or_404::<UserEntity>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &found)
        .await
        .map_err(|e| WebError::resource_error(UserEntity::get_resource_type(), e))?;

    let conflict_found = UserEntity::find_by_username(state.pool(), user, &payload.username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if conflict_found.is_some_and(|other| other.id() != found.id()) {
        return Err(WebError::registration_conflict());
    }

    let payload = UserEntityCreateUpdate {
        username: payload.username,
        password_hash: String::new(), // not in use
    };

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    params(
        ("id" = Uuid, Path, description = "ID of the user to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User still owns courses or memberships", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found: UserEntity = fetch_or_404::<UserEntity>(state.pool(), user, id).await?;
    check_access(state.pool(), user, &found)
        .await
        .map_err(|e| WebError::resource_error(UserEntity::get_resource_type(), e))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_error(UserEntity::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/account/{id}/activity",
    description = "Aggregate activity counts of a user",
    params(
        ("id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Activity counted", body = UserStats),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_activity_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found: UserEntity = fetch_or_404::<UserEntity>(state.pool(), user, id).await?;

    let stats = UserStats::for_user(state.pool(), found.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/completions",
    description = "Contents completed by the current user, newest first",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<ContentCompletion>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_completions_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let completions = ContentCompletion::page(state.pool(), user, &(), page.limit(), page.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(ContentCompletion::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(completions)))
}
