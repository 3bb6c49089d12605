use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    Config, auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a [`RequestContext`]. Requests without a
/// cookie, or whose user is gone, continue anonymously.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match cookies.get(AUTH_TOKEN) {
        Some(token) => token,
        None => {
            req.extensions_mut().insert(RequestContext::anonymous());
            return Ok(next.run(req).await);
        }
    };

    let claims = auth::process_token(token.value(), Config::get_or_init(false).await.app().jwt())
        .map_err(|e| WebError::auth_cookie_invalid(AUTH_TOKEN, e))?;

    let Ok(id) = claims.claims.sub.parse::<Uuid>() else {
        tracing::warn!("token subject is not a user id");
        req.extensions_mut().insert(RequestContext::anonymous());
        return Ok(next.run(req).await);
    };

    let user = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let ctx = match user {
        Some(user) => RequestContext::new(Some(AuthenticatedUser::new(id, user.role()))),
        None => RequestContext::anonymous(),
    };
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}
