use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use models::user::Role;
use serde::Serialize;
use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::errors::ServiceError;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
}

impl From<AuthUser> for UserOut {
    fn from(u: AuthUser) -> Self { Self { id: u.id, email: u.email, username: u.username, role: u.role } }
}

#[derive(Debug, Serialize)]
pub struct LoginOut {
    pub token: String,
    pub user: UserOut,
}

#[utoipa::path(post, path = "/api/register/", tag = "auth", request_body = crate::openapi::RegisterRequest,
    responses((status = 201, description = "Registered", body = crate::openapi::UserDoc), (status = 400, description = "Field errors")))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<UserOut>), ApiError> {
    let user = state.services.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(post, path = "/api/login/", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "Token issued; also set as the auth_token cookie", body = crate::openapi::LoginDoc), (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<(CookieJar, Json<LoginOut>), ApiError> {
    let session = state.services.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOut { token: session.token, user: session.user.into() })))
}

#[utoipa::path(post, path = "/api/logout/", tag = "auth", responses((status = 204, description = "Token revoked")))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    state.services.auth.logout(&user).await?;
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(get, path = "/api/me/", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::ProfileDoc), (status = 401, description = "Unauthenticated")))]
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> Result<Json<AuthUser>, ApiError> {
    Ok(Json(state.services.auth.me(&user).await?))
}

/// `Authorization: Token <key>` or `Bearer <key>`, falling back to the `auth_token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let (scheme, key) = value.trim().split_once(' ')?;
        let known = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
        return known.then(|| key.trim().to_string()).filter(|k| !k.is_empty());
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|k| !k.is_empty())
}

/// Resolve the caller and stash it as an `Extension<AuthUser>` for handlers.
pub async fn require_token(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(token) = token_from_headers(req.headers()) else {
        debug!(path = %req.uri().path(), "request without credentials");
        return Err(ServiceError::Unauthenticated.into());
    };
    let user = state.services.auth.authenticate(&token).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
