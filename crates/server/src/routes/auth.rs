use std::sync::Arc;

use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use service::auth::{
    domain::{AuthUser, LoginInput, RegisterInput},
    repo::seaorm::SeaOrmAuthRepository,
    AuthService,
};

use crate::auth::{authenticate, AUTH_COOKIE};
use crate::errors::JsonApiError;

pub type Auth = AuthService<SeaOrmAuthRepository>;

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub auth: Arc<Auth>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let auth_cfg = service::auth::service::AuthConfig {
            jwt_secret: Some(config.auth.jwt_secret.clone()),
            token_ttl_hours: config.auth.token_ttl_hours,
            ..Default::default()
        };
        let repo = Arc::new(SeaOrmAuthRepository::new(db.clone()));
        Self { db, config: Arc::new(config), auth: Arc::new(AuthService::new(repo, auth_cfg)) }
    }
}

#[derive(Serialize)]
pub struct RegisterOutput { pub user_id: Uuid, pub email: String, pub role: models::Role }

#[derive(Serialize)]
pub struct MeOutput {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: models::Role,
    pub dashboard: &'static str,
}

impl From<AuthUser> for MeOutput {
    fn from(u: AuthUser) -> Self {
        Self { name: u.full_name(), dashboard: u.role.dashboard_path(), user_id: u.id, email: u.email, role: u.role }
    }
}

#[derive(Serialize)]
pub struct LoginOutput {
    #[serde(flatten)]
    pub user: MeOutput,
    pub token: String,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<Json<RegisterOutput>, JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(RegisterOutput { user_id: user.id, email: user.email, role: user.role }))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let token = session
        .token
        .ok_or_else(|| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some("token generation failed".into())))?;
    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    info!(user_id = %session.user.id, event = "login", "session cookie issued");
    Ok((jar, Json(LoginOutput { user: session.user.into(), token })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<MeOutput>, JsonApiError> {
    let actor = authenticate(&state, &headers).await?;
    let user = state.auth.current_user(actor.user_id).await?;
    Ok(Json(user.into()))
}
