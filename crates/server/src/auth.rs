//! Session handling for HTTP: the `auth_token` cookie or an `Authorization: Bearer` header.
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use models::Role;
use service::Actor;
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Bearer header first, then the cookie.
pub fn extract_token(headers: &HeaderMap) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        let Some(token) = h.strip_prefix("Bearer ") else {
            return Err(JsonApiError::unauthorized("invalid Authorization format (expect Bearer)"));
        };
        return Ok(Some(token.trim().to_string()));
    }
    let cookie_header = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("");
    Ok(cookie_header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("auth_token="))
        .map(str::to_string)
        .find(|t| !t.is_empty()))
}

/// Resolve the caller. The account is re-read so deactivated users lose access before their token expires.
pub async fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<Actor, JsonApiError> {
    let token = extract_token(headers)?.ok_or_else(|| JsonApiError::unauthorized("authentication required"))?;
    let claims = service::auth::decode_token(&state.config.auth.jwt_secret, &token).map_err(|e| {
        tracing::warn!(err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired token")
    })?;
    let uid = Uuid::parse_str(&claims.uid).map_err(|_| JsonApiError::unauthorized("invalid token subject"))?;
    let user = state.auth.current_user(uid).await.map_err(|_| JsonApiError::unauthorized("account unavailable"))?;
    Ok(Actor::new(user.id, user.role))
}

/// Authenticates the request and stores the `Actor` in request extensions.
pub async fn require_auth(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, JsonApiError> {
    let actor = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

fn require_role(req: &Request, role: Role) -> Result<(), JsonApiError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| JsonApiError::unauthorized("authentication required"))?;
    if actor.role != role {
        tracing::warn!(user_id = %actor.user_id, required = role.as_str(), path = %req.uri().path(), "role check failed");
        return Err(JsonApiError::forbidden(format!("{} access required", role.as_str())));
    }
    Ok(())
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, JsonApiError> {
    require_role(&req, Role::Admin)?;
    Ok(next.run(req).await)
}

pub async fn require_provider(req: Request, next: Next) -> Result<Response, JsonApiError> {
    require_role(&req, Role::Provider)?;
    Ok(next.run(req).await)
}

pub async fn require_customer(req: Request, next: Next) -> Result<Response, JsonApiError> {
    require_role(&req, Role::Customer)?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        h.insert(header::COOKIE, HeaderValue::from_static("auth_token=xyz"));
        assert_eq!(extract_token(&h).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth_token=xyz; lang=en"));
        assert_eq!(extract_token(&h).unwrap().as_deref(), Some("xyz"));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_token(&h).is_err());
        assert_eq!(extract_token(&HeaderMap::new()).unwrap(), None);
    }
}
