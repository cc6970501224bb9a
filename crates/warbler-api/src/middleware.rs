use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;
use uuid::Uuid;

use warbler_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Cookie holding the logged-in user's signed session token.
pub const SESSION_COOKIE: &str = "curr_user";

#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub lifetime: chrono::Duration,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

/// Who is making the request, resolved once by [`resolve_session`] and
/// handed to handlers as a request extension.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<SessionUser>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// The session user, or `ApiError::Unauthorized`.
    pub fn require(&self) -> Result<&SessionUser, ApiError> {
        self.user.as_ref().ok_or(ApiError::Unauthorized)
    }
}

/// Decode the session cookie into an [`AuthContext`]. Missing, expired or
/// tampered cookies leave the request anonymous.
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let auth = match jar.get(SESSION_COOKIE) {
        Some(cookie) => match decode_token(&state.session.secret, cookie.value()) {
            Ok(claims) => AuthContext::authenticated(SessionUser {
                id: claims.sub,
                username: claims.username,
            }),
            Err(e) => {
                warn!("Rejected session cookie: {}", e);
                AuthContext::anonymous()
            }
        },
        None => AuthContext::anonymous(),
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// Log `user` in by setting a fresh session cookie.
pub fn start_session(
    jar: CookieJar,
    config: &SessionConfig,
    user: &SessionUser,
) -> Result<CookieJar, ApiError> {
    let token = create_token(config, user)
        .map_err(|e| ApiError::Internal(format!("session token: {}", e)))?;

    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(config.secure_cookies)
            .same_site(SameSite::Lax),
    ))
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

fn create_token(config: &SessionConfig, user: &SessionUser) -> jsonwebtoken::errors::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: (chrono::Utc::now() + config.lifetime).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
