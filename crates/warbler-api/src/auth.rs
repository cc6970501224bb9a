use std::sync::Arc;

use axum::{Form, extract::State, response::IntoResponse};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};

use warbler_db::{Database, UnitOfWork, User};
use warbler_types::api::{LoginForm, SignupForm};

use crate::error::ApiError;
use crate::middleware::{SessionConfig, SessionUser, end_session, start_session};
use crate::views::saved_id;
use crate::{flash, found, with_db};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 32;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session: SessionConfig,
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<impl IntoResponse, ApiError> {
    let username = check_identity(&form.username, &form.email)?;
    if form.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }

    let user = with_db(&state, move |db| {
        // Hash before taking the connection lock.
        let mut user = User::signup(&username, &form.email, &form.password, form.image_url.as_deref())?;

        let uow = db.begin()?;
        if let Err(e) = uow.save_user(&mut user) {
            uow.rollback()?;
            return Err(e.into());
        }
        uow.commit()?;
        Ok(user)
    })
    .await?;

    info!("New account {}", user);

    let session_user = SessionUser {
        id: saved_id(user.id)?,
        username: user.username.clone(),
    };
    let jar = start_session(jar, &state.session, &session_user)?;
    let jar = flash::push(jar, &format!("Hello, {}!", user.username));
    Ok((jar, found("/")))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let attempted = form.username.clone();
    let user = with_db(&state, move |db| {
        Ok(db.authenticate(&form.username, &form.password)?)
    })
    .await?;

    let Some(user) = user else {
        warn!("Failed login for '{}'", attempted);
        return Err(ApiError::InvalidCredentials);
    };

    let session_user = SessionUser {
        id: saved_id(user.id)?,
        username: user.username.clone(),
    };
    let jar = start_session(jar, &state.session, &session_user)?;
    let jar = flash::push(jar, &format!("Hello, {}!", user.username));
    Ok((jar, found("/")))
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = flash::push(end_session(jar), "You have successfully logged out.");
    (jar, found("/"))
}

/// Validate a submitted username and email, returning the trimmed username.
pub(crate) fn check_identity(username: &str, email: &str) -> Result<String, ApiError> {
    let username = username.trim();
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Username must be 1 to {} characters.",
            MAX_USERNAME_LEN
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address.".into()));
    }
    Ok(username.to_string())
}

/// Load the session's user. A session naming a deleted account is
/// treated as no session at all.
pub(crate) fn current_user(uow: &UnitOfWork<'_>, session: &SessionUser) -> Result<User, ApiError> {
    uow.find_user(session.id)?.ok_or_else(|| {
        warn!("Session names unknown user {}", session.id);
        ApiError::Unauthorized
    })
}
