use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use tracing::{info, warn};
use uuid::Uuid;

use warbler_db::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, or_default};
use warbler_types::api::{ProfileForm, SearchQuery, UserDetail};

use crate::auth::{AppState, check_identity, current_user};
use crate::error::ApiError;
use crate::middleware::{AuthContext, SessionUser, end_session, start_session};
use crate::views::{message_views, profile_view, saved_id, user_summaries};
use crate::{flash, found, with_db};

/// GET /users?q=: Username substring search.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = with_db(&state, move |db| {
        let uow = db.read()?;
        let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let users = uow.search_users(q)?;
        user_summaries(&users)
    })
    .await?;

    Ok(Json(users))
}

/// GET /users/{user_id}: Profile with counts and messages.
pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = with_db(&state, move |db| {
        let uow = db.read()?;
        let user = uow.find_user(user_id)?.ok_or(ApiError::NotFound)?;
        let messages = uow.messages_by_user(user_id)?;

        Ok(UserDetail {
            id: user_id,
            message_count: uow.message_count(user_id)?,
            following_count: uow.following_count(user_id)?,
            followers_count: uow.followers_count(user_id)?,
            likes_count: uow.likes_count(user_id)?,
            messages: message_views(&uow, messages)?,
            username: user.username,
            image_url: user.image_url,
            header_image_url: user.header_image_url,
            bio: user.bio,
            location: user.location,
        })
    })
    .await?;

    Ok(Json(detail))
}

/// GET /users/{user_id}/following
pub async fn following(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let users = with_db(&state, move |db| {
        let uow = db.read()?;
        current_user(&uow, &session)?;
        uow.find_user(user_id)?.ok_or(ApiError::NotFound)?;
        user_summaries(&uow.following(user_id)?)
    })
    .await?;

    Ok(Json(users))
}

/// GET /users/{user_id}/followers
pub async fn followers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let users = with_db(&state, move |db| {
        let uow = db.read()?;
        current_user(&uow, &session)?;
        uow.find_user(user_id)?.ok_or(ApiError::NotFound)?;
        user_summaries(&uow.followers(user_id)?)
    })
    .await?;

    Ok(Json(users))
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(followed_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();
    let follower_id = session.id;

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.find_user(followed_id)?.ok_or(ApiError::NotFound)?;
        uow.follow(session.id, followed_id)?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    Ok(found(&format!("/users/{}/following", follower_id)))
}

/// POST /users/stop-following/{user_id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(followed_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();
    let follower_id = session.id;

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.find_user(followed_id)?.ok_or(ApiError::NotFound)?;
        uow.unfollow(session.id, followed_id)?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    Ok(found(&format!("/users/{}/following", follower_id)))
}

/// GET /users/profile: The session user's editable fields.
pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let view = with_db(&state, move |db| {
        let uow = db.read()?;
        let user = current_user(&uow, &session)?;
        Ok(profile_view(&user))
    })
    .await?;

    Ok(Json(view))
}

/// POST /users/profile: Requires the current password.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
    Form(form): Form<ProfileForm>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let username = check_identity(&form.username, &form.email)?;

    let user = with_db(&state, move |db| {
        let mut user = {
            let uow = db.read()?;
            current_user(&uow, &session)?
        };

        // Hash check runs with the connection released.
        if !user.check_password(&form.password) {
            warn!("Wrong password on profile edit for {}", session.id);
            return Err(ApiError::InvalidCredentials);
        }

        let uow = db.begin()?;
        current_user(&uow, &session)?;

        user.username = username;
        user.email = form.email;
        user.image_url = or_default(form.image_url.as_deref(), DEFAULT_IMAGE_URL);
        user.header_image_url =
            or_default(form.header_image_url.as_deref(), DEFAULT_HEADER_IMAGE_URL);
        user.bio = non_empty(form.bio);
        user.location = non_empty(form.location);

        if let Err(e) = uow.save_user(&mut user) {
            uow.rollback()?;
            return Err(e.into());
        }
        uow.commit()?;
        Ok(user)
    })
    .await?;

    // The session carries the username, so reissue it.
    let session_user = SessionUser {
        id: saved_id(user.id)?,
        username: user.username.clone(),
    };
    let jar = start_session(jar, &state.session, &session_user)?;
    Ok((jar, found(&format!("/users/{}", session_user.id))))
}

/// POST /users/delete: Remove the session user and everything they own.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();
    let user_id = session.id;

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.delete_user(session.id)?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    info!("Account {} closed", user_id);
    let jar = flash::push(end_session(jar), "Your account has been deleted.");
    Ok((jar, found("/")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
