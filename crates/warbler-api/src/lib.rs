pub mod auth;
pub mod error;
pub mod flash;
pub mod home;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod users;
pub mod views;

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::error;

use warbler_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// All routes, with the session gate applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/messages/new", post(messages::new_message))
        .route("/messages/{message_id}", get(messages::show_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::profile).post(users::update_profile))
        .route("/users/delete", post(users::delete_account))
        .route("/users/follow/{user_id}", post(users::follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/add_like/{message_id}", post(likes::add_like))
        .route("/users/remove_like/{message_id}", post(likes::remove_like))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/following", get(users::following))
        .route("/users/{user_id}/followers", get(users::followers))
        .route("/users/{user_id}/likes", get(likes::liked_messages))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .with_state(state)
}

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Run blocking database work off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
}
