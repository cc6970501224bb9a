use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::views::message_views;
use crate::{found, with_db};

/// POST /users/add_like/{message_id}. Liking twice is harmless.
pub async fn add_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.find_message(message_id)?.ok_or(ApiError::NotFound)?;
        uow.like(session.id, message_id)?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    Ok(found("/"))
}

/// POST /users/remove_like/{message_id}. Removing a missing like is a no-op.
pub async fn remove_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.find_message(message_id)?.ok_or(ApiError::NotFound)?;
        uow.unlike(session.id, message_id)?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    Ok(found("/"))
}

/// GET /users/{user_id}/likes
pub async fn liked_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let views = with_db(&state, move |db| {
        let uow = db.read()?;
        current_user(&uow, &session)?;
        uow.find_user(user_id)?.ok_or(ApiError::NotFound)?;
        let liked = uow.liked_messages(user_id)?;
        message_views(&uow, liked)
    })
    .await?;

    Ok(Json(views))
}
