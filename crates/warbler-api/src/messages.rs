use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use warbler_db::Message;
use warbler_db::models::MAX_MESSAGE_LEN;
use warbler_types::api::MessageForm;

use crate::auth::{AppState, current_user};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::views::message_views;
use crate::{found, with_db};

/// POST /messages/new: Post a warble as the session user.
pub async fn new_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<MessageForm>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();

    let len = form.text.chars().count();
    if form.text.trim().is_empty() || len > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message must be 1 to {} characters.",
            MAX_MESSAGE_LEN
        )));
    }

    let author_id = session.id;
    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;
        uow.save_message(&mut Message::new(session.id, form.text))?;
        uow.commit()?;
        Ok(())
    })
    .await?;

    Ok(found(&format!("/users/{}", author_id)))
}

/// GET /messages/{message_id}
pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = with_db(&state, move |db| {
        let uow = db.read()?;
        let message = uow.find_message(message_id)?.ok_or(ApiError::NotFound)?;
        let mut views = message_views(&uow, vec![message])?;
        views.pop().ok_or(ApiError::NotFound)
    })
    .await?;

    Ok(Json(view))
}

/// POST /messages/{message_id}/delete: Only the author may delete.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = auth.require()?.clone();
    let user_id = session.id;

    with_db(&state, move |db| {
        let uow = db.begin()?;
        current_user(&uow, &session)?;

        let message = uow.find_message(message_id)?.ok_or(ApiError::NotFound)?;
        if message.user_id != session.id {
            warn!(
                "User {} tried to delete message {} owned by {}",
                session.id, message_id, message.user_id
            );
            return Err(ApiError::Unauthorized);
        }

        uow.delete_message(message_id)?;
        uow.commit()?;
        info!("Message {} deleted by its author", message_id);
        Ok(())
    })
    .await?;

    Ok(found(&format!("/users/{}", user_id)))
}
