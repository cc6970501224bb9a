use std::collections::HashMap;

use uuid::Uuid;

use warbler_db::{Message, UnitOfWork, User};
use warbler_types::api::{MessageView, ProfileView, UserSummary};

use crate::error::ApiError;

/// Id of an entity loaded from the database.
pub fn saved_id(id: Option<Uuid>) -> Result<Uuid, ApiError> {
    id.ok_or_else(|| ApiError::Internal("entity has no id".into()))
}

pub fn user_summary(user: &User) -> Result<UserSummary, ApiError> {
    Ok(UserSummary {
        id: saved_id(user.id)?,
        username: user.username.clone(),
        image_url: user.image_url.clone(),
        bio: user.bio.clone(),
    })
}

pub fn user_summaries(users: &[User]) -> Result<Vec<UserSummary>, ApiError> {
    users.iter().map(user_summary).collect()
}

pub fn profile_view(user: &User) -> ProfileView {
    ProfileView {
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: user.image_url.clone(),
        header_image_url: user.header_image_url.clone(),
        bio: user.bio.clone(),
        location: user.location.clone(),
    }
}

/// Attach authors to messages, fetching all of them in one query.
pub fn message_views(uow: &UnitOfWork<'_>, messages: Vec<Message>) -> Result<Vec<MessageView>, ApiError> {
    let mut author_ids: Vec<Uuid> = messages.iter().map(|m| m.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, UserSummary> = uow
        .users_by_ids(&author_ids)?
        .iter()
        .map(|user| user_summary(user).map(|summary| (summary.id, summary)))
        .collect::<Result<_, _>>()?;

    messages
        .into_iter()
        .map(|message| {
            let author = authors
                .get(&message.user_id)
                .cloned()
                .ok_or_else(|| ApiError::Internal(format!("author {} missing", message.user_id)))?;
            Ok(MessageView {
                id: saved_id(message.id)?,
                text: message.text,
                timestamp: message.timestamp,
                author,
            })
        })
        .collect()
}
