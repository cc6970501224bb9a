use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;

use warbler_db::messages::TIMELINE_LIMIT;
use warbler_types::api::HomeResponse;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::views::{message_views, user_summary};
use crate::{flash, with_db};

/// GET /: Pending notices plus, when logged in, the home timeline.
pub async fn home(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, flashes) = flash::take(jar);
    let session = auth.user().cloned();

    let mut response = with_db(&state, move |db| {
        let uow = db.read()?;
        let mut response = HomeResponse {
            flashes: Vec::new(),
            user: None,
            messages: Vec::new(),
            liked_message_ids: Vec::new(),
        };

        // Stale sessions get the anonymous page.
        let Some(session) = session else {
            return Ok(response);
        };
        let Some(user) = uow.find_user(session.id)? else {
            return Ok(response);
        };

        let timeline = uow.timeline(session.id, TIMELINE_LIMIT)?;
        response.user = Some(user_summary(&user)?);
        response.messages = message_views(&uow, timeline)?;
        response.liked_message_ids = uow.liked_message_ids(session.id)?;
        Ok(response)
    })
    .await?;

    response.flashes = flashes;
    Ok((jar, Json(response)))
}

pub async fn health() -> &'static str {
    "ok"
}
