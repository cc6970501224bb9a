//! Domain entities. `id` is `None` until the entity has been inserted
//! through a [`UnitOfWork`](crate::UnitOfWork).

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use tracing::warn;
use uuid::Uuid;

use crate::{Result, password};

pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// Upper bound on message length, in characters.
pub const MAX_MESSAGE_LEN: usize = 140;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
}

impl User {
    /// Build an unsaved account with a hashed password. Persist it with
    /// [`UnitOfWork::save_user`](crate::UnitOfWork::save_user) and commit.
    pub fn signup(
        username: &str,
        email: &str,
        password: &str,
        image_url: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            id: None,
            username: username.to_string(),
            email: email.to_string(),
            password: password::hash(password)?,
            image_url: or_default(image_url, DEFAULT_IMAGE_URL),
            header_image_url: DEFAULT_HEADER_IMAGE_URL.to_string(),
            bio: None,
            location: None,
        })
    }

    pub fn check_password(&self, password: &str) -> bool {
        password::verify(password, &self.password)
    }

    pub(crate) const COLUMNS: &'static str =
        "id, username, email, password, image_url, header_image_url, bio, location";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(uuid_at(row, 0)?),
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            image_url: row.get(4)?,
            header_image_url: row.get(5)?,
            bio: row.get(6)?,
            location: row.get(7)?,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "<User #{}: {}, {}>", id, self.username, self.email),
            None => write!(f, "<User #unsaved: {}, {}>", self.username, self.email),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Option<Uuid>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
}

impl Message {
    pub fn new(user_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            timestamp: Utc::now(),
            user_id,
        }
    }

    pub(crate) const COLUMNS: &'static str = "id, text, timestamp, user_id";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id = uuid_at(row, 0)?;
        let raw: String = row.get(2)?;
        let timestamp = DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(|e| {
                warn!("Corrupt timestamp '{}' on message '{}': {}", raw, id, e);
                DateTime::default()
            });

        Ok(Self {
            id: Some(id),
            text: row.get(1)?,
            timestamp,
            user_id: uuid_at(row, 3)?,
        })
    }
}

/// Empty or missing values fall back to `default`.
pub fn or_default(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Sortable text form used for the `timestamp` column.
pub(crate) fn timestamp_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
