use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A unique constraint rejected the write. `field` is the column name.
    #[error("{field} already taken")]
    Conflict { field: String },

    /// A CHECK, NOT NULL or foreign key constraint rejected the write.
    #[error("invalid data: {0}")]
    Invalid(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let constraint = match &err {
            rusqlite::Error::SqliteFailure(e, Some(message))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Some(message.clone())
            }
            _ => None,
        };
        let Some(message) = constraint else {
            return Self::Sqlite(err);
        };

        // SQLite reports "UNIQUE constraint failed: users.username"
        if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
            let field = columns
                .split(',')
                .next()
                .and_then(|col| col.trim().rsplit('.').next())
                .unwrap_or(columns)
                .to_string();
            return Self::Conflict { field };
        }

        Self::Invalid(message)
    }
}
