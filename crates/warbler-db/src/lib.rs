pub mod edges;
pub mod error;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod password;
pub mod users;

mod unit_of_work;

pub use error::{DbError, Result};
pub use models::{Message, User};
pub use unit_of_work::UnitOfWork;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Start a unit of work. The connection stays locked until the returned
    /// value is committed, rolled back or dropped.
    pub fn begin(&self) -> Result<UnitOfWork<'_>> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        UnitOfWork::begin(conn)
    }

    /// Start a deferred unit of work for lookups. Other connections can
    /// still write to the file until it reads.
    pub fn read(&self) -> Result<UnitOfWork<'_>> {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        UnitOfWork::read(conn)
    }
}
