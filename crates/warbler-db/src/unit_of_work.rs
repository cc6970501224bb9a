use std::ops::Deref;
use std::sync::MutexGuard;

use rusqlite::Connection;
use tracing::warn;

use crate::Result;

/// An open transaction on the shared connection.
///
/// Every repository operation takes a `&UnitOfWork`. Nothing is visible to
/// other callers until [`UnitOfWork::commit`] succeeds; dropping an
/// unfinished unit of work rolls it back.
pub struct UnitOfWork<'db> {
    conn: MutexGuard<'db, Connection>,
    finished: bool,
}

impl<'db> UnitOfWork<'db> {
    /// `BEGIN IMMEDIATE`: the write lock is taken up front.
    pub(crate) fn begin(conn: MutexGuard<'db, Connection>) -> Result<Self> {
        Self::start(conn, "BEGIN IMMEDIATE")
    }

    /// `BEGIN DEFERRED`: no database lock until the first statement.
    pub(crate) fn read(conn: MutexGuard<'db, Connection>) -> Result<Self> {
        Self::start(conn, "BEGIN DEFERRED")
    }

    fn start(conn: MutexGuard<'db, Connection>, sql: &str) -> Result<Self> {
        conn.execute_batch(sql)?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Deref for UnitOfWork<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!("Rollback of abandoned unit of work failed: {}", e);
        }
    }
}
