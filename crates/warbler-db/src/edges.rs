//! Many-to-many relations stored as a single edge table each.
//!
//! An [`EdgeSet`] names the table and its two key columns. Both directions
//! of a relation are queries over the same rows, so "A follows B" and
//! "B is followed by A" can never disagree.

use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Message, User, uuid_at};
use crate::{Result, UnitOfWork};

#[derive(Debug, Clone, Copy)]
pub struct EdgeSet {
    table: &'static str,
    source: &'static str,
    target: &'static str,
}

/// follower → followed
pub const FOLLOWS: EdgeSet = EdgeSet {
    table: "follows",
    source: "follower_id",
    target: "followed_id",
};

/// user → message
pub const LIKES: EdgeSet = EdgeSet {
    table: "likes",
    source: "user_id",
    target: "message_id",
};

impl EdgeSet {
    /// Add an edge. Returns `false` if it already existed.
    pub fn insert(&self, conn: &Connection, source: Uuid, target: Uuid) -> Result<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
            self.table, self.source, self.target
        );
        let added = conn.execute(&sql, [source.to_string(), target.to_string()])?;
        Ok(added == 1)
    }

    /// Remove an edge. Returns `false` if there was nothing to remove.
    pub fn remove(&self, conn: &Connection, source: Uuid, target: Uuid) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
            self.table, self.source, self.target
        );
        let removed = conn.execute(&sql, [source.to_string(), target.to_string()])?;
        Ok(removed == 1)
    }

    pub fn contains(&self, conn: &Connection, source: Uuid, target: Uuid) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2)",
            self.table, self.source, self.target
        );
        let found = conn.query_row(&sql, [source.to_string(), target.to_string()], |row| {
            row.get(0)
        })?;
        Ok(found)
    }

    /// Targets reachable from `source`.
    pub fn outgoing(&self, conn: &Connection, source: Uuid) -> Result<Vec<Uuid>> {
        self.column_where(conn, self.target, self.source, source)
    }

    /// Sources pointing at `target`.
    pub fn incoming(&self, conn: &Connection, target: Uuid) -> Result<Vec<Uuid>> {
        self.column_where(conn, self.source, self.target, target)
    }

    pub fn count_outgoing(&self, conn: &Connection, source: Uuid) -> Result<usize> {
        self.count_where(conn, self.source, source)
    }

    pub fn count_incoming(&self, conn: &Connection, target: Uuid) -> Result<usize> {
        self.count_where(conn, self.target, target)
    }

    /// Drop every edge leaving `source`.
    pub fn detach_source(&self, conn: &Connection, source: Uuid) -> Result<usize> {
        self.delete_where(conn, self.source, source)
    }

    /// Drop every edge arriving at `target`.
    pub fn detach_target(&self, conn: &Connection, target: Uuid) -> Result<usize> {
        self.delete_where(conn, self.target, target)
    }

    fn column_where(
        &self,
        conn: &Connection,
        select: &str,
        filter: &str,
        key: Uuid,
    ) -> Result<Vec<Uuid>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid",
            select, self.table, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map([key.to_string()], |row| uuid_at(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn count_where(&self, conn: &Connection, filter: &str, key: Uuid) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", self.table, filter);
        let count: i64 = conn.query_row(&sql, [key.to_string()], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn delete_where(&self, conn: &Connection, filter: &str, key: Uuid) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.table, filter);
        Ok(conn.execute(&sql, [key.to_string()])?)
    }
}

// -- Follows --

impl UnitOfWork<'_> {
    /// Start following `followed`. Following yourself, or someone you
    /// already follow, changes nothing and returns `false`.
    pub fn follow(&self, follower: Uuid, followed: Uuid) -> Result<bool> {
        if follower == followed {
            debug!("Ignoring self-follow by {}", follower);
            return Ok(false);
        }
        FOLLOWS.insert(self, follower, followed)
    }

    pub fn unfollow(&self, follower: Uuid, followed: Uuid) -> Result<bool> {
        FOLLOWS.remove(self, follower, followed)
    }

    /// Does `user` follow `other`?
    pub fn is_following(&self, user: Uuid, other: Uuid) -> Result<bool> {
        FOLLOWS.contains(self, user, other)
    }

    /// Is `user` followed by `other`?
    pub fn is_followed_by(&self, user: Uuid, other: Uuid) -> Result<bool> {
        FOLLOWS.contains(self, other, user)
    }

    /// Users that `user` follows.
    pub fn following(&self, user: Uuid) -> Result<Vec<User>> {
        let ids = FOLLOWS.outgoing(self, user)?;
        self.users_by_ids(&ids)
    }

    /// Users that follow `user`.
    pub fn followers(&self, user: Uuid) -> Result<Vec<User>> {
        let ids = FOLLOWS.incoming(self, user)?;
        self.users_by_ids(&ids)
    }

    pub fn following_count(&self, user: Uuid) -> Result<usize> {
        FOLLOWS.count_outgoing(self, user)
    }

    pub fn followers_count(&self, user: Uuid) -> Result<usize> {
        FOLLOWS.count_incoming(self, user)
    }
}

// -- Likes --

impl UnitOfWork<'_> {
    /// Like a message. Liking it again changes nothing and returns `false`.
    pub fn like(&self, user: Uuid, message: Uuid) -> Result<bool> {
        LIKES.insert(self, user, message)
    }

    /// Remove a like. Removing a like that isn't there returns `false`.
    pub fn unlike(&self, user: Uuid, message: Uuid) -> Result<bool> {
        LIKES.remove(self, user, message)
    }

    pub fn has_liked(&self, user: Uuid, message: Uuid) -> Result<bool> {
        LIKES.contains(self, user, message)
    }

    pub fn liked_message_ids(&self, user: Uuid) -> Result<Vec<Uuid>> {
        LIKES.outgoing(self, user)
    }

    /// Messages `user` has liked, newest first.
    pub fn liked_messages(&self, user: Uuid) -> Result<Vec<Message>> {
        let ids = LIKES.outgoing(self, user)?;
        self.messages_by_ids(&ids)
    }

    /// Users who liked `message`.
    pub fn likers(&self, message: Uuid) -> Result<Vec<User>> {
        let ids = LIKES.incoming(self, message)?;
        self.users_by_ids(&ids)
    }

    pub fn likes_count(&self, user: Uuid) -> Result<usize> {
        LIKES.count_outgoing(self, user)
    }
}
