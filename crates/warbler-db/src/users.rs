use rusqlite::{OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use crate::edges::{FOLLOWS, LIKES};
use crate::models::User;
use crate::{Database, Result, UnitOfWork};

impl Database {
    /// Verify credentials. Unknown usernames and wrong passwords both give
    /// `Ok(None)`. The connection is released before the hash is checked.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = {
            let uow = self.read()?;
            uow.find_user_by_username(username)?
        };
        Ok(user.filter(|user| user.check_password(password)))
    }
}

impl UnitOfWork<'_> {
    /// Insert a new user or update an existing one.
    ///
    /// A fresh id is assigned to `user.id` only once the insert has
    /// succeeded, so a rejected signup leaves the entity unsaved.
    pub fn save_user(&self, user: &mut User) -> Result<Uuid> {
        if let Some(id) = user.id {
            self.execute(
                "UPDATE users
                 SET username = ?2, email = ?3, password = ?4, image_url = ?5,
                     header_image_url = ?6, bio = ?7, location = ?8
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    user.username,
                    user.email,
                    user.password,
                    user.image_url,
                    user.header_image_url,
                    user.bio,
                    user.location,
                ],
            )?;
            return Ok(id);
        }

        let id = Uuid::new_v4();
        self.execute(
            "INSERT INTO users (id, username, email, password, image_url, header_image_url, bio, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                user.username,
                user.email,
                user.password,
                user.image_url,
                user.header_image_url,
                user.bio,
                user.location,
            ],
        )?;
        user.id = Some(id);
        Ok(id)
    }

    pub fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
        let user = self
            .query_row(&sql, [id.to_string()], User::from_row)
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", User::COLUMNS);
        let user = self
            .query_row(&sql, [username], User::from_row)
            .optional()?;
        Ok(user)
    }

    /// Users whose username contains `query`, or every user when `None`.
    pub fn search_users(&self, query: Option<&str>) -> Result<Vec<User>> {
        let pattern = format!("%{}%", query.unwrap_or_default());
        let sql = format!(
            "SELECT {} FROM users WHERE username LIKE ?1 ORDER BY username",
            User::COLUMNS
        );

        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map([pattern], User::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Batch-fetch users for a set of ids, ordered by username.
    pub fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT {} FROM users WHERE id IN ({}) ORDER BY username",
            User::COLUMNS,
            placeholders.join(", ")
        );

        let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(keys.iter()), User::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete a user together with everything that references them.
    /// Returns `false` if no such user exists.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let key = id.to_string();

        let likes_made = LIKES.detach_source(self, id)?;
        let likes_received = self.execute(
            "DELETE FROM likes WHERE message_id IN (SELECT id FROM messages WHERE user_id = ?1)",
            [&key],
        )?;
        let follows = FOLLOWS.detach_source(self, id)? + FOLLOWS.detach_target(self, id)?;
        let messages = self.execute("DELETE FROM messages WHERE user_id = ?1", [&key])?;
        let deleted = self.execute("DELETE FROM users WHERE id = ?1", [&key])? == 1;

        if deleted {
            info!(
                "Deleted user {} ({} messages, {} follows, {} likes)",
                id,
                messages,
                follows,
                likes_made + likes_received
            );
        }
        Ok(deleted)
    }
}
