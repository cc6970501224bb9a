use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::edges::{FOLLOWS, LIKES};
use crate::models::{Message, timestamp_sql};
use crate::{Result, UnitOfWork};

/// How many messages the home timeline shows.
pub const TIMELINE_LIMIT: u32 = 100;

impl UnitOfWork<'_> {
    /// Insert a new message, or update the text of a saved one.
    /// Text longer than [`MAX_MESSAGE_LEN`](crate::models::MAX_MESSAGE_LEN)
    /// characters or empty text fails with `DbError::Invalid`.
    pub fn save_message(&self, message: &mut Message) -> Result<Uuid> {
        if let Some(id) = message.id {
            self.execute(
                "UPDATE messages SET text = ?2 WHERE id = ?1",
                params![id.to_string(), message.text],
            )?;
            return Ok(id);
        }

        let id = Uuid::new_v4();
        self.execute(
            "INSERT INTO messages (id, text, timestamp, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                message.text,
                timestamp_sql(&message.timestamp),
                message.user_id.to_string(),
            ],
        )?;
        message.id = Some(id);
        Ok(id)
    }

    pub fn find_message(&self, id: Uuid) -> Result<Option<Message>> {
        let sql = format!("SELECT {} FROM messages WHERE id = ?1", Message::COLUMNS);
        let message = self
            .query_row(&sql, [id.to_string()], Message::from_row)
            .optional()?;
        Ok(message)
    }

    /// A user's messages, newest first.
    pub fn messages_by_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE user_id = ?1 ORDER BY timestamp DESC, rowid DESC",
            Message::COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map([user_id.to_string()], Message::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn message_count(&self, user_id: Uuid) -> Result<usize> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Batch-fetch messages for a set of ids, newest first.
    pub fn messages_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Message>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT {} FROM messages WHERE id IN ({}) ORDER BY timestamp DESC, rowid DESC",
            Message::COLUMNS,
            placeholders.join(", ")
        );

        let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(keys.iter()), Message::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Home timeline: the newest messages by `user_id` and everyone they
    /// follow.
    pub fn timeline(&self, user_id: Uuid, limit: u32) -> Result<Vec<Message>> {
        let mut authors = FOLLOWS.outgoing(self, user_id)?;
        authors.push(user_id);

        let placeholders: Vec<String> = (2..=authors.len() + 1).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT {} FROM messages WHERE user_id IN ({})
             ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
            Message::COLUMNS,
            placeholders.join(", ")
        );

        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(limit)];
        values.extend(
            authors
                .iter()
                .map(|id| Box::new(id.to_string()) as Box<dyn rusqlite::types::ToSql>),
        );

        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values.iter()), Message::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Delete a message and every like pointing at it.
    /// Returns `false` if no such message exists.
    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        LIKES.detach_target(self, id)?;
        let deleted = self.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
        Ok(deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbError, User};

    const LONG_TEXT: &str = "Lorem ipsum dolor sit amet consectetur adipisicing elit. \
        Quibusdam, sed odio. Laudantium, commodi? Dicta saepe accusantium ratione \
        necessitatibus quaerat molestiae non exercitationem repellendus nemo? Yeehaw";

    fn signup(db: &Database, username: &str) -> Uuid {
        let uow = db.begin().unwrap();
        let email = format!("{username}@test.com");
        let mut user = User::signup(username, &email, "password", None).unwrap();
        let id = uow.save_user(&mut user).unwrap();
        uow.commit().unwrap();
        id
    }

    fn post(db: &Database, user_id: Uuid, text: &str) -> Uuid {
        let uow = db.begin().unwrap();
        let id = uow.save_message(&mut Message::new(user_id, text)).unwrap();
        uow.commit().unwrap();
        id
    }

    #[test]
    fn message_belongs_to_its_author() {
        let db = Database::open_in_memory().unwrap();
        let user_id = signup(&db, "testuser");

        let uow = db.begin().unwrap();
        let mut message = Message::new(user_id, "Hello hello hello");
        uow.save_message(&mut message).unwrap();
        uow.commit().unwrap();
        assert!(message.id.is_some());

        let uow = db.begin().unwrap();
        let owned = uow.messages_by_user(user_id).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].text, "Hello hello hello");
        assert_eq!(owned[0].user_id, user_id);
    }

    #[test]
    fn overlong_message_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user_id = signup(&db, "testuser");
        post(&db, user_id, "first");

        assert!(LONG_TEXT.chars().count() > crate::models::MAX_MESSAGE_LEN);
        let uow = db.begin().unwrap();
        let mut message = Message::new(user_id, LONG_TEXT);
        assert!(matches!(
            uow.save_message(&mut message),
            Err(DbError::Invalid(_))
        ));
        uow.rollback().unwrap();
        assert!(message.id.is_none());

        let uow = db.begin().unwrap();
        assert_eq!(uow.message_count(user_id).unwrap(), 1);
    }

    #[test]
    fn empty_message_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user_id = signup(&db, "testuser");

        let uow = db.begin().unwrap();
        assert!(uow.save_message(&mut Message::new(user_id, "")).is_err());
    }

    #[test]
    fn message_needs_an_existing_author() {
        let db = Database::open_in_memory().unwrap();
        let uow = db.begin().unwrap();
        let mut orphan = Message::new(Uuid::new_v4(), "nobody wrote this");
        assert!(matches!(
            uow.save_message(&mut orphan),
            Err(DbError::Invalid(_))
        ));
    }

    #[test]
    fn messages_are_listed_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let user_id = signup(&db, "testuser");
        post(&db, user_id, "one");
        post(&db, user_id, "two");
        post(&db, user_id, "three");

        let uow = db.begin().unwrap();
        let texts: Vec<String> = uow
            .messages_by_user(user_id)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["three", "two", "one"]);
    }

    #[test]
    fn timeline_covers_self_and_followed_only() {
        let db = Database::open_in_memory().unwrap();
        let me = signup(&db, "me");
        let friend = signup(&db, "friend");
        let stranger = signup(&db, "stranger");
        post(&db, me, "mine");
        post(&db, friend, "friend's");
        post(&db, stranger, "stranger's");

        let uow = db.begin().unwrap();
        uow.follow(me, friend).unwrap();
        let texts: Vec<String> = uow
            .timeline(me, TIMELINE_LIMIT)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, ["friend's", "mine"]);
        assert_eq!(uow.timeline(me, 1).unwrap().len(), 1);
    }

    #[test]
    fn delete_message_drops_its_likes() {
        let db = Database::open_in_memory().unwrap();
        let author = signup(&db, "author");
        let fan = signup(&db, "fan");
        let message_id = post(&db, author, "like me");

        let uow = db.begin().unwrap();
        uow.like(fan, message_id).unwrap();
        assert!(uow.delete_message(message_id).unwrap());
        assert!(!uow.delete_message(message_id).unwrap());
        assert!(uow.find_message(message_id).unwrap().is_none());
        assert_eq!(uow.likes_count(fan).unwrap(), 0);
    }
}
