use crate::Database;
use crate::models::{
    AddPhotoOutcome, MatchPartnerRow, MatchRow, MessageRow, ProfileUpdate, UserRow,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};

use ember_types::models::{ActionKind, MatchKind, MessageKind, MAX_PHOTOS};

const USER_COLUMNS: &str = "telegram_user_id, first_name, username, photos, description, \
                            language, theme, film_grain, created_at, updated_at";

impl Database {
    // -- Users --

    /// Login upsert: create the caller on first sight, otherwise just touch
    /// `updated_at`. Returns the stored row either way.
    pub fn upsert_login_user(
        &self,
        id: i64,
        first_name: &str,
        username: &str,
        language: &str,
    ) -> Result<UserRow> {
        self.with_conn(|conn| {
            let known: Option<i64> = conn
                .query_row(
                    "SELECT telegram_user_id FROM users WHERE telegram_user_id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;

            if known.is_some() {
                conn.execute(
                    "UPDATE users SET updated_at = strftime('%s', 'now') WHERE telegram_user_id = ?1",
                    [id],
                )?;
            } else {
                conn.execute(
                    "INSERT INTO users (telegram_user_id, first_name, username, language)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, first_name, username, language],
                )?;
            }

            query_user(conn, id)?.ok_or_else(|| anyhow!("user {} vanished after upsert", id))
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, id))
    }

    /// Apply a partial profile update. Returns the fresh row, or `None` for
    /// an unknown user.
    pub fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(photos) = &update.photos {
                sets.push("photos = ?");
                values.push(Box::new(serde_json::to_string(photos)?));
            }
            if let Some(description) = &update.description {
                sets.push("description = ?");
                values.push(Box::new(description.clone()));
            }
            if let Some(language) = &update.language {
                sets.push("language = ?");
                values.push(Box::new(language.clone()));
            }
            if let Some(theme) = &update.theme {
                sets.push("theme = ?");
                values.push(Box::new(theme.clone()));
            }
            if let Some(film_grain) = update.film_grain {
                sets.push("film_grain = ?");
                values.push(Box::new(film_grain));
            }

            if !sets.is_empty() {
                sets.push("updated_at = strftime('%s', 'now')");
                values.push(Box::new(id));
                let sql = format!(
                    "UPDATE users SET {} WHERE telegram_user_id = ?",
                    sets.join(", ")
                );
                conn.execute(
                    &sql,
                    rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
                )?;
            }

            query_user(conn, id)
        })
    }

    /// Append a photo URL, enforcing the server-side cap.
    pub fn add_photo(&self, id: i64, url: &str) -> Result<AddPhotoOutcome> {
        self.with_conn(|conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT photos FROM users WHERE telegram_user_id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(stored) = stored else {
                return Ok(AddPhotoOutcome::NoSuchUser);
            };

            let mut photos: Vec<String> = serde_json::from_str(&stored).unwrap_or_default();
            if photos.len() >= MAX_PHOTOS {
                return Ok(AddPhotoOutcome::CapReached);
            }
            photos.push(url.to_string());

            conn.execute(
                "UPDATE users
                 SET photos = ?1, updated_at = strftime('%s', 'now')
                 WHERE telegram_user_id = ?2",
                params![serde_json::to_string(&photos)?, id],
            )?;

            Ok(AddPhotoOutcome::Added(photos))
        })
    }

    /// Referential cleanup: the schema cascades through actions, matches and
    /// messages when a user row goes away.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE telegram_user_id = ?1", [id])?;
            Ok(())
        })
    }

    /// Uniform-random candidate for the requester, excluding themselves,
    /// everyone they killed, everyone they are already matched with (either
    /// slot), and profiles without photos.
    pub fn next_candidate(&self, user_id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE telegram_user_id != ?1
                   AND telegram_user_id NOT IN (
                       SELECT to_user_id FROM actions
                       WHERE from_user_id = ?1 AND action = 'kill')
                   AND telegram_user_id NOT IN (
                       SELECT user2_id FROM matches WHERE user1_id = ?1
                       UNION
                       SELECT user1_id FROM matches WHERE user2_id = ?1)
                   AND json_array_length(photos) > 0
                 ORDER BY RANDOM()
                 LIMIT 1"
            );
            let row = conn.query_row(&sql, [user_id], map_user_row).optional()?;
            Ok(row)
        })
    }

    // -- Actions --

    /// Record (or overwrite) the directed action for an ordered pair.
    pub fn record_action(&self, from: i64, to: i64, action: ActionKind) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO actions (from_user_id, to_user_id, action)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (from_user_id, to_user_id)
                 DO UPDATE SET action = excluded.action, timestamp = strftime('%s', 'now')",
                params![from, to, action.as_str()],
            )?;
            Ok(())
        })
    }

    /// The action recorded from `from` toward `to`, if any.
    pub fn action_between(&self, from: i64, to: i64) -> Result<Option<ActionKind>> {
        self.with_conn(|conn| {
            let kind: Option<String> = conn
                .query_row(
                    "SELECT action FROM actions WHERE from_user_id = ?1 AND to_user_id = ?2",
                    [from, to],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(kind.as_deref().and_then(ActionKind::from_db))
        })
    }

    // -- Matches --

    /// Insert a match for the unordered pair unless one already exists.
    /// The pair is canonicalized (lower id first) so the UNIQUE constraint
    /// resolves a racing duplicate insert instead of application locking.
    /// Returns whether a row was actually inserted.
    pub fn create_match_if_absent(
        &self,
        a: i64,
        b: i64,
        kind: MatchKind,
        confirmed: bool,
    ) -> Result<bool> {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO matches
                     (user1_id, user2_id, type, conditional_confirm_1, conditional_confirm_2)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![low, high, kind.as_str(), confirmed],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_match(&self, id: i64) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| query_match(conn, id))
    }

    /// Matches visible as active chats: instant, or conditional with both
    /// confirmations in.
    pub fn list_active_matches(&self, user_id: i64) -> Result<Vec<MatchPartnerRow>> {
        self.with_conn(|conn| {
            query_match_partners(
                conn,
                "AND (m.type = 'instant'
                      OR (m.type = 'conditional'
                          AND m.conditional_confirm_1 = 1
                          AND m.conditional_confirm_2 = 1))",
                user_id,
            )
        })
    }

    /// Conditional matches still waiting on at least one confirmation.
    pub fn list_pending_matches(&self, user_id: i64) -> Result<Vec<MatchPartnerRow>> {
        self.with_conn(|conn| {
            query_match_partners(
                conn,
                "AND m.type = 'conditional'
                 AND NOT (m.conditional_confirm_1 = 1 AND m.conditional_confirm_2 = 1)",
                user_id,
            )
        })
    }

    /// Set one member's confirmation flag and return the fresh row.
    /// `first_slot` selects which flag: true for user1 (the lower id).
    pub fn confirm_member(&self, match_id: i64, first_slot: bool) -> Result<Option<MatchRow>> {
        self.with_conn(|conn| {
            let column = if first_slot {
                "conditional_confirm_1"
            } else {
                "conditional_confirm_2"
            };
            conn.execute(
                &format!("UPDATE matches SET {} = 1 WHERE id = ?1", column),
                [match_id],
            )?;
            query_match(conn, match_id)
        })
    }

    pub fn delete_match(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM matches WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Messages --

    pub fn messages_for_chat(&self, chat_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, sender_id, type, content, blurred, timestamp
                 FROM messages
                 WHERE chat_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([chat_id], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn insert_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        kind: MessageKind,
        content: &str,
        blurred: bool,
    ) -> Result<MessageRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (chat_id, sender_id, type, content, blurred)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chat_id, sender_id, kind.as_str(), content, blurred],
            )?;
            let id = conn.last_insert_rowid();
            query_message(conn, id)?.ok_or_else(|| anyhow!("message {} vanished after insert", id))
        })
    }

    /// Fetch a message, scoped to its chat so a message id from another
    /// match cannot be addressed.
    pub fn get_message_in_chat(&self, message_id: i64, chat_id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, chat_id, sender_id, type, content, blurred, timestamp
                     FROM messages WHERE id = ?1 AND chat_id = ?2",
                    [message_id, chat_id],
                    map_message_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn set_message_blurred(&self, message_id: i64, blurred: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET blurred = ?1 WHERE id = ?2",
                params![blurred, message_id],
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_user_id = ?1");
    let row = conn.query_row(&sql, [id], map_user_row).optional()?;
    Ok(row)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        telegram_user_id: row.get(0)?,
        first_name: row.get(1)?,
        username: row.get(2)?,
        photos: row.get(3)?,
        description: row.get(4)?,
        language: row.get(5)?,
        theme: row.get(6)?,
        film_grain: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn query_match(conn: &Connection, id: i64) -> Result<Option<MatchRow>> {
    let row = conn
        .query_row(
            "SELECT id, user1_id, user2_id, type,
                    conditional_confirm_1, conditional_confirm_2, created_at
             FROM matches WHERE id = ?1",
            [id],
            map_match_row,
        )
        .optional()?;
    Ok(row)
}

fn map_match_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok(MatchRow {
        id: row.get(0)?,
        user1_id: row.get(1)?,
        user2_id: row.get(2)?,
        kind: row.get(3)?,
        confirm_1: row.get(4)?,
        confirm_2: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_match_partners(
    conn: &Connection,
    filter: &str,
    user_id: i64,
) -> Result<Vec<MatchPartnerRow>> {
    let sql = format!(
        "SELECT m.id, m.user1_id, m.user2_id, m.type,
                m.conditional_confirm_1, m.conditional_confirm_2, m.created_at,
                u1.first_name, u1.photos, u2.first_name, u2.photos
         FROM matches m
         JOIN users u1 ON m.user1_id = u1.telegram_user_id
         JOIN users u2 ON m.user2_id = u2.telegram_user_id
         WHERE (m.user1_id = ?1 OR m.user2_id = ?1)
         {filter}
         ORDER BY m.created_at DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MatchPartnerRow {
                id: row.get(0)?,
                user1_id: row.get(1)?,
                user2_id: row.get(2)?,
                kind: row.get(3)?,
                confirm_1: row.get(4)?,
                confirm_2: row.get(5)?,
                created_at: row.get(6)?,
                user1_name: row.get(7)?,
                user1_photos: row.get(8)?,
                user2_name: row.get(9)?,
                user2_photos: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            "SELECT id, chat_id, sender_id, type, content, blurred, timestamp
             FROM messages WHERE id = ?1",
            [id],
            map_message_row,
        )
        .optional()?;
    Ok(row)
}

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        kind: row.get(3)?,
        content: row.get(4)?,
        blurred: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AddPhotoOutcome;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed_user(db: &Database, id: i64) {
        db.upsert_login_user(id, &format!("User{}", id), &format!("user{}", id), "en")
            .unwrap();
    }

    fn give_photos(db: &Database, id: i64, count: usize) {
        let photos: Vec<String> = (0..count)
            .map(|i| format!("https://cdn.example/{}-{}.jpg", id, i))
            .collect();
        let update = ProfileUpdate {
            photos: Some(photos),
            ..Default::default()
        };
        db.update_profile(id, &update).unwrap().unwrap();
    }

    #[test]
    fn login_upsert_creates_then_touches() {
        let db = test_db();
        let created = db.upsert_login_user(1001, "Alice", "alice", "en").unwrap();
        assert_eq!(created.first_name, "Alice");
        assert_eq!(created.language, "en");
        assert_eq!(created.photos, "[]");

        // Second login must not reset profile fields.
        give_photos(&db, 1001, 2);
        let again = db.upsert_login_user(1001, "Alice", "alice", "en").unwrap();
        assert_eq!(serde_json::from_str::<Vec<String>>(&again.photos).unwrap().len(), 2);
    }

    #[test]
    fn profile_update_is_partial() {
        let db = test_db();
        seed_user(&db, 1001);

        let update = ProfileUpdate {
            description: Some("hello".into()),
            theme: Some("dark".into()),
            ..Default::default()
        };
        let row = db.update_profile(1001, &update).unwrap().unwrap();
        assert_eq!(row.description, "hello");
        assert_eq!(row.theme, "dark");
        assert_eq!(row.language, "en"); // untouched

        assert!(db.update_profile(4040, &update).unwrap().is_none());
    }

    #[test]
    fn add_photo_enforces_cap() {
        let db = test_db();
        seed_user(&db, 1001);

        for i in 0..5 {
            match db.add_photo(1001, &format!("https://cdn.example/{}.jpg", i)).unwrap() {
                AddPhotoOutcome::Added(photos) => assert_eq!(photos.len(), i + 1),
                _ => panic!("photo {} should have been accepted", i),
            }
        }
        assert!(matches!(
            db.add_photo(1001, "https://cdn.example/6.jpg").unwrap(),
            AddPhotoOutcome::CapReached
        ));
        assert!(matches!(
            db.add_photo(4040, "https://cdn.example/x.jpg").unwrap(),
            AddPhotoOutcome::NoSuchUser
        ));
    }

    #[test]
    fn action_upsert_overwrites_kind() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);

        db.record_action(1001, 1002, ActionKind::Fuck).unwrap();
        assert_eq!(db.action_between(1001, 1002).unwrap(), Some(ActionKind::Fuck));

        db.record_action(1001, 1002, ActionKind::Kill).unwrap();
        assert_eq!(db.action_between(1001, 1002).unwrap(), Some(ActionKind::Kill));

        // Direction matters.
        assert_eq!(db.action_between(1002, 1001).unwrap(), None);
    }

    #[test]
    fn match_insert_is_unique_per_unordered_pair() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);

        assert!(db.create_match_if_absent(1002, 1001, MatchKind::Instant, true).unwrap());
        // Same pair, either orientation: ignored.
        assert!(!db.create_match_if_absent(1001, 1002, MatchKind::Conditional, false).unwrap());
        assert!(!db.create_match_if_absent(1002, 1001, MatchKind::Instant, true).unwrap());

        let matches = db.list_active_matches(1001).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].user1_id, 1001); // canonical order
        assert_eq!(matches[0].user2_id, 1002);
    }

    #[test]
    fn confirm_sets_only_one_slot() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);
        db.create_match_if_absent(1001, 1002, MatchKind::Conditional, false).unwrap();
        let m = db.list_pending_matches(1001).unwrap().remove(0);

        let after = db.confirm_member(m.id, true).unwrap().unwrap();
        assert!(after.confirm_1);
        assert!(!after.confirm_2);
        assert!(!after.both_confirmed());

        // Pending until both flags are in, then active.
        assert_eq!(db.list_pending_matches(1002).unwrap().len(), 1);
        assert!(db.list_active_matches(1002).unwrap().is_empty());

        let after = db.confirm_member(m.id, false).unwrap().unwrap();
        assert!(after.both_confirmed());
        assert!(db.list_pending_matches(1002).unwrap().is_empty());
        assert_eq!(db.list_active_matches(1002).unwrap().len(), 1);
    }

    #[test]
    fn next_candidate_applies_every_exclusion() {
        let db = test_db();
        seed_user(&db, 1); // requester
        seed_user(&db, 2); // eligible
        seed_user(&db, 3); // no photos
        seed_user(&db, 4); // killed
        seed_user(&db, 5); // matched
        for id in [2, 4, 5] {
            give_photos(&db, id, 1);
        }
        db.record_action(1, 4, ActionKind::Kill).unwrap();
        db.create_match_if_absent(5, 1, MatchKind::Instant, true).unwrap();

        // Selection is random; any draw must be user 2.
        for _ in 0..20 {
            let candidate = db.next_candidate(1).unwrap().unwrap();
            assert_eq!(candidate.telegram_user_id, 2);
        }
    }

    #[test]
    fn next_candidate_empty_pool_is_none() {
        let db = test_db();
        seed_user(&db, 1);
        assert!(db.next_candidate(1).unwrap().is_none());
    }

    #[test]
    fn deleting_match_cascades_to_messages() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);
        db.create_match_if_absent(1001, 1002, MatchKind::Instant, true).unwrap();
        let m = db.list_active_matches(1001).unwrap().remove(0);

        db.insert_message(m.id, 1001, MessageKind::Text, "hi", false).unwrap();
        db.insert_message(m.id, 1002, MessageKind::Photo, "https://x/p.jpg", true).unwrap();
        assert_eq!(db.messages_for_chat(m.id).unwrap().len(), 2);

        db.delete_match(m.id).unwrap();
        assert!(db.get_match(m.id).unwrap().is_none());
        assert!(db.messages_for_chat(m.id).unwrap().is_empty());
    }

    #[test]
    fn deleting_user_cascades_everywhere() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);
        db.record_action(1001, 1002, ActionKind::Marry).unwrap();
        db.record_action(1002, 1001, ActionKind::Marry).unwrap();
        db.create_match_if_absent(1001, 1002, MatchKind::Instant, true).unwrap();
        let m = db.list_active_matches(1001).unwrap().remove(0);
        db.insert_message(m.id, 1002, MessageKind::Text, "hey", false).unwrap();

        db.delete_user(1002).unwrap();

        assert!(db.get_user(1002).unwrap().is_none());
        assert_eq!(db.action_between(1001, 1002).unwrap(), None);
        assert_eq!(db.action_between(1002, 1001).unwrap(), None);
        assert!(db.get_match(m.id).unwrap().is_none());
        assert!(db.messages_for_chat(m.id).unwrap().is_empty());
    }

    #[test]
    fn blur_flag_is_the_only_mutable_message_field() {
        let db = test_db();
        seed_user(&db, 1001);
        seed_user(&db, 1002);
        db.create_match_if_absent(1001, 1002, MatchKind::Instant, true).unwrap();
        let m = db.list_active_matches(1001).unwrap().remove(0);
        let msg = db.insert_message(m.id, 1001, MessageKind::Photo, "https://x/p.jpg", true).unwrap();
        assert!(msg.blurred);

        db.set_message_blurred(msg.id, false).unwrap();
        let fetched = db.get_message_in_chat(msg.id, m.id).unwrap().unwrap();
        assert!(!fetched.blurred);
        assert_eq!(fetched.content, "https://x/p.jpg");

        // Wrong chat scope: not addressable.
        assert!(db.get_message_in_chat(msg.id, m.id + 1).unwrap().is_none());
    }
}
