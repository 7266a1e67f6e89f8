use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            telegram_user_id  INTEGER PRIMARY KEY,
            first_name        TEXT NOT NULL DEFAULT '',
            username          TEXT NOT NULL DEFAULT '',
            photos            TEXT NOT NULL DEFAULT '[]',
            description       TEXT NOT NULL DEFAULT '',
            language          TEXT NOT NULL DEFAULT 'ru',
            theme             TEXT NOT NULL DEFAULT 'light',
            film_grain        INTEGER NOT NULL DEFAULT 1,
            created_at        INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at        INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS actions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            from_user_id  INTEGER NOT NULL REFERENCES users(telegram_user_id) ON DELETE CASCADE,
            to_user_id    INTEGER NOT NULL REFERENCES users(telegram_user_id) ON DELETE CASCADE,
            action        TEXT NOT NULL CHECK (action IN ('fuck', 'marry', 'kill')),
            timestamp     INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (from_user_id, to_user_id)
        );

        -- The pair is stored canonically ordered (user1 < user2), so the
        -- UNIQUE constraint covers the unordered pair and concurrent inserts
        -- of the same match collapse into one row.
        CREATE TABLE IF NOT EXISTS matches (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            user1_id               INTEGER NOT NULL REFERENCES users(telegram_user_id) ON DELETE CASCADE,
            user2_id               INTEGER NOT NULL REFERENCES users(telegram_user_id) ON DELETE CASCADE,
            type                   TEXT NOT NULL CHECK (type IN ('instant', 'conditional')),
            conditional_confirm_1  INTEGER NOT NULL DEFAULT 0,
            conditional_confirm_2  INTEGER NOT NULL DEFAULT 0,
            created_at             INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (user1_id, user2_id),
            CHECK (user1_id < user2_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id    INTEGER NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            sender_id  INTEGER NOT NULL REFERENCES users(telegram_user_id) ON DELETE CASCADE,
            type       TEXT NOT NULL CHECK (type IN ('text', 'photo', 'audio', 'gift')),
            content    TEXT NOT NULL,
            blurred    INTEGER NOT NULL DEFAULT 0,
            timestamp  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_actions_from ON actions(from_user_id);
        CREATE INDEX IF NOT EXISTS idx_actions_to ON actions(to_user_id);
        CREATE INDEX IF NOT EXISTS idx_matches_users ON matches(user1_id, user2_id);
        CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id);
        CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
