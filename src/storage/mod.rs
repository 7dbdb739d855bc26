//! SQLite persistence — users, conversations, and messages.
//!
//! One [`Store`] owns one connection behind a mutex; every query is short
//! and single-statement, so the single-writer model is sufficient. Schema
//! and column defaults mirror the consultation data model: a user has many
//! conversations, a conversation has many timestamped role-tagged messages.

use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("username already registered: {0}")]
    DuplicateUsername(String),

    #[error("storage error: {0}")]
    Sqlite(String),
}

fn db_err(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Sqlite(format!("{context}: {e}"))
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A registered user row.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub location: String,
    pub created_at: String,
    pub is_active: bool,
}

/// Column values for a new user row; the password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub location: String,
}

/// Who authored a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A stored chat message.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

/// Title given to conversations opened implicitly by the chat endpoint.
pub const DEFAULT_CONVERSATION_TITLE: &str = "Health Consultation";

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `db_path` and apply recommended
    /// pragmas: WAL journal for concurrent readers, enforced foreign keys,
    /// and a busy timeout so a competing writer fails late instead of fast.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)
            .map_err(|e| db_err(&format!("open {}", db_path.display()), e))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| db_err("set journal_mode WAL", e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| db_err("set foreign_keys ON", e))?;
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| db_err("set busy_timeout", e))?;

        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| db_err("open in-memory", e))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| db_err("set foreign_keys ON", e))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Users ────────────────────────────────────────────────────────────────

    /// Insert a new user. Fails with [`StorageError::DuplicateUsername`] when
    /// the username is taken.
    pub fn create_user(&self, new: NewUser) -> Result<User, StorageError> {
        let conn = self.lock();

        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![new.username],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| db_err("check username", e))?;
        if taken.is_some() {
            return Err(StorageError::DuplicateUsername(new.username));
        }

        let created_at = now_iso8601();
        conn.execute(
            "INSERT INTO users (username, hashed_password, full_name, age, location, created_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            params![
                new.username,
                new.hashed_password,
                new.full_name,
                new.age,
                new.location,
                created_at
            ],
        )
        .map_err(|e| db_err("insert user", e))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: new.username,
            hashed_password: new.hashed_password,
            full_name: new.full_name,
            age: new.age,
            location: new.location,
            created_at,
            is_active: true,
        })
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, username, hashed_password, full_name, age, location, created_at, is_active
             FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        )
        .optional()
        .map_err(|e| db_err("select user by username", e))
    }

    pub fn user_by_id(&self, id: i64) -> Result<Option<User>, StorageError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id, username, hashed_password, full_name, age, location, created_at, is_active
             FROM users WHERE id = ?1",
            params![id],
            row_to_user,
        )
        .optional()
        .map_err(|e| db_err("select user by id", e))
    }

    // ── Conversations & messages ─────────────────────────────────────────────

    /// Open a new conversation for `user_id` and return its id.
    pub fn create_conversation(&self, user_id: i64, title: &str) -> Result<i64, StorageError> {
        let conn = self.lock();
        let now = now_iso8601();
        conn.execute(
            "INSERT INTO conversations (user_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![user_id, title, now],
        )
        .map_err(|e| db_err("insert conversation", e))?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recently updated conversation for `user_id`, if any.
    pub fn latest_conversation(&self, user_id: i64) -> Result<Option<i64>, StorageError> {
        let conn = self.lock();
        conn.query_row(
            "SELECT id FROM conversations WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC LIMIT 1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| db_err("select latest conversation", e))
    }

    /// Append a message and touch the conversation's `updated_at`.
    pub fn append_message(
        &self,
        conversation_id: i64,
        user_id: i64,
        role: Role,
        content: &str,
    ) -> Result<i64, StorageError> {
        let conn = self.lock();
        let now = now_iso8601();
        conn.execute(
            "INSERT INTO messages (conversation_id, user_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, user_id, role.as_str(), content, now],
        )
        .map_err(|e| db_err("insert message", e))?;
        let message_id = conn.last_insert_rowid();

        conn.execute(
            "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
            params![now, conversation_id],
        )
        .map_err(|e| db_err("touch conversation", e))?;

        Ok(message_id)
    }

    /// Up to `limit` most recent messages across all of the user's
    /// conversations, oldest first.
    pub fn recent_messages(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, conversation_id, role, content, timestamp FROM messages
                 WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|e| db_err("prepare recent_messages", e))?;
        let mut rows: Vec<MessageRecord> = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(MessageRecord {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    role: row.get(2)?,
                    content: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })
            .map_err(|e| db_err("query recent_messages", e))?
            .collect::<Result<_, _>>()
            .map_err(|e| db_err("read recent_messages row", e))?;
        rows.reverse();
        Ok(rows)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only happens after a panic inside a query closure;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        hashed_password: row.get(2)?,
        full_name: row.get(3)?,
        age: row.get(4)?,
        location: row.get(5)?,
        created_at: row.get(6)?,
        is_active: row.get(7)?,
    })
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            full_name TEXT,
            age INTEGER,
            location TEXT NOT NULL DEFAULT 'Malawi',
            created_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            title TEXT NOT NULL DEFAULT 'Health Consultation',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY,
            conversation_id INTEGER NOT NULL REFERENCES conversations(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id, id);

        PRAGMA user_version = 1;
        ",
    )
    .map_err(|e| db_err("initialize schema", e))
}

/// Current UTC time as an RFC 3339 string with second precision, e.g.
/// `"2025-04-01T12:00:00Z"`.
fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
