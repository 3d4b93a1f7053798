//! Long-term profile store
//!
//! Durable per-user state: identity, weighted preference facts, and the full
//! conversation transcript. Preferences are unique per (user, type, value);
//! re-asserting a fact refreshes its confidence and timestamp in place.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::types::{Preference, Role};

/// SQLite-backed user profile store
pub struct ProfileStore {
    conn: Mutex<Connection>,
}

impl ProfileStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open_with_flags(db_path, flags)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA busy_timeout=30000;
            PRAGMA foreign_keys=ON;
            "#,
        )?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Look up a user by exact name, else create one. Anonymous when no name
    /// is given. A hit refreshes `last_active`.
    ///
    /// Lookup is case-sensitive as provided; "Alice" and "alice" are two
    /// profiles.
    pub fn get_or_create_user(&self, name: Option<&str>) -> Result<i64> {
        let conn = self.conn.lock();
        if let Some(name) = name {
            let existing: Option<i64> = conn
                .query_row("SELECT id FROM users WHERE name = ?1", params![name], |row| {
                    row.get(0)
                })
                .optional()?;
            if let Some(user_id) = existing {
                conn.execute(
                    "UPDATE users SET last_active = ?1 WHERE id = ?2",
                    params![Utc::now().to_rfc3339(), user_id],
                )?;
                return Ok(user_id);
            }
        }
        // Same RFC 3339 format the lookup-hit path writes
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (name, created_at, last_active) VALUES (?1, ?2, ?2)",
            params![name, now],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_user_name(&self, user_id: i64, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE users SET name = ?1 WHERE id = ?2",
            params![name, user_id],
        )?;
        Ok(())
    }

    pub fn get_user_name(&self, user_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let name: Option<Option<String>> = conn
            .query_row("SELECT name FROM users WHERE id = ?1", params![user_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(name.flatten())
    }

    /// Upsert a preference keyed by (user, type, value)
    pub fn add_preference(
        &self,
        user_id: i64,
        preference_type: &str,
        preference_value: &str,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO preferences (user_id, preference_type, preference_value, confidence, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, preference_type, preference_value)
             DO UPDATE SET confidence = excluded.confidence, updated_at = excluded.updated_at",
            params![
                user_id,
                preference_type,
                preference_value,
                confidence,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Preferences for a user, strongest and freshest first
    pub fn get_preferences(
        &self,
        user_id: i64,
        preference_type: Option<&str>,
    ) -> Result<Vec<Preference>> {
        let conn = self.conn.lock();
        let mut query = String::from(
            "SELECT preference_type, preference_value, confidence, updated_at
             FROM preferences WHERE user_id = ?1",
        );
        if preference_type.is_some() {
            query.push_str(" AND preference_type = ?2");
        }
        query.push_str(" ORDER BY confidence DESC, updated_at DESC");

        let mut stmt = conn.prepare(&query)?;
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<Preference> {
            let updated_at: String = row.get(3)?;
            Ok(Preference {
                preference_type: row.get(0)?,
                preference_value: row.get(1)?,
                confidence: row.get(2)?,
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        };
        let prefs = match preference_type {
            Some(kind) => stmt
                .query_map(params![user_id, kind], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![user_id], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(prefs)
    }

    /// Human-readable profile block: name line plus preferences grouped by
    /// type, or the literal "No user context available."
    pub fn user_context(&self, user_id: i64) -> Result<String> {
        let name = self.get_user_name(user_id)?;
        let preferences = self.get_preferences(user_id, None)?;

        let mut parts = Vec::new();
        if let Some(name) = name {
            parts.push(format!("User name: {name}"));
        }
        if !preferences.is_empty() {
            parts.push("\nUser preferences:".to_string());
            let mut by_type: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for pref in preferences {
                by_type
                    .entry(pref.preference_type)
                    .or_default()
                    .push(pref.preference_value);
            }
            for (kind, values) in by_type {
                parts.push(format!("  - {kind}: {}", values.join(", ")));
            }
        }

        if parts.is_empty() {
            Ok("No user context available.".to_string())
        } else {
            Ok(parts.join("\n"))
        }
    }

    /// Persist one transcript turn
    pub fn save_turn(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
        tool_name: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO conversations (user_id, role, content, tool_name) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, role.as_str(), content, tool_name],
        )?;
        Ok(())
    }

    /// Most recent `limit` transcript turns, returned in chronological order.
    ///
    /// Storage is queried newest-first; callers must not assume physical order
    /// equals return order.
    pub fn conversation_history(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<(Role, String, Option<String>)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT role, content, tool_name FROM conversations
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let mut rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let role_str: String = row.get(0)?;
                Ok((
                    role_str.parse::<Role>().unwrap_or(Role::Assistant),
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.reverse();
        Ok(rows)
    }
}

/// Apply the profile schema if absent
fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_active TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            preference_type TEXT NOT NULL,
            preference_value TEXT NOT NULL,
            confidence REAL NOT NULL DEFAULT 1.0,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, preference_type, preference_value)
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            tool_name TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_preferences_user ON preferences(user_id);
        "#,
    )?;
    Ok(())
}
