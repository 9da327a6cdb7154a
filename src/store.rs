//! Durable session store
//!
//! One row per chat id, conversation state serialized as tagged JSON so a
//! process restart resumes every user exactly where they were.

mod schema;

pub use schema::SCHEMA;

use crate::engine::Session;
use crate::texts::Lang;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("state column is not valid JSON: {0}")]
    State(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Thread-safe store handle
#[derive(Clone)]
pub struct SessionDb {
    conn: Arc<Mutex<Connection>>,
}

impl SessionDb {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        Ok(db)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Session record for one chat, if any
    pub fn get_session(&self, chat_id: i64) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT chat_id, first_name, last_name, username, lang, state,
                    correct_count, total_count, joined_at
             FROM sessions WHERE chat_id = ?1",
        )?;
        let session = stmt
            .query_row(params![chat_id], row_to_session)
            .optional()?;
        Ok(session)
    }

    /// Insert or replace a session record; last write wins
    pub fn upsert_session(&self, session: &Session) -> StoreResult<()> {
        let state = serde_json::to_string(&session.state)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions
                 (chat_id, first_name, last_name, username, lang, state,
                  correct_count, total_count, joined_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(chat_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 username = excluded.username,
                 lang = excluded.lang,
                 state = excluded.state,
                 correct_count = excluded.correct_count,
                 total_count = excluded.total_count,
                 updated_at = excluded.updated_at",
            params![
                session.chat_id,
                session.first_name,
                session.last_name,
                session.username,
                session.lang.code(),
                state,
                session.correct_count,
                session.total_count,
                session.joined_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Every session record, ordered by join time (admin listing)
    pub fn all_sessions(&self) -> StoreResult<Vec<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT chat_id, first_name, last_name, username, lang, state,
                    correct_count, total_count, joined_at
             FROM sessions ORDER BY joined_at",
        )?;
        let rows = stmt.query_map([], row_to_session)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<Session> {
    let lang: String = row.get(4)?;
    let state_json: String = row.get(5)?;
    Ok(Session {
        chat_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        username: row.get(3)?,
        lang: Lang::from_code(&lang).unwrap_or_default(),
        // An unreadable state column resumes at the initial state rather
        // than wedging the row
        state: serde_json::from_str(&state_json).unwrap_or_default(),
        correct_count: row.get(6)?,
        total_count: row.get(7)?,
        joined_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn parse_datetime(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ChatProfile, ChatState};

    fn sample_session(chat_id: i64) -> Session {
        Session::new(
            ChatProfile {
                chat_id,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                username: "ada".to_string(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn get_missing_session_is_none() {
        let db = SessionDb::open_in_memory().unwrap();
        assert!(db.get_session(1).unwrap().is_none());
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let db = SessionDb::open_in_memory().unwrap();
        let mut session = sample_session(7);
        session.lang = Lang::Fr;
        session.state = ChatState::AwaitingQuizAnswer {
            answer: "4".to_string(),
            explanation: Some("arithmetic".to_string()),
        };
        session.correct_count = 2;
        session.total_count = 3;
        db.upsert_session(&session).unwrap();

        let loaded = db.get_session(7).unwrap().unwrap();
        assert_eq!(loaded.lang, Lang::Fr);
        assert_eq!(loaded.state.pending_answer(), Some("4"));
        assert_eq!(loaded.correct_count, 2);
        assert_eq!(loaded.total_count, 3);
        assert_eq!(loaded.first_name, "Ada");
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let db = SessionDb::open_in_memory().unwrap();
        let mut session = sample_session(7);
        db.upsert_session(&session).unwrap();
        session.state = ChatState::Menu;
        session.total_count = 1;
        db.upsert_session(&session).unwrap();

        let loaded = db.get_session(7).unwrap().unwrap();
        assert_eq!(loaded.state, ChatState::Menu);
        assert_eq!(loaded.total_count, 1);
        assert_eq!(db.all_sessions().unwrap().len(), 1);
    }

    #[test]
    fn all_sessions_lists_every_user() {
        let db = SessionDb::open_in_memory().unwrap();
        db.upsert_session(&sample_session(1)).unwrap();
        db.upsert_session(&sample_session(2)).unwrap();
        assert_eq!(db.all_sessions().unwrap().len(), 2);
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        {
            let db = SessionDb::open(&path).unwrap();
            let mut session = sample_session(9);
            session.state = ChatState::AwaitingCode;
            db.upsert_session(&session).unwrap();
        }
        let db = SessionDb::open(&path).unwrap();
        let loaded = db.get_session(9).unwrap().unwrap();
        assert_eq!(loaded.state, ChatState::AwaitingCode);
    }
}
