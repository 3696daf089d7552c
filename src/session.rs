use crate::store;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IDLE_TIMEOUT_MINUTES: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Session {
    pub fn start(email: &str, now: i64, idle_ms: i64) -> Self {
        Session {
            email: email.to_string(),
            created_at: now,
            expires_at: now + idle_ms,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Active(Session),
    Expired(Session),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Active(_) => "active",
            SessionState::Expired(_) => "expired",
        }
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn idle_ms(minutes: i64) -> i64 {
    minutes * 60 * 1000
}

pub fn evaluate(stored: Option<Session>, now: i64) -> SessionState {
    match stored {
        None => SessionState::Anonymous,
        Some(s) if s.is_expired(now) => SessionState::Expired(s),
        Some(s) => SessionState::Active(s),
    }
}

/// Reads the session, dropping it from the store if it has run out.
pub fn current(conn: &Connection, now: i64) -> anyhow::Result<SessionState> {
    let state = evaluate(store::load_session(conn)?, now);
    if let SessionState::Expired(s) = &state {
        log::info!("session for {} expired", s.email);
        store::clear_session(conn)?;
    }
    Ok(state)
}

pub fn begin(conn: &Connection, email: &str, now: i64, idle_ms: i64) -> anyhow::Result<Session> {
    let s = Session::start(email, now, idle_ms);
    store::save_session(conn, &s)?;
    Ok(s)
}

/// Pushes `expiresAt` forward for an active session. Expired or missing
/// sessions are not revived.
pub fn extend(conn: &Connection, now: i64, idle_ms: i64) -> anyhow::Result<SessionState> {
    match current(conn, now)? {
        SessionState::Active(mut s) => {
            s.expires_at = now + idle_ms;
            store::save_session(conn, &s)?;
            Ok(SessionState::Active(s))
        }
        other => Ok(other),
    }
}

pub fn end(conn: &Connection) -> anyhow::Result<()> {
    store::clear_session(conn)
}

/// Periodic check; returns the session it cleared, if any.
pub fn sweep(conn: &Connection, now: i64) -> anyhow::Result<Option<Session>> {
    match current(conn, now)? {
        SessionState::Expired(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: i64 = 20 * 60 * 1000;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute(
            "CREATE TABLE records(name TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .expect("create records");
        conn
    }

    #[test]
    fn fresh_store_is_anonymous() {
        let conn = memory_db();
        assert_eq!(current(&conn, 0).expect("current"), SessionState::Anonymous);
        assert_eq!(sweep(&conn, 0).expect("sweep"), None);
    }

    #[test]
    fn activity_slides_the_expiry() {
        let conn = memory_db();
        begin(&conn, "t@school.org", 1_000, IDLE).expect("begin");

        let state = extend(&conn, 1_000 + IDLE - 1, IDLE).expect("extend");
        let SessionState::Active(s) = state else {
            panic!("expected active, got {:?}", state);
        };
        assert_eq!(s.expires_at, 1_000 + IDLE - 1 + IDLE);
        assert_eq!(s.created_at, 1_000);

        // Past the original deadline but inside the extended one.
        assert_eq!(
            current(&conn, 1_000 + IDLE + 10).expect("current").as_str(),
            "active"
        );
    }

    #[test]
    fn expiry_is_exclusive_of_the_deadline() {
        let conn = memory_db();
        begin(&conn, "t@school.org", 0, IDLE).expect("begin");
        assert_eq!(current(&conn, IDLE).expect("current").as_str(), "active");
        assert_eq!(current(&conn, IDLE + 1).expect("current").as_str(), "expired");
        // The lazy check cleared the record.
        assert_eq!(current(&conn, IDLE + 1).expect("current"), SessionState::Anonymous);
    }

    #[test]
    fn sweep_clears_expired_sessions_once() {
        let conn = memory_db();
        begin(&conn, "t@school.org", 0, IDLE).expect("begin");
        assert_eq!(sweep(&conn, IDLE).expect("sweep"), None);
        let cleared = sweep(&conn, IDLE + 1).expect("sweep").expect("cleared");
        assert_eq!(cleared.email, "t@school.org");
        assert_eq!(sweep(&conn, IDLE + 2).expect("sweep"), None);
    }

    #[test]
    fn expired_sessions_are_not_revived_by_activity() {
        let conn = memory_db();
        begin(&conn, "t@school.org", 0, IDLE).expect("begin");
        let state = extend(&conn, IDLE + 5, IDLE).expect("extend");
        assert_eq!(state.as_str(), "expired");
        assert_eq!(current(&conn, IDLE + 6).expect("current"), SessionState::Anonymous);
    }
}
