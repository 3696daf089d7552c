use crate::accounts::Account;
use crate::db;
use crate::model::{AttendanceBook, Student};
use crate::session::Session;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Accounts,
    Session,
    Students,
    Attendance,
}

impl Record {
    /// Names kept from the browser build so exported localStorage dumps line up.
    pub fn name(self) -> &'static str {
        match self {
            Record::Accounts => "users",
            Record::Session => "sessionUser",
            Record::Students => "students",
            Record::Attendance => "attendance",
        }
    }
}

/// Reads a record, substituting the empty default when it is missing or does
/// not parse. Only storage failures are returned as errors.
fn load_or_default<T>(conn: &Connection, record: Record) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = db::record_get(conn, record.name())? else {
        return Ok(T::default());
    };
    match serde_json::from_str::<Option<T>>(&raw) {
        Ok(v) => Ok(v.unwrap_or_default()),
        Err(e) => {
            log::warn!(
                "record {:?} is malformed, falling back to empty: {}",
                record.name(),
                e
            );
            Ok(T::default())
        }
    }
}

fn save<T: Serialize>(conn: &Connection, record: Record, value: &T) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    db::record_set(conn, record.name(), &raw)
}

pub fn load_accounts(conn: &Connection) -> anyhow::Result<Vec<Account>> {
    load_or_default(conn, Record::Accounts)
}

pub fn save_accounts(conn: &Connection, accounts: &[Account]) -> anyhow::Result<()> {
    save(conn, Record::Accounts, &accounts)
}

pub fn load_session(conn: &Connection) -> anyhow::Result<Option<Session>> {
    load_or_default(conn, Record::Session)
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    save(conn, Record::Session, session)
}

pub fn clear_session(conn: &Connection) -> anyhow::Result<()> {
    db::record_remove(conn, Record::Session.name())
}

pub fn load_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    load_or_default(conn, Record::Students)
}

pub fn save_students(conn: &Connection, students: &[Student]) -> anyhow::Result<()> {
    save(conn, Record::Students, &students)
}

pub fn load_attendance(conn: &Connection) -> anyhow::Result<AttendanceBook> {
    let book: AttendanceBook = load_or_default(conn, Record::Attendance)?;
    if let Err(e) = book.validate() {
        log::warn!("stored attendance rejected, falling back to empty: {}", e);
        return Ok(AttendanceBook::default());
    }
    Ok(book)
}

pub fn save_attendance(conn: &Connection, book: &AttendanceBook) -> anyhow::Result<()> {
    save(conn, Record::Attendance, book)
}

/// Writes roster and attendance in one transaction so the cascade between
/// them survives a failed write.
pub fn save_dashboard(
    conn: &Connection,
    students: &[Student],
    book: &AttendanceBook,
) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    save_students(&tx, students)?;
    save_attendance(&tx, book)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StudentId, YearMonth};

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
    fn missing_records_load_as_empty() {
        let conn = memory_db();
        assert!(load_accounts(&conn).expect("accounts").is_empty());
        assert!(load_session(&conn).expect("session").is_none());
        assert!(load_students(&conn).expect("students").is_empty());
        assert_eq!(load_attendance(&conn).expect("attendance").student_count(), 0);
    }

    #[test]
    fn malformed_records_fail_open() {
        let conn = memory_db();
        for record in [
            Record::Accounts,
            Record::Session,
            Record::Students,
            Record::Attendance,
        ] {
            db::record_set(&conn, record.name(), "{not json").expect("write garbage");
        }
        assert!(load_accounts(&conn).expect("accounts").is_empty());
        assert!(load_session(&conn).expect("session").is_none());
        assert!(load_students(&conn).expect("students").is_empty());
        assert_eq!(load_attendance(&conn).expect("attendance").student_count(), 0);

        db::record_set(&conn, Record::Students.name(), "null").expect("write null");
        assert!(load_students(&conn).expect("students").is_empty());
    }

    #[test]
    fn attendance_survives_a_save_load_cycle() {
        let conn = memory_db();
        let id = StudentId::new("s1");
        let ym = YearMonth::new(2025, 1).expect("ym");
        let mut book = AttendanceBook::default();
        book.set(&id, ym, 4, true);
        save_attendance(&conn, &book).expect("save");

        let raw = db::record_get(&conn, "attendance")
            .expect("read")
            .expect("present");
        assert_eq!(raw, r#"{"s1":{"2025-01":{"4":true}}}"#);
        assert_eq!(load_attendance(&conn).expect("load"), book);
    }

    #[test]
    fn failed_attendance_write_rolls_back_the_roster() {
        let conn = memory_db();
        let id = StudentId::new("s1");
        let students = vec![Student {
            id: id.clone(),
            name: "Rahul Singh".to_string(),
            roll: "3".to_string(),
            class_label: "10".to_string(),
            section: "B".to_string(),
            contact: "9000000003".to_string(),
        }];
        let mut book = AttendanceBook::default();
        book.set(&id, YearMonth::new(2025, 1).expect("ym"), 2, true);
        save_dashboard(&conn, &students, &book).expect("first save");

        conn.execute_batch(
            "CREATE TRIGGER reject_attendance BEFORE UPDATE ON records
             WHEN NEW.name = 'attendance'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .expect("create trigger");
        book.remove_student(&id);
        assert!(save_dashboard(&conn, &[], &book).is_err());

        assert_eq!(load_students(&conn).expect("students"), students);
        assert_eq!(load_attendance(&conn).expect("attendance").student_count(), 1);
    }

    #[test]
    fn clearing_the_session_removes_the_record() {
        let conn = memory_db();
        let s = Session {
            email: "a@b.c".to_string(),
            created_at: 1,
            expires_at: 2,
        };
        save_session(&conn, &s).expect("save");
        assert_eq!(load_session(&conn).expect("load"), Some(s));
        clear_session(&conn).expect("clear");
        assert!(load_session(&conn).expect("load").is_none());
    }
}
