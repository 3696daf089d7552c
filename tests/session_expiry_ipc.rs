mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use std::path::Path;
use test_support::{request_err, request_ok, spawn_sidecar, spawn_sidecar_with_env, temp_dir};

/// Leaves a session record whose deadline has already passed, as if the
/// daemon had been stopped mid-session.
fn write_stale_session(workspace: &Path) {
    let conn = rusqlite::Connection::open(workspace.join("attendance.sqlite3")).expect("open db");
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records(name TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )
    .expect("create records");
    let session = json!({ "email": "staff@school.test", "createdAt": 1000, "expiresAt": 2000 });
    conn.execute(
        "INSERT INTO records(name, value) VALUES('sessionUser', ?)",
        [session.to_string()],
    )
    .expect("insert session");
}

#[test]
fn expired_session_is_reported_once_then_cleared() {
    let workspace = temp_dir("attendanced-expired");
    write_stale_session(&workspace);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = request_err(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(first, "session_expired");
    let second = request_err(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(second, "no_session");
    let session = request_ok(&mut stdin, &mut reader, "4", "session.get", json!({}));
    assert_eq!(session.get("state"), Some(&json!("anonymous")));
}

#[test]
fn sweep_emits_a_single_expiry_event() {
    let workspace = temp_dir("attendanced-sweep");
    write_stale_session(&workspace);
    let (_child, mut stdin, mut reader) =
        spawn_sidecar_with_env(&[("ATTENDANCED_SWEEP_SECONDS", "1")]);
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let mut line = String::new();
    reader.read_line(&mut line).expect("read event line");
    let event: serde_json::Value = serde_json::from_str(line.trim()).expect("parse event");
    assert_eq!(event.get("event"), Some(&json!("session.expired")));
    assert_eq!(
        event.pointer("/payload/email"),
        Some(&json!("staff@school.test"))
    );
    assert_eq!(event.pointer("/payload/expiredAt"), Some(&json!(2000)));
    assert_eq!(event.pointer("/payload/redirect"), Some(&json!("login")));

    // Let more sweeps pass; the next line must be the reply, not another event.
    std::thread::sleep(std::time::Duration::from_millis(2500));
    writeln!(stdin, "{}", json!({ "id": "2", "method": "health", "params": {} }))
        .expect("write request");
    stdin.flush().expect("flush request");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read reply");
    let reply: serde_json::Value = serde_json::from_str(line.trim()).expect("parse reply");
    assert_eq!(reply.get("id"), Some(&json!("2")));
    assert_eq!(reply.get("ok"), Some(&json!(true)));
}
