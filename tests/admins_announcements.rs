use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultd");
    let mut child = Command::new(exe)
        .env_remove("RESULTD_WORKSPACE")
        .env_remove("RESULTD_ADMIN_PASSWORD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .pointer("/error/code")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn id_of(result: &serde_json::Value, key: &str) -> String {
    result
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing {} in {}", key, result))
        .to_string()
}

fn spawn_sidecar_with_args(args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultd");
    let mut child = Command::new(exe)
        .args(args)
        .env_remove("RESULTD_WORKSPACE")
        .env_remove("RESULTD_ADMIN_PASSWORD")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

#[test]
fn announcements_crud_and_active_filter() {
    let workspace = temp_dir("resultd-announcements");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "announcements.create",
        json!({ "title": "Results published", "content": "Final exam results are out." }),
    );
    let published_id = id_of(&created, "announcementId");
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "announcements.create",
        json!({ "title": "Draft", "content": "Not yet", "isActive": false }),
    );
    let draft_id = id_of(&created, "announcementId");

    let active = request_ok(&mut stdin, &mut reader, "4", "announcements.active", json!({}));
    assert_eq!(active.get("count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(
        active.pointer("/announcements/0/id").and_then(|v| v.as_str()),
        Some(published_id.as_str())
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "announcements.update",
        json!({ "announcementId": draft_id, "title": "Draft", "content": "Now live", "isActive": true }),
    );
    let all = request_ok(&mut stdin, &mut reader, "6", "announcements.active", json!({}));
    assert_eq!(all.get("count").and_then(|v| v.as_u64()), Some(2));

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "announcements.get",
        json!({ "announcementId": draft_id }),
    );
    assert_eq!(
        got.pointer("/announcement/content").and_then(|v| v.as_str()),
        Some("Now live")
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "announcements.delete",
        json!({ "announcementId": published_id }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "announcements.get",
        json!({ "announcementId": published_id }),
    );
    assert_eq!(code, "announcement_not_found");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "10",
        "announcements.create",
        json!({ "title": "", "content": "x" }),
    );
    assert_eq!(code, "bad_params");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn admins_create_list_and_verify() {
    let workspace = temp_dir("resultd-admins");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let empty = request_ok(&mut stdin, &mut reader, "2", "admins.list", json!({}));
    assert_eq!(
        empty.get("admins").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "admins.create",
        json!({ "username": "principal", "password": "s3cret!", "name": "Principal", "email": "p@school.test" }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "admins.create",
        json!({ "username": "principal", "password": "another1", "name": "Dup" }),
    );
    assert_eq!(code, "duplicate_username");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "admins.create",
        json!({ "username": "clerk", "password": "123", "name": "Clerk" }),
    );
    assert_eq!(code, "bad_params");

    let listed = request_ok(&mut stdin, &mut reader, "6", "admins.list", json!({}));
    let admins = listed.get("admins").and_then(|v| v.as_array()).expect("admins");
    assert_eq!(admins.len(), 1);
    assert!(admins[0].get("passwordHash").is_none());

    let verified = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "admins.verify",
        json!({ "username": "principal", "password": "s3cret!" }),
    );
    assert_eq!(
        verified.pointer("/admin/email").and_then(|v| v.as_str()),
        Some("p@school.test")
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "admins.verify",
        json!({ "username": "principal", "password": "wrong-password" }),
    );
    assert_eq!(code, "invalid_credentials");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn configured_default_admin_is_seeded_on_open() {
    let workspace = temp_dir("resultd-admin-seed");
    let ws = workspace.to_string_lossy().to_string();
    let (_child, mut stdin, mut reader) = spawn_sidecar_with_args(&[
        "--workspace",
        &ws,
        "--admin-username",
        "headteacher",
        "--admin-password",
        "opensesame",
    ]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health.get("workspacePath").and_then(|v| v.as_str()),
        Some(ws.as_str())
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "admins.list", json!({}));
    assert_eq!(
        listed.pointer("/admins/0/username").and_then(|v| v.as_str()),
        Some("headteacher")
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "admins.verify",
        json!({ "username": "headteacher", "password": "opensesame" }),
    );

    let _ = std::fs::remove_dir_all(workspace);
}
