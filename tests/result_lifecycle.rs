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

struct Seeded {
    student_id: String,
    exam_id: String,
    math_id: String,
    science_id: String,
    english_id: String,
}

fn seed(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) -> Seeded {
    let student = request_ok(
        stdin,
        reader,
        "seed-student",
        "students.create",
        json!({ "rollNumber": "R1", "name": "Asha Rai", "class": "10", "section": "A" }),
    );
    let exam = request_ok(
        stdin,
        reader,
        "seed-exam",
        "exams.create",
        json!({ "name": "Final 2024", "class": "10", "year": 2024, "term": "Final" }),
    );
    let math = request_ok(
        stdin,
        reader,
        "seed-math",
        "subjects.create",
        json!({ "name": "Mathematics", "code": "MATH", "class": "10" }),
    );
    let science = request_ok(
        stdin,
        reader,
        "seed-science",
        "subjects.create",
        json!({ "name": "Science", "code": "SCI", "class": "10", "fullMarks": 100, "passMarks": 33 }),
    );
    let english = request_ok(
        stdin,
        reader,
        "seed-english",
        "subjects.create",
        json!({ "name": "English", "code": "ENG", "class": "10", "fullMarks": 50, "passMarks": 20 }),
    );
    Seeded {
        student_id: id_of(&student, "studentId"),
        exam_id: id_of(&exam, "examId"),
        math_id: id_of(&math, "subjectId"),
        science_id: id_of(&science, "subjectId"),
        english_id: id_of(&english, "subjectId"),
    }
}

#[test]
fn result_create_update_and_marksheet() {
    let workspace = temp_dir("resultd-result-lifecycle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed(&mut stdin, &mut reader);

    let mut result_ids = Vec::new();
    for (i, (subject_id, marks)) in [(&s.math_id, 85), (&s.science_id, 71), (&s.english_id, 34)]
        .into_iter()
        .enumerate()
    {
        let created = request_ok(
            &mut stdin,
            &mut reader,
            &format!("create-{i}"),
            "results.create",
            json!({
                "studentId": s.student_id,
                "examId": s.exam_id,
                "subjectId": subject_id,
                "marks": marks
            }),
        );
        result_ids.push(id_of(&created, "resultId"));
    }

    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "results.forStudentExam",
        json!({ "studentId": s.student_id, "examId": s.exam_id }),
    );
    assert_eq!(sheet.pointer("/summary/totalMarks").and_then(|v| v.as_i64()), Some(190));
    assert_eq!(sheet.pointer("/summary/totalFullMarks").and_then(|v| v.as_i64()), Some(250));
    assert_eq!(sheet.pointer("/summary/percentage").and_then(|v| v.as_str()), Some("76.00"));
    assert_eq!(sheet.pointer("/summary/grade").and_then(|v| v.as_str()), Some("B+"));
    assert_eq!(sheet.pointer("/summary/passStatus").and_then(|v| v.as_str()), Some("PASS"));
    assert_eq!(sheet.pointer("/summary/subjectCount").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(sheet.pointer("/student/rollNumber").and_then(|v| v.as_str()), Some("R1"));
    assert_eq!(sheet.pointer("/exam/name").and_then(|v| v.as_str()), Some("Final 2024"));

    // Science drops below its pass marks.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "results.update",
        json!({ "resultId": result_ids[1], "marks": 20 }),
    );
    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "results.forRollExam",
        json!({ "rollNumber": "R1", "examId": s.exam_id }),
    );
    assert_eq!(sheet.pointer("/summary/totalMarks").and_then(|v| v.as_i64()), Some(139));
    assert_eq!(sheet.pointer("/summary/percentage").and_then(|v| v.as_str()), Some("55.60"));
    assert_eq!(sheet.pointer("/summary/grade").and_then(|v| v.as_str()), Some("C+"));
    assert_eq!(sheet.pointer("/summary/passStatus").and_then(|v| v.as_str()), Some("FAIL"));
    assert_eq!(sheet.pointer("/summary/failedSubjects").and_then(|v| v.as_u64()), Some(1));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4b",
        "results.summary",
        json!({ "studentId": s.student_id, "examId": s.exam_id }),
    );
    assert_eq!(Some(&summary), sheet.get("summary"));

    let listed = request_ok(&mut stdin, &mut reader, "5", "results.list", json!({}));
    assert_eq!(listed.get("count").and_then(|v| v.as_u64()), Some(3));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "results.delete",
        json!({ "resultId": result_ids[2] }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "results.delete",
        json!({ "resultId": result_ids[2] }),
    );
    assert_eq!(code, "result_not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn result_create_rejects_duplicates_and_bad_marks() {
    let workspace = temp_dir("resultd-result-rejects");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed(&mut stdin, &mut reader);
    let create = |subject_id: &str, marks: serde_json::Value| {
        json!({
            "studentId": s.student_id,
            "examId": s.exam_id,
            "subjectId": subject_id,
            "marks": marks
        })
    };

    let value = request(
        &mut stdin,
        &mut reader,
        "2",
        "results.create",
        create(&s.english_id, json!(51)),
    );
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("invalid_marks_range")
    );
    assert_eq!(value.pointer("/error/details/min").and_then(|v| v.as_i64()), Some(0));
    assert_eq!(value.pointer("/error/details/max").and_then(|v| v.as_i64()), Some(50));

    let code = request_err(&mut stdin, &mut reader, "3", "results.create", create(&s.math_id, json!(-1)));
    assert_eq!(code, "invalid_marks_range");
    let code = request_err(&mut stdin, &mut reader, "4", "results.create", create(&s.math_id, json!(50.5)));
    assert_eq!(code, "invalid_marks_range");

    let _ = request_ok(&mut stdin, &mut reader, "5", "results.create", create(&s.math_id, json!(100)));
    let code = request_err(&mut stdin, &mut reader, "6", "results.create", create(&s.math_id, json!(40)));
    assert_eq!(code, "duplicate_result");

    // Existence is checked before marks.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "results.create",
        json!({ "studentId": "nope", "examId": s.exam_id, "subjectId": s.math_id, "marks": 999 }),
    );
    assert_eq!(code, "student_not_found");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "results.create",
        json!({ "studentId": s.student_id, "examId": "nope", "subjectId": s.math_id, "marks": 10 }),
    );
    assert_eq!(code, "exam_not_found");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "9",
        "results.create",
        json!({ "studentId": s.student_id, "examId": s.exam_id, "subjectId": "nope", "marks": 10 }),
    );
    assert_eq!(code, "subject_not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn marksheet_without_results_is_a_zero_pass() {
    let workspace = temp_dir("resultd-result-empty");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed(&mut stdin, &mut reader);

    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "results.forStudentExam",
        json!({ "studentId": s.student_id, "examId": s.exam_id }),
    );
    assert_eq!(sheet.pointer("/summary/subjectCount").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(sheet.pointer("/summary/percentage").and_then(|v| v.as_str()), Some("0.00"));
    assert_eq!(sheet.pointer("/summary/grade").and_then(|v| v.as_str()), Some("F"));
    assert_eq!(sheet.pointer("/summary/passStatus").and_then(|v| v.as_str()), Some("PASS"));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "results.forRollExam",
        json!({ "rollNumber": "R404", "examId": s.exam_id }),
    );
    assert_eq!(code, "student_not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn deleting_a_student_removes_their_results() {
    let workspace = temp_dir("resultd-result-cascade");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "results.create",
        json!({ "studentId": s.student_id, "examId": s.exam_id, "subjectId": s.math_id, "marks": 60 }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "studentId": s.student_id }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "4", "results.list", json!({}));
    assert_eq!(listed.get("count").and_then(|v| v.as_u64()), Some(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "rollNumber": "R2", "name": "Bikash", "class": "10" }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "students.create",
        json!({ "rollNumber": "R2", "name": "Other", "class": "10" }),
    );
    assert_eq!(code, "duplicate_roll_number");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn subject_update_cannot_shrink_below_recorded_marks() {
    let workspace = temp_dir("resultd-subject-shrink");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "results.create",
        json!({ "studentId": s.student_id, "examId": s.exam_id, "subjectId": s.math_id, "marks": 95 }),
    );

    let value = request(
        &mut stdin,
        &mut reader,
        "3",
        "subjects.update",
        json!({
            "subjectId": s.math_id,
            "name": "Mathematics",
            "code": "MATH",
            "class": "10",
            "fullMarks": 50,
            "passMarks": 17
        }),
    );
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("invalid_marks_range")
    );
    assert_eq!(value.pointer("/error/details/max").and_then(|v| v.as_i64()), Some(50));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "results.summary",
        json!({ "studentId": s.student_id, "examId": s.exam_id }),
    );
    assert_eq!(summary.get("totalFullMarks").and_then(|v| v.as_i64()), Some(100));
    assert_eq!(summary.get("percentage").and_then(|v| v.as_str()), Some("95.00"));

    // Raising pass marks leaves recorded marks in range.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "subjects.update",
        json!({
            "subjectId": s.math_id,
            "name": "Mathematics",
            "code": "MATH",
            "class": "10",
            "fullMarks": 100,
            "passMarks": 96
        }),
    );
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "results.summary",
        json!({ "studentId": s.student_id, "examId": s.exam_id }),
    );
    assert_eq!(summary.get("passStatus").and_then(|v| v.as_str()), Some("FAIL"));

    let _ = std::fs::remove_dir_all(workspace);
}
