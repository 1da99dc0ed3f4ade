use crate::error::ResultError;
use crate::ipc::helpers::{
    parse_params, require_non_blank, require_str, to_json, with_store, with_store_or,
};
use crate::ipc::types::{AppState, Request};
use crate::model::StudentInput;
use crate::store::EntityStore;
use serde_json::json;

fn student_input(req: &Request) -> Result<StudentInput, ResultError> {
    let input: StudentInput = parse_params(req)?;
    require_non_blank(&[
        ("rollNumber", input.roll_number.as_str()),
        ("name", input.name.as_str()),
        ("class", input.class.as_str()),
    ])?;
    Ok(StudentInput {
        roll_number: input.roll_number.trim().to_string(),
        name: input.name.trim().to_string(),
        class: input.class.trim().to_string(),
        ..input
    })
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store_or(state, req, json!({ "students": [] }), |store| {
        let students = store.list_students()?;
        Ok(json!({ "count": students.len(), "students": to_json(&students)? }))
    })
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let name = require_str(req, "name")?;
        let students = store.search_students(&name)?;
        Ok(json!({ "count": students.len(), "students": to_json(&students)? }))
    })
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "studentId")?;
        let student = store.student(&id)?.ok_or(ResultError::StudentNotFound)?;
        Ok(json!({ "student": to_json(&student)? }))
    })
}

fn handle_students_get_by_roll(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let roll = require_str(req, "rollNumber")?;
        let student = store
            .student_by_roll(&roll)?
            .ok_or(ResultError::StudentNotFound)?;
        Ok(json!({ "student": to_json(&student)? }))
    })
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let input = student_input(req)?;
        let id = store.insert_student(&input)?;
        tracing::info!(student_id = %id, roll_number = %input.roll_number, "student created");
        Ok(json!({ "studentId": id }))
    })
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "studentId")?;
        let input = student_input(req)?;
        store.update_student(&id, &input)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "studentId")?;
        store.delete_student(&id)?;
        tracing::info!(student_id = %id, "student deleted");
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.getByRoll" => Some(handle_students_get_by_roll(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
