use crate::error::ResultError;
use crate::ipc::helpers::{
    parse_params, require_non_blank, require_str, to_json, with_store, with_store_or,
};
use crate::ipc::types::{AppState, Request};
use crate::model::ExamInput;
use crate::store::EntityStore;
use serde_json::json;

fn exam_input(req: &Request) -> Result<ExamInput, ResultError> {
    let input: ExamInput = parse_params(req)?;
    require_non_blank(&[
        ("name", input.name.as_str()),
        ("class", input.class.as_str()),
        ("term", input.term.as_str()),
    ])?;
    if input.year <= 0 {
        return Err(ResultError::bad_params("year must be > 0"));
    }
    Ok(input)
}

fn handle_exams_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store_or(state, req, json!({ "exams": [] }), |store| {
        let exams = store.list_exams()?;
        Ok(json!({ "count": exams.len(), "exams": to_json(&exams)? }))
    })
}

fn handle_exams_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "examId")?;
        let exam = store.exam(&id)?.ok_or(ResultError::ExamNotFound)?;
        Ok(json!({ "exam": to_json(&exam)? }))
    })
}

fn handle_exams_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let input = exam_input(req)?;
        let id = store.insert_exam(&input)?;
        tracing::info!(exam_id = %id, name = %input.name, "exam created");
        Ok(json!({ "examId": id }))
    })
}

fn handle_exams_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "examId")?;
        let input = exam_input(req)?;
        store.update_exam(&id, &input)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_exams_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "examId")?;
        store.delete_exam(&id)?;
        tracing::info!(exam_id = %id, "exam deleted");
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exams.list" => Some(handle_exams_list(state, req)),
        "exams.get" => Some(handle_exams_get(state, req)),
        "exams.create" => Some(handle_exams_create(state, req)),
        "exams.update" => Some(handle_exams_update(state, req)),
        "exams.delete" => Some(handle_exams_delete(state, req)),
        _ => None,
    }
}
