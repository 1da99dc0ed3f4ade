use crate::error::ResultError;
use crate::ipc::helpers::{
    parse_params, require_non_blank, require_str, to_json, with_store, with_store_or,
};
use crate::ipc::types::{AppState, Request};
use crate::marks::{self, validate_subject_input};
use crate::model::SubjectInput;
use crate::store::EntityStore;
use serde_json::json;

fn subject_input(req: &Request) -> Result<SubjectInput, ResultError> {
    let input: SubjectInput = parse_params(req)?;
    require_non_blank(&[
        ("name", input.name.as_str()),
        ("code", input.code.as_str()),
        ("class", input.class.as_str()),
    ])?;
    validate_subject_input(&input)?;
    Ok(SubjectInput {
        code: input.code.trim().to_string(),
        ..input
    })
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store_or(state, req, json!({ "subjects": [] }), |store| {
        let subjects = store.list_subjects()?;
        Ok(json!({ "count": subjects.len(), "subjects": to_json(&subjects)? }))
    })
}

fn handle_subjects_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "subjectId")?;
        let subject = store.subject(&id)?.ok_or(ResultError::SubjectNotFound)?;
        Ok(json!({ "subject": to_json(&subject)? }))
    })
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let input = subject_input(req)?;
        let id = store.insert_subject(&input)?;
        tracing::info!(subject_id = %id, code = %input.code, "subject created");
        Ok(json!({ "subjectId": id }))
    })
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "subjectId")?;
        let input = subject_input(req)?;
        marks::update_subject(store, &id, &input)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "subjectId")?;
        store.delete_subject(&id)?;
        tracing::info!(subject_id = %id, "subject deleted");
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.get" => Some(handle_subjects_get(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
