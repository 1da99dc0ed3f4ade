use crate::error::ResultError;
use crate::grading;
use crate::import::{self, RawImportRow};
use crate::ipc::helpers::{require_f64, require_str, to_json, with_store, with_store_or};
use crate::ipc::types::{AppState, Request};
use crate::marks;
use crate::store::EntityStore;
use serde_json::json;
use std::path::PathBuf;

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store_or(state, req, json!({ "results": [] }), |store| {
        let results = store.list_results()?;
        Ok(json!({ "count": results.len(), "results": to_json(&results)? }))
    })
}

fn handle_results_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let student_id = require_str(req, "studentId")?;
        let exam_id = require_str(req, "examId")?;
        let subject_id = require_str(req, "subjectId")?;
        let marks = require_f64(req, "marks")?;
        let id = marks::create_result(store, &student_id, &exam_id, &subject_id, marks)?;
        Ok(json!({ "resultId": id }))
    })
}

fn handle_results_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let result_id = require_str(req, "resultId")?;
        let marks = require_f64(req, "marks")?;
        marks::update_result(store, &result_id, marks)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_results_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let result_id = require_str(req, "resultId")?;
        marks::delete_result(store, &result_id)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_results_for_student_exam(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let student_id = require_str(req, "studentId")?;
        let exam_id = require_str(req, "examId")?;
        to_json(&grading::marksheet(store, &student_id, &exam_id)?)
    })
}

fn handle_results_for_roll_exam(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let roll = require_str(req, "rollNumber")?;
        let exam_id = require_str(req, "examId")?;
        to_json(&grading::marksheet_by_roll(store, &roll, &exam_id)?)
    })
}

fn handle_results_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let student_id = require_str(req, "studentId")?;
        let exam_id = require_str(req, "examId")?;
        to_json(&grading::aggregate(store, &student_id, &exam_id)?)
    })
}

fn handle_results_import_bulk(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let exam_id = require_str(req, "examId")?;
        let Some(rows) = req.params.get("rows").and_then(|v| v.as_array()) else {
            return Err(ResultError::bad_params("missing rows[]"));
        };
        let rows: Vec<RawImportRow> = rows.iter().map(RawImportRow::from_json).collect();
        to_json(&import::reconcile(store, &exam_id, rows)?)
    })
}

fn handle_results_import_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let exam_id = require_str(req, "examId")?;
        let path = PathBuf::from(require_str(req, "path")?);
        if !path.is_file() {
            return Err(ResultError::bad_params(format!(
                "csv file not found: {}",
                path.to_string_lossy()
            )));
        }
        let rows = import::read_csv_rows(&path)?;
        to_json(&import::reconcile(store, &exam_id, rows)?)
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.list" => Some(handle_results_list(state, req)),
        "results.create" => Some(handle_results_create(state, req)),
        "results.update" => Some(handle_results_update(state, req)),
        "results.delete" => Some(handle_results_delete(state, req)),
        "results.forStudentExam" => Some(handle_results_for_student_exam(state, req)),
        "results.forRollExam" => Some(handle_results_for_roll_exam(state, req)),
        "results.summary" => Some(handle_results_summary(state, req)),
        "results.importBulk" => Some(handle_results_import_bulk(state, req)),
        "results.importCsv" => Some(handle_results_import_csv(state, req)),
        _ => None,
    }
}
