use crate::error::ResultError;
use crate::ipc::helpers::{
    parse_params, require_non_blank, require_str, to_json, with_store, with_store_or,
};
use crate::ipc::types::{AppState, Request};
use crate::model::AnnouncementInput;
use crate::store::EntityStore;
use serde_json::json;

fn announcement_input(req: &Request) -> Result<AnnouncementInput, ResultError> {
    let input: AnnouncementInput = parse_params(req)?;
    require_non_blank(&[
        ("title", input.title.as_str()),
        ("content", input.content.as_str()),
    ])?;
    Ok(input)
}

fn list(state: &mut AppState, req: &Request, active_only: bool) -> serde_json::Value {
    with_store_or(state, req, json!({ "announcements": [] }), |store| {
        let items = store.list_announcements(active_only)?;
        Ok(json!({ "count": items.len(), "announcements": to_json(&items)? }))
    })
}

fn handle_announcements_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "announcementId")?;
        let item = store
            .announcement(&id)?
            .ok_or(ResultError::AnnouncementNotFound)?;
        Ok(json!({ "announcement": to_json(&item)? }))
    })
}

fn handle_announcements_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let input = announcement_input(req)?;
        let id = store.insert_announcement(&input)?;
        Ok(json!({ "announcementId": id }))
    })
}

fn handle_announcements_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "announcementId")?;
        let input = announcement_input(req)?;
        store.update_announcement(&id, &input)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_announcements_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let id = require_str(req, "announcementId")?;
        store.delete_announcement(&id)?;
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "announcements.list" => Some(list(state, req, false)),
        "announcements.active" => Some(list(state, req, true)),
        "announcements.get" => Some(handle_announcements_get(state, req)),
        "announcements.create" => Some(handle_announcements_create(state, req)),
        "announcements.update" => Some(handle_announcements_update(state, req)),
        "announcements.delete" => Some(handle_announcements_delete(state, req)),
        _ => None,
    }
}
