use crate::auth;
use crate::ipc::helpers::{optional_str, require_str, to_json, with_store, with_store_or};
use crate::ipc::types::{AppState, Request};
use crate::store::EntityStore;
use serde_json::json;

fn handle_admins_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store_or(state, req, json!({ "admins": [] }), |store| {
        let admins = store.list_admins()?;
        Ok(json!({ "admins": to_json(&admins)? }))
    })
}

fn handle_admins_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let username = require_str(req, "username")?;
        let password = require_str(req, "password")?;
        let name = require_str(req, "name")?;
        let email = optional_str(req, "email");
        let id = auth::create_admin(store, &username, &password, &name, email.as_deref())?;
        Ok(json!({ "adminId": id }))
    })
}

fn handle_admins_verify(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_store(state, req, |store| {
        let username = require_str(req, "username")?;
        let password = require_str(req, "password")?;
        let admin = auth::verify_admin(store, &username, &password)?;
        Ok(json!({ "admin": to_json(&admin)? }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admins.list" => Some(handle_admins_list(state, req)),
        "admins.create" => Some(handle_admins_create(state, req)),
        "admins.verify" => Some(handle_admins_verify(state, req)),
        _ => None,
    }
}
