use crate::error::ResultError;
use crate::ipc::error::{err, respond};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use serde::de::DeserializeOwned;

/// Runs `f` against the open workspace, or answers `no_workspace`.
pub fn with_store<F>(state: &AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&SqliteStore<'_>) -> Result<serde_json::Value, ResultError>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let store = SqliteStore::new(conn);
    respond(&req.id, f(&store))
}

/// Like [`with_store`], but answers `empty` instead of `no_workspace`.
pub fn with_store_or<F>(
    state: &AppState,
    req: &Request,
    empty: serde_json::Value,
    f: F,
) -> serde_json::Value
where
    F: FnOnce(&SqliteStore<'_>) -> Result<serde_json::Value, ResultError>,
{
    if state.db.is_none() {
        return respond(&req.id, Ok(empty));
    }
    with_store(state, req, f)
}

pub fn require_str(req: &Request, key: &str) -> Result<String, ResultError> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ResultError::bad_params(format!("missing {key}"))),
    }
}

pub fn require_f64(req: &Request, key: &str) -> Result<f64, ResultError> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ResultError::bad_params(format!("missing/invalid {key}")))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Deserializes the whole params object into a typed input.
pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, ResultError> {
    serde_json::from_value(req.params.clone())
        .map_err(|e| ResultError::bad_params(format!("invalid params: {e}")))
}

/// Rejects blank required text fields, naming the first one found.
pub fn require_non_blank(fields: &[(&str, &str)]) -> Result<(), ResultError> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ResultError::bad_params(format!("{name} must not be empty")));
        }
    }
    Ok(())
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ResultError> {
    serde_json::to_value(value).map_err(|e| ResultError::Io(e.into()))
}
