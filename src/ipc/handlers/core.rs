use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::schedule::ScheduleItem;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "itemsLoaded": state.items.as_ref().map(|items| items.len())
        }),
    )
}

/// Reads an item snapshot exported by the host: either a bare JSON array or
/// an object wrapping one under `items`.
fn read_snapshot(path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    match parsed {
        serde_json::Value::Array(rows) => Ok(rows),
        serde_json::Value::Object(mut obj) => match obj.remove("items") {
            Some(serde_json::Value::Array(rows)) => Ok(rows),
            _ => anyhow::bail!("snapshot must be an array or an object with an items array"),
        },
        _ => anyhow::bail!("snapshot must be an array or an object with an items array"),
    }
}

fn handle_items_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw_rows: Vec<serde_json::Value> = match req.params.get("items") {
        Some(v) if !v.is_null() => {
            let Some(rows) = v.as_array() else {
                return err(&req.id, "bad_params", "items must be an array", None);
            };
            rows.clone()
        }
        _ => {
            let path = match req.params.get("path").and_then(|v| v.as_str()) {
                Some(p) => PathBuf::from(p),
                None => return err(&req.id, "bad_params", "missing items or path", None),
            };
            match read_snapshot(&path) {
                Ok(rows) => rows,
                Err(e) => return err(&req.id, "io_failed", format!("{e:#}"), None),
            }
        }
    };

    let mut items: Vec<ScheduleItem> = Vec::with_capacity(raw_rows.len());
    for (idx, raw) in raw_rows.iter().enumerate() {
        match helpers::parse_item(raw, idx) {
            Ok(item) => items.push(item),
            Err(message) => {
                // Reject the whole load; a half-loaded collection would
                // silently skew every count downstream.
                return err(
                    &req.id,
                    "bad_params",
                    message,
                    Some(json!({ "index": idx })),
                );
            }
        }
    }

    let loaded = items.len();
    state.items = Some(items);
    ok(&req.id, json!({ "loaded": loaded }))
}

fn handle_items_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.items = None;
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "items.load" => Some(handle_items_load(state, req)),
        "items.clear" => Some(handle_items_clear(state, req)),
        _ => None,
    }
}
