use crate::expand::{expand, preview};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_preview(req: &Request) -> serde_json::Value {
    let input = match helpers::parse_bulk_input(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    match preview(&input) {
        Ok(p) => {
            let dates: Vec<String> = p
                .dates
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect();
            ok(
                &req.id,
                json!({
                    "count": p.count,
                    "dates": dates,
                    "classes": p.classes,
                }),
            )
        }
        Err(e) => err(&req.id, &e.code, e.message, None),
    }
}

fn handle_expand(req: &Request) -> serde_json::Value {
    let input = match helpers::parse_bulk_input(&req.params) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };
    match expand(&input) {
        Ok(requests) => {
            let rows: Vec<serde_json::Value> = requests
                .iter()
                .map(|r| serde_json::to_value(r).unwrap_or_else(|_| json!(null)))
                .collect();
            ok(&req.id, json!({ "requests": rows }))
        }
        Err(e) => err(&req.id, &e.code, e.message, None),
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bulk.expand.preview" => Some(handle_preview(req)),
        "bulk.expand" => Some(handle_expand(req)),
        _ => None,
    }
}
