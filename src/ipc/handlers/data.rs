use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::warn;

fn handle_data_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    let confirmed = req
        .params
        .get("confirm")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !confirmed {
        return err(
            &req.id,
            "confirm_required",
            "data.reset needs confirm: true",
            None,
        );
    }

    state.gradebook.reset();
    if let Err(e) = state.store.clear() {
        warn!(error = %format!("{e:#}"), "store clear failed");
        return err(&req.id, "store_failed", format!("{e:#}"), None);
    }
    ok(&req.id, json!({ "reset": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "data.reset" => Some(handle_data_reset(state, req)),
        _ => None,
    }
}
