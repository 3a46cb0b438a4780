use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{persist, required_index, required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::CommentSlot;
use crate::store::Collection;
use serde_json::json;

fn handle_comments_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    if req.params.get("studentIndex").is_none() {
        return ok(&req.id, json!({ "comments": state.gradebook.comments() }));
    }
    let index = match required_index(req, "studentIndex") {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "studentIndex": index,
            "comments": state.gradebook.comments().for_student(index).cloned().unwrap_or_default(),
        }),
    )
}

fn handle_comments_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "studentIndex") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let slot_raw = match required_str(req, "slot") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(slot) = CommentSlot::parse(&slot_raw) else {
        return err(
            &req.id,
            "bad_params",
            "slot must be a sequence id or 'annual'",
            Some(json!({ "slot": slot_raw })),
        );
    };
    let text = req
        .params
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let changed = state.gradebook.set_comment(index, slot, text);
    if changed {
        if let Err(e) = persist(state, req, &[Collection::Comments]) {
            return e;
        }
    }
    ok(&req.id, json!({ "changed": changed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "comments.get" => Some(handle_comments_get(state, req)),
        "comments.set" => Some(handle_comments_set(state, req)),
        _ => None,
    }
}
