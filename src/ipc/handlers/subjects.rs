use crate::ipc::error::{err, gradebook_err, ok};
use crate::ipc::helpers::{optional_str, persist, required_f64, required_index, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::Collection;
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "subjects": state.gradebook.subjects() }))
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let total = match required_f64(req, "total") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let index = match state.gradebook.add_subject(name, total) {
        Ok(v) => v,
        Err(e) => return gradebook_err(&req.id, e),
    };
    if let Err(e) = persist(state, req, &[Collection::Subjects]) {
        return e;
    }
    ok(&req.id, json!({ "index": index }))
}

fn handle_subjects_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let total = match required_f64(req, "total") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let changed = match state.gradebook.edit_subject(index, name, total) {
        Ok(v) => v,
        Err(e) => return gradebook_err(&req.id, e),
    };
    if changed {
        if let Err(e) = persist(state, req, &[Collection::Subjects, Collection::Marks]) {
            return e;
        }
    }
    ok(&req.id, json!({ "changed": changed }))
}

/// Deletes by `name`, or by `index` when no name is given.
fn handle_subjects_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let changed = if let Some(name) = optional_str(req, "name") {
        state.gradebook.delete_subject(name)
    } else {
        match required_index(req, "index") {
            Ok(index) => state.gradebook.delete_subject_at(index),
            Err(_) => {
                return err(&req.id, "bad_params", "missing name or index", None);
            }
        }
    };
    if changed {
        if let Err(e) = persist(state, req, &[Collection::Subjects, Collection::Marks]) {
            return e;
        }
    }
    ok(&req.id, json!({ "changed": changed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.list" => Some(handle_subjects_list(state, req)),
        "subjects.create" => Some(handle_subjects_create(state, req)),
        "subjects.update" => Some(handle_subjects_update(state, req)),
        "subjects.delete" => Some(handle_subjects_delete(state, req)),
        _ => None,
    }
}
