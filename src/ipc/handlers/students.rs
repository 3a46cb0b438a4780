use crate::ipc::error::ok;
use crate::ipc::helpers::{persist, required_index, required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::Collection;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let students: Vec<serde_json::Value> = state
        .gradebook
        .students()
        .iter()
        .enumerate()
        .map(|(index, name)| json!({ "index": index, "name": name }))
        .collect();
    ok(&req.id, json!({ "students": students }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let index = state.gradebook.add_student(name);
    if let Err(e) = persist(state, req, &[Collection::Students, Collection::Marks]) {
        return e;
    }
    ok(&req.id, json!({ "index": index }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let changed = state.gradebook.edit_student(index, name);
    if changed {
        if let Err(e) = persist(state, req, &[Collection::Students]) {
            return e;
        }
    }
    ok(&req.id, json!({ "changed": changed }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let changed = state.gradebook.delete_student(index);
    if changed {
        if let Err(e) = persist(
            state,
            req,
            &[Collection::Students, Collection::Marks, Collection::Comments],
        ) {
            return e;
        }
    }
    ok(&req.id, json!({ "changed": changed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
