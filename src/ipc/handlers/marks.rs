use crate::gradebook::MarkEdit;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    mark_input_text, optional_str, parse_sequence, persist, required_index, required_sequence,
    required_str,
};
use crate::ipc::types::{AppState, Request};
use crate::store::Collection;
use serde_json::json;

const MARKS_BULK_MAX_EDITS: usize = 5000;

fn handle_marks_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let marks = state.gradebook.marks();
    let Some(raw) = optional_str(req, "sequence") else {
        return ok(&req.id, json!({ "marks": marks }));
    };
    let seq = match parse_sequence(req, raw) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows: Vec<serde_json::Value> = marks
        .iter()
        .enumerate()
        .map(|(index, m)| json!({ "studentIndex": index, "marks": m.sequence(seq) }))
        .collect();
    ok(&req.id, json!({ "sequence": seq.as_str(), "rows": rows }))
}

fn handle_marks_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match required_index(req, "studentIndex") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let seq = match required_sequence(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject = match required_str(req, "subject") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let applied = match mark_input_text(req.params.get("value")) {
        Some(value) => state.gradebook.set_mark(student, seq, &subject, &value),
        None => false,
    };
    if applied {
        if let Err(e) = persist(state, req, &[Collection::Marks]) {
            return e;
        }
    }
    ok(&req.id, json!({ "applied": applied }))
}

fn handle_marks_bulk_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seq = match required_sequence(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(edits_arr) = req.params.get("edits").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing edits[]", None);
    };

    if edits_arr.len() > MARKS_BULK_MAX_EDITS {
        return ok(
            &req.id,
            json!({
                "updated": 0,
                "rejected": edits_arr.len(),
                "limitExceeded": true,
                "maxEdits": MARKS_BULK_MAX_EDITS,
            }),
        );
    }

    // Malformed entries and non-mark values count as rejections, like an
    // out-of-range value would.
    let mut malformed = 0_usize;
    let mut edits: Vec<MarkEdit> = Vec::with_capacity(edits_arr.len());
    for edit in edits_arr {
        let student = edit
            .get("studentIndex")
            .and_then(|v| v.as_i64())
            .filter(|v| *v >= 0);
        let subject = edit.get("subject").and_then(|v| v.as_str());
        let value = mark_input_text(edit.get("value"));
        match (student, subject, value) {
            (Some(student), Some(subject), Some(value)) => edits.push(MarkEdit {
                student: student as usize,
                subject: subject.to_string(),
                value,
            }),
            _ => malformed += 1,
        }
    }

    let outcome = state.gradebook.bulk_set_marks(seq, &edits);
    if outcome.updated > 0 {
        if let Err(e) = persist(state, req, &[Collection::Marks]) {
            return e;
        }
    }
    ok(
        &req.id,
        json!({
            "updated": outcome.updated,
            "rejected": outcome.rejected + malformed,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.get" => Some(handle_marks_get(state, req)),
        "marks.set" => Some(handle_marks_set(state, req)),
        "marks.bulkSet" => Some(handle_marks_bulk_set(state, req)),
        _ => None,
    }
}
