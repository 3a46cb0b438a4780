use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, required_sequence};
use crate::ipc::types::{AppState, Request};
use crate::report::ResultView;
use serde_json::json;

fn handle_compute_sequence(state: &mut AppState, req: &Request) -> serde_json::Value {
    let seq = match required_sequence(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let cache = state.gradebook.recompute_sequence(seq);
    ok(&req.id, json!({ "computed": true, "results": cache }))
}

fn handle_compute_terms(state: &mut AppState, req: &Request) -> serde_json::Value {
    let outcome = state.gradebook.recompute_terms();
    let cache = state.gradebook.results();
    ok(
        &req.id,
        json!({
            "computed": outcome,
            "firstTerm": cache.first_term,
            "secondTerm": cache.second_term,
            "thirdTerm": cache.third_term,
            "annual": cache.annual,
        }),
    )
}

fn handle_results_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let cache = state.gradebook.results();
    let Some(raw) = optional_str(req, "view") else {
        return ok(&req.id, json!({ "results": cache }));
    };
    let Some(view) = ResultView::parse(raw) else {
        return err(
            &req.id,
            "bad_params",
            "view must be one of: sequence, firstTerm, secondTerm, thirdTerm, annual",
            Some(json!({ "view": raw })),
        );
    };
    let result = match view {
        ResultView::Sequence => json!(cache.sequence),
        ResultView::Term(term) => json!(cache.term(term)),
        ResultView::Annual => json!(cache.annual),
    };
    ok(&req.id, json!({ "view": view.as_str(), "results": result }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.computeSequence" => Some(handle_compute_sequence(state, req)),
        "results.computeTerms" => Some(handle_compute_terms(state, req)),
        "results.get" => Some(handle_results_get(state, req)),
        _ => None,
    }
}
