use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str, required_index, required_str};
use crate::ipc::types::{AppState, Request};
use crate::report::{self, JsonDirSink, ReportSink, ResultView};
use serde_json::json;
use tracing::warn;

fn report_sink(state: &AppState, req: &Request) -> JsonDirSink {
    let dir = state
        .config
        .resolve_report_dir(optional_str(req, "outDir"), state.workspace.as_deref());
    JsonDirSink::new(dir)
}

fn export_failed(req: &Request, e: anyhow::Error) -> serde_json::Value {
    warn!(method = %req.method, error = %format!("{e:#}"), "report export failed");
    err(&req.id, "export_failed", format!("{e:#}"), None)
}

fn handle_reports_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut sink = report_sink(state, req);
    export_student(state, req, &mut sink)
}

fn export_student(state: &AppState, req: &Request, sink: &mut dyn ReportSink) -> serde_json::Value {
    let index = match required_index(req, "studentIndex") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(model) = report::build_student_report(&state.gradebook, index) else {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentIndex": index })),
        );
    };
    match sink.write_student_report(&model) {
        Ok(path) => ok(
            &req.id,
            json!({ "exported": true, "path": path, "report": model }),
        ),
        Err(e) => export_failed(req, e),
    }
}

fn handle_reports_all_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut sink = report_sink(state, req);
    let mut paths = Vec::with_capacity(state.gradebook.students().len());
    for index in 0..state.gradebook.students().len() {
        let Some(model) = report::build_student_report(&state.gradebook, index) else {
            continue;
        };
        match sink.write_student_report(&model) {
            Ok(path) => paths.push(path),
            Err(e) => return export_failed(req, e),
        }
    }
    ok(
        &req.id,
        json!({
            "exported": !paths.is_empty(),
            "count": paths.len(),
            "paths": paths,
        }),
    )
}

fn handle_reports_results(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut sink = report_sink(state, req);
    export_results(state, req, &mut sink)
}

fn export_results(state: &AppState, req: &Request, sink: &mut dyn ReportSink) -> serde_json::Value {
    let raw = match required_str(req, "view") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(view) = ResultView::parse(&raw) else {
        return err(
            &req.id,
            "bad_params",
            "view must be one of: sequence, firstTerm, secondTerm, thirdTerm, annual",
            Some(json!({ "view": raw })),
        );
    };
    let Some(model) = report::build_view_report(&state.gradebook, view) else {
        return ok(&req.id, json!({ "exported": false, "view": view.as_str() }));
    };
    match sink.write_results_report(&model) {
        Ok(path) => ok(
            &req.id,
            json!({
                "exported": true,
                "view": view.as_str(),
                "path": path,
                "report": model,
            }),
        ),
        Err(e) => export_failed(req, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.student" => Some(handle_reports_student(state, req)),
        "reports.allStudents" => Some(handle_reports_all_students(state, req)),
        "reports.results" => Some(handle_reports_results(state, req)),
        _ => None,
    }
}
