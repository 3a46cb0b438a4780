use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::MemoryStore;
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn path_param(req: &Request, key: &str) -> Result<PathBuf, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => Ok(PathBuf::from(v.trim())),
        _ => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
    }
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out = match path_param(req, "outPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match backup::export_workspace_bundle(&workspace, &out) {
        Ok(export) => {
            info!(path = %out.to_string_lossy(), bundle_id = %export.bundle_id, "backup exported");
            ok(
                &req.id,
                json!({
                    "path": out.to_string_lossy(),
                    "bundleFormat": export.bundle_format,
                    "bundleId": export.bundle_id,
                    "dbSha256": export.db_sha256,
                    "entryCount": export.entry_count,
                }),
            )
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "backup export failed");
            err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": out.to_string_lossy() })),
            )
        }
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let src = match path_param(req, "inPath") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": src.to_string_lossy() })),
        );
    }

    // Drop the open connection before the database file is replaced.
    state.store = Box::new(MemoryStore::new());

    let import = backup::import_workspace_bundle(&src, &workspace);
    // A failed import leaves the previous database in place, so reopening
    // restores the session either way.
    if let Err(e) = state.open_workspace(&workspace) {
        warn!(error = %format!("{e:#}"), "workspace reopen after import failed");
        // Back to an in-memory session; later writes must not look persisted.
        state.workspace = None;
        return err(
            &req.id,
            "backup_failed",
            format!("{e:#}"),
            Some(json!({ "path": src.to_string_lossy(), "workspaceClosed": true })),
        );
    }
    let import = match import {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "backup import failed");
            return err(
                &req.id,
                "backup_failed",
                format!("{e:#}"),
                Some(json!({ "path": src.to_string_lossy() })),
            );
        }
    };

    info!(format = %import.bundle_format_detected, "backup imported");
    ok(
        &req.id,
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "bundleFormatDetected": import.bundle_format_detected,
            "studentCount": state.gradebook.students().len(),
            "subjectCount": state.gradebook.subjects().len(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.export" => Some(handle_backup_export(state, req)),
        "backup.import" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
