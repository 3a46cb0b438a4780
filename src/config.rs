use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILTER: &str = "gradebookd=info";
const REPORTS_DIR_NAME: &str = "reports";

/// Sidecar configuration loaded from environment variables.
///
/// | Env Var                  | Default                                    |
/// |--------------------------|--------------------------------------------|
/// | `GRADEBOOKD_WORKSPACE`   | none: in-memory store until selected        |
/// | `GRADEBOOKD_REPORT_DIR`  | `<workspace>/reports`, else `./reports`    |
/// | `RUST_LOG`               | `gradebookd=info`                          |
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub workspace: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            workspace: non_empty_path("GRADEBOOKD_WORKSPACE"),
            report_dir: non_empty_path("GRADEBOOKD_REPORT_DIR"),
        }
    }

    /// Report output directory: explicit request path, then configuration,
    /// then `reports/` inside the open workspace (or the current directory).
    pub fn resolve_report_dir(&self, requested: Option<&str>, workspace: Option<&Path>) -> PathBuf {
        if let Some(p) = requested.map(str::trim).filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        if let Some(p) = self.report_dir.as_ref() {
            return p.clone();
        }
        match workspace {
            Some(w) => w.join(REPORTS_DIR_NAME),
            None => PathBuf::from(REPORTS_DIR_NAME),
        }
    }
}

fn non_empty_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
