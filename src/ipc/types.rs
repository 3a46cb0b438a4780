use crate::config::Config;
use crate::gradebook::Gradebook;
use crate::store::{self, Collection, KeyValueStore, MemoryStore, SqliteStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub store: Box<dyn KeyValueStore>,
    pub gradebook: Gradebook,
}

impl AppState {
    /// Starts with an in-memory store; `workspace.select` swaps in the
    /// workspace database.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            workspace: None,
            store: Box::new(MemoryStore::new()),
            gradebook: Gradebook::new(),
        }
    }

    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let store = SqliteStore::open(path)?;
        let gradebook = store::load_gradebook(&store)?;
        info!(
            workspace = %path.to_string_lossy(),
            students = gradebook.students().len(),
            subjects = gradebook.subjects().len(),
            "workspace opened"
        );
        self.store = Box::new(store);
        self.gradebook = gradebook;
        self.workspace = Some(path.to_path_buf());
        Ok(())
    }

    /// Re-serializes the given collections. The in-memory gradebook is kept
    /// whether or not the store accepts the write.
    pub fn persist(&mut self, collections: &[Collection]) -> anyhow::Result<()> {
        store::save_collections(self.store.as_mut(), &self.gradebook, collections)
    }
}
