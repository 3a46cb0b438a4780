use crate::db;
use crate::gradebook::Gradebook;
use crate::model::{ScoreMap, StudentComments, StudentMarks, Subject};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

pub const STUDENTS_KEY: &str = "students";
pub const SUBJECTS_KEY: &str = "subjects";
pub const MARKS_KEY: &str = "marks";
pub const COMMENTS_KEY: &str = "studentComments";

/// String-keyed snapshot storage the gradebook persists into.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
    fn clear(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace).with_context(|| {
            format!(
                "failed to open gradebook database in {}",
                workspace.to_string_lossy()
            )
        })?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| r.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv(key, value, updated_at)
             VALUES(?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            (key, value, &now),
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv", [])?;
        Ok(())
    }
}

/// The persisted collections, one store key each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Students,
    Subjects,
    Marks,
    Comments,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Students,
        Collection::Subjects,
        Collection::Marks,
        Collection::Comments,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Students => STUDENTS_KEY,
            Collection::Subjects => SUBJECTS_KEY,
            Collection::Marks => MARKS_KEY,
            Collection::Comments => COMMENTS_KEY,
        }
    }
}

/// Decodes the stored marks array. Entries written before sequences existed
/// are flat subject maps; when the first entry has no `firstSequence` the
/// whole array is read that way.
pub fn decode_marks(raw: &str) -> anyhow::Result<Vec<StudentMarks>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(raw).context("stored marks are not a JSON array")?;

    let legacy = entries
        .first()
        .map(|first| first.get("firstSequence").map_or(true, |v| v.is_null()))
        .unwrap_or(false);

    if legacy {
        info!(entries = entries.len(), "migrating legacy single-sequence marks");
        return entries
            .into_iter()
            .map(|v| -> anyhow::Result<StudentMarks> {
                let flat: ScoreMap =
                    serde_json::from_value(v).context("legacy marks entry must be an object")?;
                Ok(StudentMarks::from_legacy(flat))
            })
            .collect();
    }

    entries
        .into_iter()
        .map(|v| serde_json::from_value(v).context("invalid marks entry"))
        .collect()
}

fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).with_context(|| format!("stored {} is invalid JSON", key))?;
    Ok(Some(value))
}

pub fn load_gradebook(store: &dyn KeyValueStore) -> anyhow::Result<Gradebook> {
    let students: Vec<String> = read_json(store, STUDENTS_KEY)?.unwrap_or_default();
    let subjects: Vec<Subject> = read_json(store, SUBJECTS_KEY)?.unwrap_or_default();
    let marks = match store.get(MARKS_KEY)? {
        Some(raw) => decode_marks(&raw)?,
        None => Vec::new(),
    };
    let comments: StudentComments = read_json(store, COMMENTS_KEY)?.unwrap_or_default();

    if marks.len() != students.len() {
        warn!(
            students = students.len(),
            marks = marks.len(),
            "stored marks do not match roster; aligning to roster"
        );
    }
    debug!(
        students = students.len(),
        subjects = subjects.len(),
        "loaded gradebook"
    );
    Ok(Gradebook::from_parts(students, subjects, marks, comments))
}

/// Writes one collection, or removes its key when the collection is empty.
pub fn save_collection(
    store: &mut dyn KeyValueStore,
    gb: &Gradebook,
    collection: Collection,
) -> anyhow::Result<()> {
    let (empty, encoded) = match collection {
        Collection::Students => (gb.students().is_empty(), serde_json::to_string(gb.students())),
        Collection::Subjects => (gb.subjects().is_empty(), serde_json::to_string(gb.subjects())),
        Collection::Marks => (gb.marks().is_empty(), serde_json::to_string(gb.marks())),
        Collection::Comments => (gb.comments().is_empty(), serde_json::to_string(gb.comments())),
    };
    let key = collection.key();
    if empty {
        return store
            .remove(key)
            .with_context(|| format!("failed to remove {}", key));
    }
    let encoded = encoded.with_context(|| format!("failed to serialize {}", key))?;
    store
        .set(key, &encoded)
        .with_context(|| format!("failed to store {}", key))
}

pub fn save_collections(
    store: &mut dyn KeyValueStore,
    gb: &Gradebook,
    collections: &[Collection],
) -> anyhow::Result<()> {
    for c in collections {
        save_collection(store, gb, *c)?;
    }
    Ok(())
}

pub fn save_all(store: &mut dyn KeyValueStore, gb: &Gradebook) -> anyhow::Result<()> {
    save_collections(store, gb, &Collection::ALL)
}
