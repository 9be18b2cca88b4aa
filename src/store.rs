//! Document store for skiller logs and lookup entries
//!
//! The pipeline only needs a handful of collection operations: a filtered,
//! timestamp-ordered query over the log, an exact-match lookup, single
//! inserts, and dropping a whole collection. They are expressed as two
//! traits so the pairing and writing code never depends on a backend.
//!
//! [`JsonlCollection`] is the bundled backend: the whole collection is held in
//! memory and mirrored to a JSON-lines file, one document per line. A
//! [`DocumentStore`] maps `(database, collection)` names onto such files
//! below a root directory:
//!
//! ```text
//! <root>/
//! ├─ fflog/
//! │  └─ SkillerInterface.Skiller.jsonl
//! └─ skills/
//!    └─ exec_times.jsonl
//! ```

use crate::error::{Result, SkillTimeError};
use crate::event::{SkillEvent, Status, ThreadId};
use crate::lookup::LookupEntry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filter over the skiller log
///
/// Unset fields match everything. Results are always returned in ascending
/// timestamp order; events with equal timestamps keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub status: Option<Status>,
    pub thread: Option<ThreadId>,
    pub skill_string: Option<String>,
    /// Strict lower bound on the timestamp
    pub after: Option<i64>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn thread(mut self, thread: ThreadId) -> Self {
        self.thread = Some(thread);
        self
    }

    pub fn skill_string(mut self, skill_string: impl Into<String>) -> Self {
        self.skill_string = Some(skill_string.into());
        self
    }

    pub fn after(mut self, timestamp: i64) -> Self {
        self.after = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check a single event against the filter (limit not applied)
    pub fn matches(&self, event: &SkillEvent) -> bool {
        self.status.map_or(true, |s| event.status == s)
            && self.thread.as_ref().map_or(true, |t| &event.thread == t)
            && self
                .skill_string
                .as_ref()
                .map_or(true, |s| &event.skill_string == s)
            && self.after.map_or(true, |t| event.timestamp > t)
    }
}

/// Read access to a skiller log
pub trait EventLog {
    fn find(&self, query: &EventQuery) -> Result<Vec<SkillEvent>>;
}

/// Destination of lookup entries
pub trait LookupStore {
    /// Exact-match lookup: every field must be equal
    fn find_one(&self, entry: &LookupEntry) -> Result<Option<LookupEntry>>;

    fn insert_one(&mut self, entry: LookupEntry) -> Result<()>;

    /// Remove every entry of the collection
    fn drop_collection(&mut self) -> Result<()>;

    /// Insert unless an identical entry exists; returns whether it was inserted
    ///
    /// Backends shared with other writers should override this with a single
    /// conditional write.
    fn insert_if_absent(&mut self, entry: LookupEntry) -> Result<bool> {
        if self.find_one(&entry)?.is_some() {
            return Ok(false);
        }
        self.insert_one(entry)?;
        Ok(true)
    }
}

/// A collection of documents mirrored to a JSON-lines file
#[derive(Debug, Clone)]
pub struct JsonlCollection<T> {
    path: Option<PathBuf>,
    docs: Vec<T>,
}

fn store_error(path: &Path, source: std::io::Error) -> SkillTimeError {
    SkillTimeError::Store {
        path: path.to_path_buf(),
        source,
    }
}

impl<T> JsonlCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Collection that lives only in memory
    pub fn in_memory() -> Self {
        Self {
            path: None,
            docs: Vec::new(),
        }
    }

    /// In-memory collection seeded with documents
    pub fn from_documents(docs: Vec<T>) -> Self {
        Self { path: None, docs }
    }

    /// Open a file-backed collection, loading existing documents
    ///
    /// A missing file is an empty collection; the file is created on the
    /// first insert.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let docs = if path.exists() {
            Self::load(&path)?
        } else {
            Vec::new()
        };
        tracing::debug!(path = %path.display(), documents = docs.len(), "opened collection");
        Ok(Self {
            path: Some(path),
            docs,
        })
    }

    fn load(path: &Path) -> Result<Vec<T>> {
        let content = fs::read_to_string(path).map_err(|e| store_error(path, e))?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| SkillTimeError::Serialization {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn documents(&self) -> &[T] {
        &self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Append a document, writing it through to the backing file
    pub fn push(&mut self, doc: T) -> Result<()> {
        if let Some(path) = &self.path {
            let line = serde_json::to_string(&doc).map_err(|source| {
                SkillTimeError::Serialization {
                    path: path.clone(),
                    line: self.docs.len() + 1,
                    source,
                }
            })?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| store_error(parent, e))?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| store_error(path, e))?;
            writeln!(file, "{}", line).map_err(|e| store_error(path, e))?;
        }
        self.docs.push(doc);
        Ok(())
    }

    /// Remove all documents and the backing file
    pub fn clear(&mut self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path).map_err(|e| store_error(path, e))?;
            }
        }
        self.docs.clear();
        Ok(())
    }
}

impl EventLog for JsonlCollection<SkillEvent> {
    fn find(&self, query: &EventQuery) -> Result<Vec<SkillEvent>> {
        let mut found: Vec<SkillEvent> = self
            .docs
            .iter()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        // stable: equal timestamps stay in log order
        found.sort_by_key(|event| event.timestamp);
        if let Some(limit) = query.limit {
            found.truncate(limit);
        }
        Ok(found)
    }
}

impl LookupStore for JsonlCollection<LookupEntry> {
    fn find_one(&self, entry: &LookupEntry) -> Result<Option<LookupEntry>> {
        Ok(self.docs.iter().find(|doc| *doc == entry).cloned())
    }

    fn insert_one(&mut self, entry: LookupEntry) -> Result<()> {
        self.push(entry)
    }

    fn drop_collection(&mut self) -> Result<()> {
        self.clear()
    }
}

/// Directory of databases, each a directory of JSON-lines collections
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `database.collection`
    pub fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root
            .join(database)
            .join(format!("{}.jsonl", collection))
    }

    pub fn open_collection<T>(&self, database: &str, collection: &str) -> Result<JsonlCollection<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        JsonlCollection::open(self.collection_path(database, collection))
    }

    /// Delete a collection without loading it
    pub fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        let path = self.collection_path(database, collection);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| store_error(&path, e))?;
        }
        tracing::info!(database, collection, "dropped collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Status;
    use tempfile::TempDir;

    fn log() -> JsonlCollection<SkillEvent> {
        JsonlCollection::from_documents(vec![
            SkillEvent::new(1, 300, Status::Final, "foo{}"),
            SkillEvent::new(1, 100, Status::Running, "foo{}"),
            SkillEvent::new(2, 200, Status::Running, "foo{}"),
            SkillEvent::new(1, 250, Status::Running, "bar{}"),
        ])
    }

    #[test]
    fn test_find_sorts_by_timestamp() {
        let found = log().find(&EventQuery::new()).unwrap();
        let stamps: Vec<i64> = found.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![100, 200, 250, 300]);
    }

    #[test]
    fn test_find_filters_status() {
        let found = log()
            .find(&EventQuery::new().status(Status::Running))
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|e| e.status == Status::Running));
    }

    #[test]
    fn test_find_thread_signature_after_limit() {
        let query = EventQuery::new()
            .thread(ThreadId::Number(1))
            .skill_string("foo{}")
            .after(100)
            .limit(1);
        let found = log().find(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].timestamp, 300);
    }

    #[test]
    fn test_after_is_strict() {
        let found = log().find(&EventQuery::new().after(300)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_file_collection_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("log.jsonl");

        let mut col: JsonlCollection<SkillEvent> = JsonlCollection::open(&path).unwrap();
        assert!(col.is_empty());
        col.push(SkillEvent::new(1, 100, Status::Running, "foo{}"))
            .unwrap();
        col.push(SkillEvent::new(1, 400, Status::Final, "foo{}"))
            .unwrap();

        let reopened: JsonlCollection<SkillEvent> = JsonlCollection::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.documents()[1].status, Status::Final);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        let mut col: JsonlCollection<SkillEvent> = JsonlCollection::open(&path).unwrap();
        col.push(SkillEvent::new(1, 100, Status::Running, "foo{}"))
            .unwrap();
        assert!(path.exists());
        col.clear().unwrap();
        assert!(!path.exists());
        assert!(col.is_empty());
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.jsonl");
        fs::write(
            &path,
            "{\"status\":2,\"thread\":1,\"skill_string\":\"foo{}\",\"timestamp\":1}\n\nnot json\n",
        )
        .unwrap();
        let err = JsonlCollection::<SkillEvent>::open(&path).unwrap_err();
        match err {
            SkillTimeError::Serialization { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_document_store_layout() {
        let store = DocumentStore::new("/data");
        assert_eq!(
            store.collection_path("skills", "exec_times"),
            PathBuf::from("/data/skills/exec_times.jsonl")
        );
    }

    #[test]
    fn test_drop_missing_collection_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        store.drop_collection("skills", "exec_times").unwrap();
    }
}
