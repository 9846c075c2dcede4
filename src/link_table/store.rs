//! LinkTableStore trait and its implementations.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{LinkTable, LinkTableError, LinkTableResult};

/// Read-only lookup of link-table configurations.
///
/// A lookup miss is a hard failure; implementations never retry.
pub trait LinkTableStore: Send + Sync {
    /// Fetch the configuration stored under `(uid, version)`.
    fn get(&self, uid: &str, version: u32) -> LinkTableResult<LinkTable>;
}

/// Link tables held in memory, keyed by `(uid, version)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLinkTableStore {
    tables: HashMap<(String, u32), LinkTable>,
}

impl InMemoryLinkTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link table, replacing any previous entry with the same key.
    pub fn insert(&mut self, link_table: LinkTable) {
        let key = (link_table.uid.clone(), link_table.version);
        self.tables.insert(key, link_table);
    }

    pub fn with(mut self, link_table: LinkTable) -> Self {
        self.insert(link_table);
        self
    }
}

impl LinkTableStore for InMemoryLinkTableStore {
    fn get(&self, uid: &str, version: u32) -> LinkTableResult<LinkTable> {
        self.tables
            .get(&(uid.to_string(), version))
            .cloned()
            .ok_or_else(|| LinkTableError::NotFound {
                uid: uid.to_string(),
                version,
            })
    }
}

/// Link tables stored as JSON files at `<root>/<uid>/<version>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryLinkTableStore {
    root: PathBuf,
}

impl DirectoryLinkTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `(uid, version)`.
    pub fn path_for(&self, uid: &str, version: u32) -> PathBuf {
        self.root.join(uid).join(format!("{}.json", version))
    }
}

impl LinkTableStore for DirectoryLinkTableStore {
    fn get(&self, uid: &str, version: u32) -> LinkTableResult<LinkTable> {
        let path = self.path_for(uid, version);
        debug!(path = %path.display(), "reading link table");

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LinkTableError::NotFound {
                    uid: uid.to_string(),
                    version,
                })
            }
            Err(source) => return Err(LinkTableError::Io { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| LinkTableError::Parse { path, source })
    }
}
