//! Stored link-table configurations.
//!
//! A link table is a versioned multi-table join template addressed by
//! `(uid, version)`. The compiler reads one per compilation through the
//! [`LinkTableStore`] trait and never writes it.
//!
//! # Example
//!
//! ```ignore
//! use auditql::link_table::{DirectoryLinkTableStore, LinkTableStore};
//!
//! let store = DirectoryLinkTableStore::new("./link_tables");
//! let link_table = store.get("lt_login", 3)?;
//! for link in &link_table.config.links {
//!     println!("{} -> {}", link.left_table.rt_id, link.right_table.rt_id);
//! }
//! ```

mod store;
mod types;

pub use store::{DirectoryLinkTableStore, InMemoryLinkTableStore, LinkTableStore};
pub use types::*;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for link-table lookups.
pub type LinkTableResult<T> = Result<T, LinkTableError>;

/// Errors raised while looking up a link-table configuration.
#[derive(Error, Debug)]
pub enum LinkTableError {
    /// No configuration exists for this uid and version.
    #[error("link table {uid} (version {version}) not found")]
    NotFound { uid: String, version: u32 },

    /// The configuration declares zero links.
    #[error("link table {uid} (version {version}) has no links")]
    NoLinks { uid: String, version: u32 },

    /// The configuration file could not be read.
    #[error("failed to read link table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not a valid link table.
    #[error("failed to parse link table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
