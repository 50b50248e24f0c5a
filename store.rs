// File-backed JSON document store
//
// Every operation reads the whole document from disk and every mutation
// writes the whole document back before returning. Nothing is cached
// between calls. Reads hold the gate shared, mutations hold it exclusive
// from the initial read through the final rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::document::{self, Document};
use crate::errors::{IoContext, JsonDbError, Result};
use crate::gate::Gate;
use crate::outcome::Outcome;
use crate::path_key::PathKey;

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    gate: Gate,
}

impl Store {
    /// Open the database file at `path`, creating parent directories.
    ///
    /// The file is truncated to empty unless `persist` is set and the
    /// file already exists.
    pub fn open(path: &Path, persist: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .io_context(format!("creating directory {}", parent.display()))?;
        }

        let existed = path.exists();
        if !persist || !existed {
            File::create(path).io_context(format!("truncating {}", path.display()))?;
        }
        info!(
            path = %path.display(),
            kept_existing = persist && existed,
            "database file ready"
        );

        Ok(Store {
            path: path.to_path_buf(),
            gate: Gate::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &PathKey) -> Outcome {
        if key.is_empty() {
            return Outcome::InvalidArguments;
        }
        match self.try_get(key) {
            Ok(Some(value)) => Outcome::found(value),
            Ok(None) => Outcome::NoSuchKey,
            Err(e) => storage_failure("get", key, e),
        }
    }

    /// Merge `value` into the document at `key`, creating any missing
    /// parent objects. A JSON `null` value counts as absent.
    pub fn set(&self, key: &PathKey, value: Value) -> Outcome {
        if key.is_empty() || value.is_null() {
            return Outcome::InvalidArguments;
        }
        match self.try_set(key, value) {
            Ok(()) => Outcome::ok(),
            Err(e) => storage_failure("set", key, e),
        }
    }

    /// Remove the field at `key` from its parent. A scalar key removes any
    /// value; a path key only removes a scalar leaf. Empty parents stay.
    pub fn delete(&self, key: &PathKey) -> Outcome {
        if key.is_empty() {
            return Outcome::InvalidArguments;
        }
        match self.try_delete(key) {
            Ok(true) => Outcome::ok(),
            Ok(false) => Outcome::NoSuchKey,
            Err(e) => storage_failure("delete", key, e),
        }
    }

    /// The whole current document
    pub fn snapshot(&self) -> Result<Document> {
        let _shared = self.gate.shared();
        self.load()
    }

    fn try_get(&self, key: &PathKey) -> Result<Option<Value>> {
        let doc = {
            let _shared = self.gate.shared();
            self.load()?
        };
        Ok(document::lookup(&doc, key.segments()).cloned())
    }

    fn try_set(&self, key: &PathKey, value: Value) -> Result<()> {
        let update = document::skeleton(key.segments(), value);

        let _exclusive = self.gate.exclusive();
        let mut doc = self.load()?;
        document::merge(&mut doc, update);
        self.persist(&doc)?;
        debug!(key = %key, "set committed");
        Ok(())
    }

    fn try_delete(&self, key: &PathKey) -> Result<bool> {
        let _exclusive = self.gate.exclusive();
        let mut doc = self.load()?;
        let removed = match key {
            PathKey::Scalar(name) => doc.shift_remove(name),
            PathKey::Path(segments) => document::remove_scalar(&mut doc, segments),
        };
        if removed.is_none() {
            return Ok(false);
        }
        self.persist(&doc)?;
        debug!(key = %key, "delete committed");
        Ok(true)
    }

    // Caller holds the gate.
    fn load(&self) -> Result<Document> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => {
                return Err(JsonDbError::Io {
                    context: format!("reading {}", self.path.display()),
                    source: e,
                })
            }
        };

        match document::parse(&text) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable document, treating as empty");
                Ok(Document::new())
            }
        }
    }

    // Caller holds the gate exclusively.
    fn persist(&self, doc: &Document) -> Result<()> {
        let text = document::render(doc)?;
        replace_file(&self.temp_path(), &self.path, text.as_bytes())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Write `bytes` to `tmp`, sync it and rename it over `target`.
/// `tmp` is removed again when any step fails.
fn replace_file(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let result = write_synced(tmp, bytes).and_then(|()| {
        fs::rename(tmp, target).io_context(format!("replacing {}", target.display()))
    });
    if result.is_err() && tmp.is_file() {
        if let Err(e) = fs::remove_file(tmp) {
            warn!(path = %tmp.display(), error = %e, "could not remove temporary file");
        }
    }
    result
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .io_context(format!("creating {}", path.display()))?;
    file.write_all(bytes)
        .io_context(format!("writing {}", path.display()))?;
    file.sync_all()
        .io_context(format!("syncing {}", path.display()))
}

fn storage_failure(operation: &str, key: &PathKey, e: JsonDbError) -> Outcome {
    error!(operation, key = %key, error = %e, "storage failure");
    Outcome::DatabaseError
}
