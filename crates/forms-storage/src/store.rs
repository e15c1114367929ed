//! [`FormStore`] backed by a JSON Lines file.
//!
//! Every mutation reads the whole file, edits it in memory, and replaces
//! the file atomically. An advisory lock on a sidecar `.lock` file keeps
//! concurrent `formctl` processes from interleaving edits.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use forms_core::schema::FormSchema;
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Result, StorageError};
use crate::jsonl::{read_jsonl, write_jsonl};
use crate::traits::{FormStore, prepare_new, prepare_update};

/// A [`FormStore`] persisted as one schema per line.
#[derive(Debug, Clone)]
pub struct JsonlFormStore {
    path: PathBuf,
}

impl JsonlFormStore {
    /// Opens a store at `path`. The file is created on first write; a
    /// missing file reads as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(dir) = self.parent_dir() {
            fs::create_dir_all(dir)?;
        }
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            file.lock_shared()
        };
        locked.map_err(|e| {
            StorageError::Locked(format!("{}: {}", lock_path.display(), e))
        })?;
        trace!(path = %lock_path.display(), exclusive, "acquired store lock");
        Ok(file)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn read_all(&self) -> Result<Vec<FormSchema>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        read_jsonl(BufReader::new(file)).collect()
    }

    fn write_all(&self, schemas: &[FormSchema]) -> Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            write_jsonl(&mut writer, schemas)?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    /// Runs `edit` over the stored schemas under an exclusive lock and
    /// writes the result back.
    fn mutate<T>(&self, edit: impl FnOnce(&mut Vec<FormSchema>) -> Result<T>) -> Result<T> {
        let lock = self.lock(true)?;
        let mut schemas = self.read_all()?;
        let out = edit(&mut schemas)?;
        self.write_all(&schemas)?;
        FileExt::unlock(&lock)?;
        Ok(out)
    }
}

impl FormStore for JsonlFormStore {
    fn save(&self, schema: &FormSchema) -> Result<String> {
        let id = self.mutate(|schemas| {
            if !schema.id.is_empty() && schemas.iter().any(|s| s.id == schema.id) {
                return Err(StorageError::AlreadyExists {
                    id: schema.id.clone(),
                });
            }
            let stored = prepare_new(schema, schemas);
            let id = stored.id.clone();
            schemas.push(stored);
            Ok(id)
        })?;
        debug!(id = %id, path = %self.path.display(), "form saved");
        Ok(id)
    }

    fn load_all(&self) -> Result<Vec<FormSchema>> {
        let lock = self.lock(false)?;
        let schemas = self.read_all()?;
        FileExt::unlock(&lock)?;
        Ok(schemas)
    }

    fn get(&self, id: &str) -> Result<FormSchema> {
        self.load_all()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::form_not_found(id))
    }

    fn update(&self, id: &str, schema: &FormSchema) -> Result<()> {
        self.mutate(|schemas| {
            let slot = schemas
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| StorageError::form_not_found(id))?;
            *slot = prepare_update(slot, schema);
            Ok(())
        })?;
        debug!(id, "form updated");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|schemas| {
            let before = schemas.len();
            schemas.retain(|s| s.id != id);
            if schemas.len() == before {
                return Err(StorageError::form_not_found(id));
            }
            Ok(())
        })?;
        debug!(id, "form deleted");
        Ok(())
    }
}
