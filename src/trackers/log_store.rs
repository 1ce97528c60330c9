use crate::error::{AppError, Result};
use crate::models::UserId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Append-only JSON log, one file per user. Shared by the meal and sugar
/// trackers so the persistence discipline exists exactly once.
pub(crate) struct JsonLogStore<T> {
    root: PathBuf,
    prefix: &'static str,
    _entry: PhantomData<T>,
}

impl<T> JsonLogStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new<P: AsRef<Path>>(root: P, prefix: &'static str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Persistence(format!(
                "cannot create tracker directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self {
            root,
            prefix,
            _entry: PhantomData,
        })
    }

    fn user_file(&self, user: &UserId) -> PathBuf {
        self.root
            .join(format!("{}_{}.json", self.prefix, user.storage_key()))
    }

    pub fn append(&self, user: &UserId, entry: T) -> Result<()> {
        let mut entries = self.load(user)?;
        entries.push(entry);
        self.write(user, &entries)
    }

    /// Entries in append order; a missing file is an empty log
    pub fn load(&self, user: &UserId) -> Result<Vec<T>> {
        let path = self.user_file(user);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Persistence(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Persistence(format!("corrupt log file {}: {}", path.display(), e))
        })
    }

    pub fn clear(&self, user: &UserId) -> Result<()> {
        let path = self.user_file(user);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AppError::Persistence(format!("cannot delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    fn write(&self, user: &UserId, entries: &[T]) -> Result<()> {
        let path = self.user_file(user);
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| AppError::Persistence(format!("cannot serialize log: {}", e)))?;

        // Write to a sibling temp file first so a crash mid-write cannot
        // truncate the existing log.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| {
            AppError::Persistence(format!("cannot write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            AppError::Persistence(format!("cannot replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}
