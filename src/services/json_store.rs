use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};
use crate::errors::{StoreError, StoreResult};

/// A JSON array file held in memory. Every change is written to disk
/// under the store's lock before it becomes visible to readers, so
/// writers to the same file are serialized.
pub struct JsonStore<T> {
    path: PathBuf,
    items: Mutex<Vec<T>>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send,
{
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let items = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("{} does not exist yet, starting empty", path.display());
                Vec::new()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        tracing::debug!("Loaded {} records from {}", items.len(), path.display());
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.items.lock().await.clone()
    }

    pub async fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.items.lock().await;
        f(&items)
    }

    /// Runs `f` on a draft of the collection and persists the draft.
    /// If `f` fails nothing is written.
    pub async fn mutate<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
        E: From<StoreError>,
    {
        let mut tx = self.begin().await;
        let out = f(tx.items_mut())?;
        tx.commit().await?;
        Ok(out)
    }

    /// Locks the store until the returned transaction is committed or dropped.
    pub async fn begin(&self) -> Transaction<'_, T> {
        let guard = self.items.lock().await;
        let draft = guard.clone();
        Transaction {
            path: &self.path,
            guard,
            draft,
        }
    }
}

pub struct Transaction<'a, T> {
    path: &'a Path,
    guard: MutexGuard<'a, Vec<T>>,
    draft: Vec<T>,
}

impl<'a, T: Serialize> Transaction<'a, T> {
    pub fn items(&self) -> &[T] {
        &self.draft
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.draft
    }

    pub async fn commit(self) -> StoreResult<()> {
        let staged = self.stage().await?;
        self.replace_file(&staged).await?;
        self.finish();
        Ok(())
    }

    // Writes the draft next to the target file
    async fn stage(&self) -> StoreResult<PathBuf> {
        let staged = temp_path(self.path, "tmp");
        write_json(self.path, &staged, &self.draft).await?;
        Ok(staged)
    }

    // Copy of the committed records, used to roll back a failed pair
    async fn backup(&self) -> StoreResult<PathBuf> {
        let backup = temp_path(self.path, "bak");
        write_json(self.path, &backup, self.guard.as_slice()).await?;
        Ok(backup)
    }

    async fn replace_file(&self, staged: &Path) -> StoreResult<()> {
        if let Err(source) = tokio::fs::rename(staged, self.path).await {
            let _ = tokio::fs::remove_file(staged).await;
            return Err(StoreError::Write {
                path: self.path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }

    fn finish(mut self) {
        tracing::debug!("Saved {} records to {}", self.draft.len(), self.path.display());
        *self.guard = std::mem::take(&mut self.draft);
    }
}

async fn write_json<T: Serialize>(target: &Path, dest: &Path, items: &[T]) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialize {
        path: target.to_path_buf(),
        source,
    })?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::write(dest, bytes)
        .await
        .map_err(|source| StoreError::Write {
            path: dest.to_path_buf(),
            source,
        })
}

/// Commits two transactions together. Both drafts are staged before
/// either file is replaced. If the second file cannot be replaced, the
/// first is restored from a backup and neither in-memory copy changes.
pub async fn commit_pair<A, B>(first: Transaction<'_, A>, second: Transaction<'_, B>) -> StoreResult<()>
where
    A: Serialize,
    B: Serialize,
{
    let first_staged = first.stage().await?;
    let second_staged = match second.stage().await {
        Ok(path) => path,
        Err(e) => {
            let _ = tokio::fs::remove_file(&first_staged).await;
            return Err(e);
        }
    };
    let backup = match first.backup().await {
        Ok(path) => path,
        Err(e) => {
            let _ = tokio::fs::remove_file(&first_staged).await;
            let _ = tokio::fs::remove_file(&second_staged).await;
            return Err(e);
        }
    };

    if let Err(e) = first.replace_file(&first_staged).await {
        let _ = tokio::fs::remove_file(&second_staged).await;
        let _ = tokio::fs::remove_file(&backup).await;
        return Err(e);
    }
    if let Err(e) = second.replace_file(&second_staged).await {
        if let Err(restore) = tokio::fs::rename(&backup, first.path).await {
            tracing::error!(
                "Failed to restore {} after a failed commit: {}",
                first.path.display(),
                restore
            );
        }
        return Err(e);
    }

    let _ = tokio::fs::remove_file(&backup).await;
    first.finish();
    second.finish();
    Ok(())
}

fn temp_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
