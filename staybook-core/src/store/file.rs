use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::DocumentBackend;
use crate::error::{StaybookError, StaybookResult};

/// Backend storing each document as `<root>/<collection>/<id>.json`.
///
/// Writes go to a temp file that is renamed into place, so readers never see
/// a half-written document.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub async fn open(root: &Path) -> StaybookResult<Self> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            StaybookError::Store(format!("Could not create {}: {e}", root.display()))
        })?;
        Ok(FileBackend {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }
}

#[async_trait]
impl DocumentBackend for FileBackend {
    async fn get(&self, collection: &str, id: &str) -> StaybookResult<Option<Value>> {
        match tokio::fs::read(self.doc_path(collection, id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> StaybookResult<()> {
        let dir = self.root.join(collection);
        tokio::fs::create_dir_all(&dir).await?;

        let path = self.doc_path(collection, id);
        let tmp = dir.join(format!(".{id}.json.tmp"));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&doc)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StaybookResult<bool> {
        match tokio::fs::remove_file(self.doc_path(collection, id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, collection: &str) -> StaybookResult<Vec<Value>> {
        let dir = self.root.join(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_doc = path.extension().is_some_and(|ext| ext == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if is_doc {
                paths.push(path);
            }
        }
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice(&bytes) {
                Ok(value) => docs.push(value),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping corrupt document"),
            }
        }
        Ok(docs)
    }
}
