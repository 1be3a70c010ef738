//! Document store.
//!
//! Records are schema-less JSON documents grouped in collections and keyed by
//! id. `Store` gives typed access on top of a `DocumentBackend`, so services
//! can run against the on-disk backend in production and the in-memory one in
//! tests.

mod file;
mod memory;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{StaybookError, StaybookResult};

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Raw document storage, one JSON value per (collection, id).
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StaybookResult<Option<Value>>;

    /// Insert or replace.
    async fn put(&self, collection: &str, id: &str, doc: Value) -> StaybookResult<()>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> StaybookResult<bool>;

    /// Every document of a collection, ordered by id.
    async fn list(&self, collection: &str) -> StaybookResult<Vec<Value>>;
}

/// A record type that lives in its own collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;
    /// Human-readable name used in "not found" errors.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// Typed access to a document backend.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentBackend>,
}

impl Store {
    pub fn new(backend: impl DocumentBackend + 'static) -> Self {
        Store {
            backend: Arc::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Store::new(MemoryBackend::default())
    }

    /// Store backed by JSON files under `dir`.
    pub async fn open(dir: &Path) -> StaybookResult<Self> {
        Ok(Store::new(FileBackend::open(dir).await?))
    }

    pub async fn get<T: Document>(&self, id: &str) -> StaybookResult<Option<T>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        match self.backend.get(T::COLLECTION, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Like `get`, but a missing document is an error.
    pub async fn fetch<T: Document>(&self, id: &str) -> StaybookResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| StaybookError::not_found(T::KIND, id))
    }

    pub async fn put<T: Document>(&self, doc: &T) -> StaybookResult<()> {
        let id = doc.id();
        if !is_valid_id(id) {
            return Err(StaybookError::Store(format!(
                "invalid document id '{id}' for {}",
                T::COLLECTION
            )));
        }
        let value = serde_json::to_value(doc)?;
        self.backend.put(T::COLLECTION, id, value).await
    }

    pub async fn delete<T: Document>(&self, id: &str) -> StaybookResult<bool> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        self.backend.delete(T::COLLECTION, id).await
    }

    /// All documents of a type. Documents that no longer deserialize are
    /// skipped with a warning.
    pub async fn list<T: Document>(&self) -> StaybookResult<Vec<T>> {
        let values = self.backend.list(T::COLLECTION).await?;

        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(collection = T::COLLECTION, error = %e, "skipping unreadable document");
                    None
                }
            })
            .collect())
    }
}

/// Generate a new document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Overlay the top-level fields of `patch` onto `doc`. Fields named in
/// `protected` keep their stored value.
pub fn merge_fields<T: Document>(
    doc: &T,
    patch: serde_json::Map<String, Value>,
    protected: &[&str],
) -> StaybookResult<T> {
    let mut value = serde_json::to_value(doc)?;
    let Value::Object(fields) = &mut value else {
        return Err(StaybookError::Store(format!(
            "{} is not stored as an object",
            T::KIND
        )));
    };
    for (key, new_value) in patch {
        if protected.contains(&key.as_str()) {
            continue;
        }
        fields.insert(key, new_value);
    }
    serde_json::from_value(value)
        .map_err(|e| StaybookError::Validation(format!("invalid {} update: {e}", T::KIND)))
}

/// Ids double as file names, so only a safe alphabet is allowed.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";
        const KIND: &'static str = "Note";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    async fn exercise(store: Store) {
        store.put(&note("b", "second")).await.unwrap();
        store.put(&note("a", "first")).await.unwrap();

        let fetched: Note = store.fetch("a").await.unwrap();
        assert_eq!(fetched.text, "first");

        store.put(&note("a", "replaced")).await.unwrap();
        let listed: Vec<Note> = store.list().await.unwrap();
        assert_eq!(listed, vec![note("a", "replaced"), note("b", "second")]);

        assert!(store.delete::<Note>("a").await.unwrap());
        assert!(!store.delete::<Note>("a").await.unwrap());
        assert!(store.get::<Note>("a").await.unwrap().is_none());

        let err = store.fetch::<Note>("a").await.unwrap_err();
        assert!(matches!(err, StaybookError::NotFound { kind: "Note", .. }));
    }

    #[tokio::test]
    async fn memory_backend_roundtrip() {
        exercise(Store::in_memory()).await;
    }

    #[tokio::test]
    async fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        exercise(Store::open(dir.path()).await.unwrap()).await;
    }

    #[tokio::test]
    async fn file_backend_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        Store::open(dir.path())
            .await
            .unwrap()
            .put(&note("kept", "on disk"))
            .await
            .unwrap();

        let reopened = Store::open(dir.path()).await.unwrap();
        let fetched: Note = reopened.fetch("kept").await.unwrap();
        assert_eq!(fetched.text, "on disk");
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected() {
        let store = Store::in_memory();
        assert!(store.get::<Note>("../etc/passwd").await.unwrap().is_none());
        assert!(store.put(&note("../escape", "x")).await.is_err());
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped_in_listings() {
        let backend = MemoryBackend::default();
        backend
            .put("notes", "bad", serde_json::json!({ "id": "bad" }))
            .await
            .unwrap();
        let store = Store::new(backend);
        store.put(&note("good", "ok")).await.unwrap();

        let listed: Vec<Note> = store.list().await.unwrap();
        assert_eq!(listed, vec![note("good", "ok")]);
    }
}
