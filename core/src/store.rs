use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// The JSON documents kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKey {
    SavedRequests,
    History,
}

impl DocumentKey {
    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKey::SavedRequests => "saved_requests.json",
            DocumentKey::History => "request_history.json",
        }
    }
}

/// Best-effort persistence of JSON documents in one directory.
///
/// Missing or corrupt documents are replaced with the caller's default, and
/// write failures are logged and dropped. Clones share one lock, so calls in
/// this process are serialized; other processes writing the same files still
/// race and the last write wins.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonStore {
    /// Creates the data directory if needed and anchors the store at its absolute path.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = fs::canonicalize(root.as_ref())?;
        Ok(Self {
            root,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self, key: DocumentKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    pub async fn load<T>(&self, key: DocumentKey, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let _guard = self.lock.lock().await;
        self.read_document(key, default).await
    }

    pub async fn save<T>(&self, key: DocumentKey, document: &T)
    where
        T: Serialize + ?Sized,
    {
        let _guard = self.lock.lock().await;
        self.write_document(key, document).await;
    }

    /// Read-modify-write under the store lock. The document is saved after
    /// `apply` runs, and whatever `apply` returns is handed back.
    pub async fn update<T, R, F>(&self, key: DocumentKey, default: T, apply: F) -> R
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.read_document(key, default).await;
        let result = apply(&mut document);
        self.write_document(key, &document).await;
        result
    }

    async fn read_document<T>(&self, key: DocumentKey, default: T) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        let path = self.path(key);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    debug!(path = %path.display(), "Document missing, creating it with defaults.");
                } else {
                    warn!(path = %path.display(), error = %e, "Document unreadable, resetting to defaults.");
                }
                self.write_document(key, &default).await;
                return default;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Document corrupt, resetting to defaults.");
                self.write_document(key, &default).await;
                default
            }
        }
    }

    async fn write_document<T>(&self, key: DocumentKey, document: &T)
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(key);

        let bytes = match to_pretty_json(document) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to serialize document.");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&path, bytes).await {
            error!(path = %path.display(), error = %e, "Failed to save document.");
        }
    }
}

fn to_pretty_json<T>(document: &T) -> serde_json::Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    document.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonStore::open(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let store = JsonStore::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert!(store.path(DocumentKey::History).is_absolute());
    }

    #[tokio::test]
    async fn test_load_missing_document_writes_default() {
        let (store, _temp_dir) = create_test_store();
        let path = store.path(DocumentKey::History);
        assert!(!path.exists());

        let loaded: Vec<String> = store.load(DocumentKey::History, Vec::new()).await;

        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_load_corrupt_document_resets_to_default() {
        let (store, _temp_dir) = create_test_store();
        let path = store.path(DocumentKey::SavedRequests);
        fs::write(&path, "{ not json").unwrap();

        let loaded: BTreeMap<String, String> =
            store.load(DocumentKey::SavedRequests, BTreeMap::new()).await;

        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_treated_as_corrupt() {
        let (store, _temp_dir) = create_test_store();
        let path = store.path(DocumentKey::History);
        fs::write(&path, r#"{"not": "a list"}"#).unwrap();

        let loaded: Vec<String> = store.load(DocumentKey::History, Vec::new()).await;

        assert!(loaded.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_save_then_load_returns_document() {
        let (store, _temp_dir) = create_test_store();
        let document = json!({ "name": "value", "n": [1, 2, 3] });

        store.save(DocumentKey::SavedRequests, &document).await;
        let loaded: Value = store.load(DocumentKey::SavedRequests, json!({})).await;

        assert_eq!(loaded, document);
    }

    #[tokio::test]
    async fn test_save_writes_indented_utf8() {
        let (store, _temp_dir) = create_test_store();
        let document = json!({ "café": "Grüße" });

        store.save(DocumentKey::SavedRequests, &document).await;

        let written = fs::read_to_string(store.path(DocumentKey::SavedRequests)).unwrap();
        assert_eq!(written, "{\n    \"café\": \"Grüße\"\n}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let (store, _temp_dir) = create_test_store();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update(DocumentKey::History, Vec::<u32>::new(), |items| items.push(i))
                        .await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut loaded: Vec<u32> = store.load(DocumentKey::History, Vec::new()).await;
        loaded.sort_unstable();
        assert_eq!(loaded, (0..16).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_update_returns_closure_result() {
        let (store, _temp_dir) = create_test_store();

        let len = store
            .update(DocumentKey::History, Vec::<u32>::new(), |items| {
                items.push(7);
                items.len()
            })
            .await;

        assert_eq!(len, 1);
        let loaded: Vec<u32> = store.load(DocumentKey::History, Vec::new()).await;
        assert_eq!(loaded, vec![7]);
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let (store, _temp_dir) = create_test_store();
        // A directory in place of the file makes every write fail.
        fs::create_dir(store.path(DocumentKey::History)).unwrap();

        store.save(DocumentKey::History, &vec!["entry"]).await;
        let loaded: Vec<String> = store.load(DocumentKey::History, Vec::new()).await;

        assert!(loaded.is_empty());
    }
}
