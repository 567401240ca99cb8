use crate::models::RequestDefinition;
use crate::store::{DocumentKey, JsonStore};
use std::collections::BTreeMap;
use tracing::info;

pub type SavedRequestMap = BTreeMap<String, RequestDefinition>;

/// Named request templates. Every call re-reads the document so changes made
/// by another process are picked up. Writes within this process are
/// serialized by the store; writers in other processes still race.
#[derive(Debug, Clone)]
pub struct SavedRequests {
    store: JsonStore,
}

impl SavedRequests {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> SavedRequestMap {
        self.store
            .load(DocumentKey::SavedRequests, SavedRequestMap::new())
            .await
    }

    pub async fn get(&self, name: &str) -> Option<RequestDefinition> {
        self.list().await.remove(name)
    }

    /// Inserts or overwrites `name`.
    pub async fn put(&self, name: &str, definition: RequestDefinition) {
        self.store
            .update(DocumentKey::SavedRequests, SavedRequestMap::new(), |saved| {
                saved.insert(name.to_string(), definition);
            })
            .await;
        info!(name, "Saved request");
    }

    /// Returns the removed definition, or `None` if `name` was not saved.
    pub async fn delete(&self, name: &str) -> Option<RequestDefinition> {
        let removed = self
            .store
            .update(DocumentKey::SavedRequests, SavedRequestMap::new(), |saved| {
                saved.remove(name)
            })
            .await;
        if removed.is_some() {
            info!(name, "Deleted saved request");
        }
        removed
    }
}
