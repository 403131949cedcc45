use crate::models::Document;
use crate::traits::DocumentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Mutex-guarded in-memory document store. This is the only shared
/// mutable state in the pipeline; concurrent requests go through the
/// lock rather than racing on the map.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, id: &str, document: Document) {
        self.documents.lock().await.insert(id.to_string(), document);
    }

    async fn get(&self, id: &str) -> Option<Document> {
        self.documents.lock().await.get(id).cloned()
    }
}
