//! Run-scoped registries keyed by string id

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Minimal get/put/list registry
#[async_trait]
pub trait Store<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<T>;
    async fn put(&self, key: String, value: T);
    async fn list(&self) -> Vec<(String, T)>;
}

/// In-memory [`Store`]; clones share the same map
#[derive(Debug)]
pub struct MemoryStore<T> {
    entries: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<T> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: String, value: T) {
        debug!("📋 Registering entry {}", key);
        self.entries.write().await.insert(key, value);
    }

    async fn list(&self) -> Vec<(String, T)> {
        let mut entries: Vec<(String, T)> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_get_put_list() {
        let store: MemoryStore<u32> = MemoryStore::new();
        assert!(store.is_empty().await);
        assert_eq!(store.get("a").await, None);

        store.put("b".to_string(), 2).await;
        store.put("a".to_string(), 1).await;
        store.put("a".to_string(), 3).await;

        assert_eq!(store.get("a").await, Some(3));
        assert_eq!(store.len().await, 2);
        assert_eq!(
            store.list().await,
            vec![("a".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store: MemoryStore<String> = MemoryStore::new();
        let other = store.clone();
        other.put("k".to_string(), "v".to_string()).await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
    }
}
