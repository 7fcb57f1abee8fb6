use crate::artifact::artifact::TextRef;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Implementations report outages as `DashboardError::Storage`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, text: &TextRef, payload: &[u8]) -> Result<()>;
    async fn get(&self, text: &TextRef) -> Result<Option<Vec<u8>>>;
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<TextRef, Arc<[u8]>>>,
}

impl MemoryBlobStore {
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, text: &TextRef, payload: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.write().await;
        // content addressed, an existing entry already holds these bytes
        blobs
            .entry(text.clone())
            .or_insert_with(|| Arc::from(payload));
        Ok(())
    }

    async fn get(&self, text: &TextRef) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(text).map(|blob| blob.to_vec()))
    }
}
