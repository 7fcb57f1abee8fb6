use crate::model::bug::{Bug, BugKey};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

pub type BugHandle = Arc<Mutex<Bug>>;

#[derive(Default)]
pub struct BugStore {
    bugs: RwLock<HashMap<BugKey, BugHandle>>,
    // lock order: bugs, then extids
    extids: RwLock<HashMap<String, BugKey>>,
    next_seq: AtomicU64,
}

impl BugStore {
    pub async fn get(&self, key: &BugKey) -> Option<BugHandle> {
        self.bugs.read().await.get(key).cloned()
    }

    pub async fn get_by_extid(&self, extid: &str) -> Option<BugHandle> {
        let key = self.extids.read().await.get(extid).cloned()?;
        self.get(&key).await
    }

    // at most one caller per key runs `make`, the flag tells it apart
    pub async fn get_or_create<F>(&self, key: &BugKey, make: F) -> (BugHandle, bool)
    where
        F: FnOnce(u64) -> Bug,
    {
        if let Some(existing) = self.get(key).await {
            return (existing, false);
        }

        let mut bugs = self.bugs.write().await;
        match bugs.entry(key.clone()) {
            Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                let bug = make(seq);
                info!("Created bug {} {:?} (seq {})", bug.extid, bug.title, seq);

                self.extids
                    .write()
                    .await
                    .insert(bug.extid.clone(), key.clone());
                let handle = Arc::new(Mutex::new(bug));
                entry.insert(Arc::clone(&handle));
                (handle, true)
            }
        }
    }

    pub async fn all(&self) -> Vec<BugHandle> {
        self.bugs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.bugs.read().await.len()
    }
}
