use crate::error::{DashboardError, Result};
use crate::model::commit::Commit;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

static COMMIT_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]{1,64}$").expect("commit hash pattern"));

#[derive(Default)]
pub struct CommitLedger {
    inner: RwLock<LedgerInner>,
}

#[derive(Default)]
struct LedgerInner {
    entries: Vec<Commit>,
    // title -> index of the latest entry with that title
    by_title: HashMap<String, usize>,
    hashes: HashSet<String>,
}

pub fn validate_commit(commit: &Commit) -> Result<()> {
    if commit.title.trim().is_empty() {
        return Err(DashboardError::Validation(format!(
            "commit {} has an empty title",
            commit.hash
        )));
    }
    if !COMMIT_HASH_RE.is_match(&commit.hash) {
        return Err(DashboardError::Validation(format!(
            "malformed commit hash {:?}",
            commit.hash
        )));
    }
    Ok(())
}

impl CommitLedger {
    // whole batch is validated before anything is written
    pub async fn append(&self, commits: &[Commit]) -> Result<usize> {
        for commit in commits {
            validate_commit(commit)?;
        }

        let mut inner = self.inner.write().await;
        let mut added = 0;
        for commit in commits {
            if !inner.hashes.insert(commit.hash.clone()) {
                debug!("Commit {} already in ledger, skipping", commit.hash);
                continue;
            }
            let idx = inner.entries.len();
            inner.entries.push(commit.clone());
            inner.by_title.insert(commit.title.clone(), idx);
            added += 1;
        }

        info!(
            "Appended {} new commits to ledger ({} total)",
            added,
            inner.entries.len()
        );

        Ok(added)
    }

    pub async fn find_by_title(&self, title: &str) -> Option<Commit> {
        let inner = self.inner.read().await;
        inner
            .by_title
            .get(title)
            .map(|&idx| inner.entries[idx].clone())
    }

    pub async fn contains_hash(&self, hash: &str) -> bool {
        self.inner.read().await.hashes.contains(hash)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_title() {
        let ledger = CommitLedger::default();
        ledger
            .append(&[Commit::new("hash1", "foo: fix1")])
            .await
            .unwrap();

        let found = ledger.find_by_title("foo: fix1").await.unwrap();
        assert_eq!(found.hash, "hash1");
        assert!(ledger.find_by_title("foo: fix2").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_hash_is_ignored() {
        let ledger = CommitLedger::default();
        assert_eq!(ledger.append(&[Commit::new("hash1", "a")]).await.unwrap(), 1);
        assert_eq!(ledger.append(&[Commit::new("hash1", "a")]).await.unwrap(), 0);
        assert_eq!(ledger.len().await, 1);
        assert!(ledger.contains_hash("hash1").await);
    }

    #[tokio::test]
    async fn test_latest_title_match_wins() {
        let ledger = CommitLedger::default();
        ledger
            .append(&[Commit::new("hash1", "net: fix"), Commit::new("hash2", "net: fix")])
            .await
            .unwrap();
        assert_eq!(ledger.find_by_title("net: fix").await.unwrap().hash, "hash2");
    }

    #[tokio::test]
    async fn test_invalid_batch_writes_nothing() {
        let ledger = CommitLedger::default();
        let err = ledger
            .append(&[Commit::new("hash1", "ok"), Commit::new("bad hash", "broken")])
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
        assert_eq!(ledger.len().await, 0);

        assert!(ledger.append(&[Commit::new("hash3", "  ")]).await.is_err());
    }
}
