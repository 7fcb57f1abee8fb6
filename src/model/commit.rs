use serde::{Deserialize, Serialize};

// repo/branch only set for commits out of a cause bisection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl Commit {
    pub fn new(hash: impl Into<String>, title: impl Into<String>) -> Self {
        Commit {
            hash: hash.into(),
            title: title.into(),
            repo: None,
            branch: None,
        }
    }
}

// declared fixing commit, hash filled in by reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixCommit {
    pub title: String,
    pub hash: Option<String>,
}

impl FixCommit {
    pub fn unresolved(title: impl Into<String>) -> Self {
        FixCommit {
            title: title.into(),
            hash: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.hash.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BisectedCommit {
    pub hash: String,
    pub title: String,
    pub repo: String,
    pub branch: String,
}

impl From<BisectedCommit> for Commit {
    fn from(commit: BisectedCommit) -> Self {
        Commit {
            hash: commit.hash,
            title: commit.title,
            repo: Some(commit.repo),
            branch: Some(commit.branch),
        }
    }
}
