use crate::bug::state::BisectKind;
use crate::model::bug::BugStatus;
use serde::{Deserialize, Serialize};

// build registration as sent by a fuzzing manager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildUpload {
    pub id: String,
    pub namespace: String,
    pub manager: String,
    #[serde(default)]
    pub kernel_repo: String,
    #[serde(default)]
    pub kernel_branch: String,
    pub kernel_commit: String,
    pub syzkaller_commit: String,
    pub kernel_config: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashDescriptor {
    pub build_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repro_syz: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repro_c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugUpdate {
    pub id: BugId,
    pub status: BugStatus,
    #[serde(default)]
    pub fix_commits: Vec<String>,
}

// a bug handed out to a reporting channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    pub id: String,
    pub namespace: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPollResult {
    pub resolved: usize,
    pub pending_titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugId {
    ExtId(String),
    Key(String),
    Title { namespace: String, title: String },
}

// completion event of a bisection job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BisectCompletion {
    pub bug: BugId,
    pub kind: BisectKind,
    pub build_id: String,
    // none when inconclusive
    #[serde(default)]
    pub commit: Option<BisectCommitInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BisectCommitInfo {
    pub hash: String,
    pub title: String,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}
