use crate::model::commit::{BisectedCommit, FixCommit};
use crate::model::crash::Crash;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugStatus {
    Open,
    Fixed,
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BugStatus::Open => write!(f, "open"),
            BugStatus::Fixed => write!(f, "fixed"),
        }
    }
}

// dedup key derived from the crash signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BugKey(pub String);

impl fmt::Display for BugKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bug {
    pub key: BugKey,
    pub extid: String,
    pub namespace: String,
    pub title: String,
    pub status: BugStatus,
    pub fix_commits: Vec<FixCommit>,
    pub cause_commit: Option<BisectedCommit>,
    // recorded but never rendered
    pub fix_bisection: Option<BisectedCommit>,
    pub crashes: Vec<Crash>,
    pub seq: u64,
    pub reported: bool,
}

impl Bug {
    pub fn new(key: BugKey, extid: String, namespace: &str, title: &str, seq: u64) -> Self {
        Bug {
            key,
            extid,
            namespace: namespace.to_string(),
            title: title.to_string(),
            status: BugStatus::Open,
            fix_commits: Vec::new(),
            cause_commit: None,
            fix_bisection: None,
            crashes: Vec::new(),
            seq,
            reported: false,
        }
    }

    pub fn has_unresolved_fixes(&self) -> bool {
        self.fix_commits.iter().any(|fix| !fix.is_resolved())
    }
}
