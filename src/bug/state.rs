use crate::ledger::ledger::CommitLedger;
use crate::model::bug::{Bug, BugStatus};
use crate::model::commit::{BisectedCommit, FixCommit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BisectKind {
    Cause,
    Fix,
}

impl fmt::Display for BisectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BisectKind::Cause => write!(f, "cause"),
            BisectKind::Fix => write!(f, "fix"),
        }
    }
}

// resolved hashes survive for titles that stay declared
pub fn apply_status_update(bug: &mut Bug, status: BugStatus, fix_titles: &[String]) {
    let mut seen = HashSet::new();
    let fix_commits: Vec<FixCommit> = fix_titles
        .iter()
        .filter(|title| seen.insert(*title))
        .map(|title| {
            bug.fix_commits
                .iter()
                .find(|fix| &fix.title == title && fix.is_resolved())
                .cloned()
                .unwrap_or_else(|| FixCommit::unresolved(title.as_str()))
        })
        .collect();

    if bug.status != status {
        info!(
            "Bug {} status {} -> {}",
            bug.extid, bug.status, status
        );
    }
    bug.status = status;
    bug.fix_commits = fix_commits;
}

pub async fn reconcile_against_ledger(bug: &mut Bug, ledger: &CommitLedger) -> usize {
    let mut resolved = 0;
    for fix in bug.fix_commits.iter_mut().filter(|fix| !fix.is_resolved()) {
        if let Some(commit) = ledger.find_by_title(&fix.title).await {
            debug!(
                "Bug {}: fix {:?} resolved to {}",
                bug.extid, fix.title, commit.hash
            );
            fix.hash = Some(commit.hash);
            resolved += 1;
        }
    }
    resolved
}

pub fn attach_bisection(bug: &mut Bug, kind: BisectKind, commit: BisectedCommit) {
    info!(
        "Bug {}: {} bisection points to {} {:?}",
        bug.extid, kind, commit.hash, commit.title
    );
    match kind {
        BisectKind::Cause => bug.cause_commit = Some(commit),
        BisectKind::Fix => bug.fix_bisection = Some(commit),
    }
}
