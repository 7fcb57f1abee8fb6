use crate::api::wire::{BisectCompletion, BugId};
use crate::bug::state::{BisectKind, attach_bisection};
use crate::bug::store::BugHandle;
use crate::config::config::BisectConfig;
use crate::error::{DashboardError, Result};
use crate::ledger::ledger::validate_commit;
use crate::model::build::Build;
use crate::model::commit::{BisectedCommit, Commit};
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

#[async_trait]
pub trait BisectTarget: Send + Sync {
    async fn find_bug(&self, id: &BugId) -> Result<BugHandle>;
    async fn build(&self, id: &str) -> Result<Build>;
    async fn record_commit(&self, commit: Commit) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Attached { extid: String, kind: BisectKind },
    Inconclusive,
    // bug no longer exists
    Dropped,
}

// transient errors are retried, anything else returns at once
pub async fn with_retries<T, F, Fut>(policy: &BisectConfig, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    // a zero budget still gets one attempt
    let attempts = policy.max_retries.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let millis = backoff.as_millis() as u64;
                let jitter = if millis == 0 {
                    0
                } else {
                    rand::rng().random_range(0..millis)
                };
                let sleep_duration = backoff + Duration::from_millis(jitter);

                warn!(
                    "{} failed: {}. Retrying in {:?} (attempt {}/{})",
                    what,
                    e,
                    sleep_duration,
                    attempt + 2,
                    attempts
                );
                sleep(sleep_duration).await;

                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    error!("{} failed after {} attempts: {}", what, attempt + 1, e);
                }
                return Err(e);
            }
        }
    }
}

pub async fn on_job_complete<T>(
    target: &T,
    policy: &BisectConfig,
    completion: &BisectCompletion,
) -> Result<LinkOutcome>
where
    T: BisectTarget + ?Sized,
{
    let Some(found) = &completion.commit else {
        info!(
            "{} bisection for {:?} was inconclusive, nothing to attach",
            completion.kind, completion.bug
        );
        return Ok(LinkOutcome::Inconclusive);
    };
    validate_commit(&Commit::new(found.hash.as_str(), found.title.as_str()))?;

    let handle = match with_retries(policy, "bug lookup", || target.find_bug(&completion.bug)).await
    {
        Ok(handle) => handle,
        Err(DashboardError::NotFound { kind, id }) => {
            warn!(
                "Dropping {} bisection result: {} {} not found",
                completion.kind, kind, id
            );
            return Ok(LinkOutcome::Dropped);
        }
        Err(e) => return Err(e),
    };

    let (repo, branch) = match (&found.repo, &found.branch) {
        (Some(repo), Some(branch)) => (repo.clone(), branch.clone()),
        _ => {
            let build = with_retries(policy, "build lookup", || {
                target.build(&completion.build_id)
            })
            .await?;
            (
                found.repo.clone().unwrap_or(build.kernel_repo),
                found.branch.clone().unwrap_or(build.kernel_branch),
            )
        }
    };
    if repo.is_empty() || branch.is_empty() {
        return Err(DashboardError::Validation(format!(
            "bisection commit {} has no repo/branch",
            found.hash
        )));
    }

    let commit = BisectedCommit {
        hash: found.hash.clone(),
        title: found.title.clone(),
        repo,
        branch,
    };

    if completion.kind == BisectKind::Cause {
        with_retries(policy, "ledger append", || {
            target.record_commit(Commit::from(commit.clone()))
        })
        .await?;
    }

    let mut bug = handle.lock().await;
    attach_bisection(&mut bug, completion.kind, commit);

    Ok(LinkOutcome::Attached {
        extid: bug.extid.clone(),
        kind: completion.kind,
    })
}
