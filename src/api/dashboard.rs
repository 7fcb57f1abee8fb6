use crate::api::wire::{
    BisectCompletion, BugId, BugReport, BugUpdate, BuildUpload, CommitPollResult, CrashDescriptor,
};
use crate::artifact::artifact::{ArtifactResolver, TextKind, TextRef};
use crate::artifact::blob::{BlobStore, MemoryBlobStore};
use crate::bisect::linker::{BisectTarget, LinkOutcome, on_job_complete};
use crate::bug::state::{apply_status_update, reconcile_against_ledger};
use crate::bug::store::{BugHandle, BugStore};
use crate::config::config::Config;
use crate::error::{DashboardError, Result};
use crate::ingest::ingest::{BugRef, dedup_key, ingest};
use crate::ledger::ledger::CommitLedger;
use crate::model::bug::{BugKey, BugStatus};
use crate::model::build::Build;
use crate::model::commit::Commit;
use crate::render::json::{BugSummary, CONTENT_TYPE, render_bug, render_group};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl JsonResponse {
    fn json(body: Vec<u8>) -> Self {
        JsonResponse {
            content_type: CONTENT_TYPE,
            body,
        }
    }

    fn empty() -> Self {
        Self::json(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

pub struct Dashboard {
    config: Config,
    builds: RwLock<HashMap<String, Build>>,
    bugs: BugStore,
    ledger: CommitLedger,
    artifacts: ArtifactResolver,
}

impl Dashboard {
    pub fn new(config: Config) -> Self {
        Self::with_blob_store(config, Arc::new(MemoryBlobStore::default()))
    }

    pub fn with_blob_store(config: Config, blobs: Arc<dyn BlobStore>) -> Self {
        if let Err(e) = config.validate() {
            warn!("Dashboard started with an invalid config: {:#}", e);
        }
        Dashboard {
            config,
            builds: RwLock::new(HashMap::new()),
            bugs: BugStore::default(),
            ledger: CommitLedger::default(),
            artifacts: ArtifactResolver::new(blobs),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // first upload of an id wins
    pub async fn upload_build(&self, upload: BuildUpload) -> Result<()> {
        for (field, value) in [
            ("id", &upload.id),
            ("manager", &upload.manager),
            ("kernel_commit", &upload.kernel_commit),
            ("syzkaller_commit", &upload.syzkaller_commit),
            ("kernel_config", &upload.kernel_config),
        ] {
            if value.trim().is_empty() {
                return Err(DashboardError::Validation(format!(
                    "build field {} cannot be empty",
                    field
                )));
            }
        }
        if !self.config.knows_namespace(&upload.namespace) {
            return Err(DashboardError::not_found("namespace", upload.namespace));
        }

        if self.builds.read().await.contains_key(&upload.id) {
            debug!("Build {} already registered", upload.id);
            return Ok(());
        }

        let kernel_config = self
            .artifacts
            .store(TextKind::KernelConfig, upload.kernel_config.as_bytes())
            .await?;

        let build = Build {
            syzkaller_git: self.config.syzkaller_commit_url(&upload.syzkaller_commit),
            id: upload.id,
            namespace: upload.namespace,
            manager: upload.manager,
            kernel_repo: upload.kernel_repo,
            kernel_branch: upload.kernel_branch,
            kernel_commit: upload.kernel_commit,
            syzkaller_commit: upload.syzkaller_commit,
            kernel_config,
        };

        let mut builds = self.builds.write().await;
        if !builds.contains_key(&build.id) {
            info!(
                "Registered build {} for {}/{} at {}",
                build.id, build.namespace, build.manager, build.kernel_commit
            );
            builds.insert(build.id.clone(), build);
        }

        Ok(())
    }

    pub async fn report_crash(&self, crash: CrashDescriptor) -> Result<BugRef> {
        let build = self.build(&crash.build_id).await?;
        ingest(&self.bugs, &self.artifacts, &build, &crash).await
    }

    pub async fn poll_bugs(&self) -> Vec<BugReport> {
        let mut reports = Vec::new();
        for handle in self.bugs.all().await {
            let mut bug = handle.lock().await;
            if bug.reported {
                continue;
            }
            bug.reported = true;
            reports.push((
                bug.seq,
                BugReport {
                    id: bug.extid.clone(),
                    namespace: bug.namespace.clone(),
                    title: bug.title.clone(),
                },
            ));
        }
        reports.sort_by_key(|(seq, _)| *seq);
        reports.into_iter().map(|(_, report)| report).collect()
    }

    pub async fn reporting_update(&self, update: BugUpdate) -> Result<()> {
        if update.fix_commits.iter().any(|title| title.trim().is_empty()) {
            return Err(DashboardError::Validation(
                "fix commit titles cannot be empty".to_string(),
            ));
        }

        let handle = self.find_bug(&update.id).await?;
        let mut bug = handle.lock().await;
        apply_status_update(&mut bug, update.status, &update.fix_commits);

        info!(
            "Bug {} updated: status {}, {} fix commits",
            bug.extid,
            bug.status,
            bug.fix_commits.len()
        );

        Ok(())
    }

    pub async fn upload_commits(&self, commits: &[Commit]) -> Result<usize> {
        self.ledger.append(commits).await
    }

    pub async fn commit_poll(&self) -> CommitPollResult {
        let ledger = &self.ledger;
        let outcomes = join_all(self.bugs.all().await.into_iter().map(|handle| async move {
            let mut bug = handle.lock().await;
            if !bug.has_unresolved_fixes() {
                return (0, Vec::new());
            }
            let resolved = reconcile_against_ledger(&mut bug, ledger).await;
            let pending: Vec<String> = bug
                .fix_commits
                .iter()
                .filter(|fix| !fix.is_resolved())
                .map(|fix| fix.title.clone())
                .collect();
            (resolved, pending)
        }))
        .await;

        let mut result = CommitPollResult::default();
        for (resolved, pending) in outcomes {
            result.resolved += resolved;
            result.pending_titles.extend(pending);
        }
        result.pending_titles.sort();
        result.pending_titles.dedup();

        info!(
            "Commit poll resolved {} fix commits, {} titles still pending",
            result.resolved,
            result.pending_titles.len()
        );

        result
    }

    pub async fn bisection_complete(&self, completion: &BisectCompletion) -> Result<LinkOutcome> {
        on_job_complete(self, &self.config.bisect, completion).await
    }

    pub async fn find_bug(&self, id: &BugId) -> Result<BugHandle> {
        let found = match id {
            BugId::ExtId(extid) => self.bugs.get_by_extid(extid).await,
            BugId::Key(key) => self.bugs.get(&BugKey(key.clone())).await,
            BugId::Title { namespace, title } => {
                self.bugs.get(&dedup_key(namespace, title.trim())).await
            }
        };
        found.ok_or_else(|| DashboardError::not_found("bug", format!("{:?}", id)))
    }

    pub async fn bug_json(&self, id: &BugId) -> Result<JsonResponse> {
        let handle = match self.find_bug(id).await {
            Ok(handle) => handle,
            Err(DashboardError::NotFound { .. }) => {
                warn!("JSON requested for unknown bug {:?}", id);
                return Ok(JsonResponse::empty());
            }
            Err(e) => return Err(e),
        };

        let bug = handle.lock().await;
        let builds = self.builds.read().await;
        Ok(JsonResponse::json(render_bug(&bug, &builds)?))
    }

    pub async fn group_json(
        &self,
        namespace: &str,
        status: Option<BugStatus>,
    ) -> Result<JsonResponse> {
        if !self.config.knows_namespace(namespace) {
            warn!("JSON requested for unknown namespace {}", namespace);
            return Ok(JsonResponse::empty());
        }

        let mut members = Vec::new();
        for handle in self.bugs.all().await {
            let bug = handle.lock().await;
            if bug.namespace == namespace && status.is_none_or(|status| bug.status == status) {
                members.push((bug.seq, BugSummary::of(&bug)));
            }
        }
        members.sort_by_key(|(seq, _)| *seq);
        let summaries: Vec<BugSummary> = members.into_iter().map(|(_, summary)| summary).collect();

        Ok(JsonResponse::json(render_group(&summaries)?))
    }

    pub async fn text(&self, kind: TextKind, id: &str) -> Result<Vec<u8>> {
        self.artifacts
            .load(&TextRef {
                kind,
                id: id.to_string(),
            })
            .await
    }

    pub async fn bug_count(&self) -> usize {
        self.bugs.len().await
    }

    pub async fn build(&self, id: &str) -> Result<Build> {
        self.builds
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DashboardError::not_found("build", id))
    }
}

#[async_trait]
impl BisectTarget for Dashboard {
    async fn find_bug(&self, id: &BugId) -> Result<BugHandle> {
        Dashboard::find_bug(self, id).await
    }

    async fn build(&self, id: &str) -> Result<Build> {
        Dashboard::build(self, id).await
    }

    async fn record_commit(&self, commit: Commit) -> Result<()> {
        self.ledger.append(&[commit]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::wire::BisectCommitInfo;
    use crate::bug::state::BisectKind;

    fn upload(id: &str, namespace: &str) -> BuildUpload {
        BuildUpload {
            id: id.to_string(),
            namespace: namespace.to_string(),
            manager: "manager1".to_string(),
            kernel_repo: "repo1".to_string(),
            kernel_branch: "branch1".to_string(),
            kernel_commit: "1111111111111111111111111111111111111111".to_string(),
            syzkaller_commit: "syzkaller_commit1".to_string(),
            kernel_config: "CONFIG_KASAN=y".to_string(),
        }
    }

    fn crash(title: &str) -> CrashDescriptor {
        CrashDescriptor {
            build_id: "build1".to_string(),
            title: title.to_string(),
            repro_syz: None,
            repro_c: None,
            log: None,
            report: None,
        }
    }

    #[tokio::test]
    async fn test_upload_build_is_idempotent() {
        let dashboard = Dashboard::new(Config::builtin());
        dashboard.upload_build(upload("build1", "test1")).await.unwrap();

        let mut changed = upload("build1", "test1");
        changed.kernel_commit = "2222222222222222222222222222222222222222".to_string();
        dashboard.upload_build(changed).await.unwrap();

        let build = dashboard.build("build1").await.unwrap();
        assert_eq!(build.kernel_commit, "1111111111111111111111111111111111111111");
        assert_eq!(
            build.syzkaller_git,
            "https://github.com/google/syzkaller/commits/syzkaller_commit1"
        );
        assert_eq!(
            dashboard
                .text(TextKind::KernelConfig, &build.kernel_config.id)
                .await
                .unwrap(),
            b"CONFIG_KASAN=y".to_vec()
        );
    }

    #[tokio::test]
    async fn test_upload_build_validation() {
        let dashboard = Dashboard::new(Config::builtin());
        let err = dashboard
            .upload_build(upload("build1", "nosuchns"))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));

        let mut missing = upload("build1", "test1");
        missing.kernel_config.clear();
        let err = dashboard.upload_build(missing).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));
    }

    #[tokio::test]
    async fn test_crash_for_unknown_build() {
        let dashboard = Dashboard::new(Config::builtin());
        let err = dashboard.report_crash(crash("title1")).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { kind: "build", .. }));
        assert_eq!(dashboard.bug_count().await, 0);
    }

    #[tokio::test]
    async fn test_poll_bugs_reports_once() {
        let dashboard = Dashboard::new(Config::builtin());
        dashboard.upload_build(upload("build1", "test1")).await.unwrap();
        let bug1 = dashboard.report_crash(crash("title1")).await.unwrap();
        let bug2 = dashboard.report_crash(crash("title2")).await.unwrap();

        let reports = dashboard.poll_bugs().await;
        assert_eq!(
            reports.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec![bug1.extid.as_str(), bug2.extid.as_str()]
        );
        assert!(dashboard.poll_bugs().await.is_empty());

        dashboard.report_crash(crash("title1")).await.unwrap();
        assert!(dashboard.poll_bugs().await.is_empty());
    }

    #[tokio::test]
    async fn test_find_bug_by_every_id() {
        let dashboard = Dashboard::new(Config::builtin());
        dashboard.upload_build(upload("build1", "test1")).await.unwrap();
        let bug = dashboard.report_crash(crash("title1")).await.unwrap();

        for id in [
            BugId::ExtId(bug.extid.clone()),
            BugId::Key(bug.key.0.clone()),
            BugId::Title {
                namespace: "test1".to_string(),
                title: "title1".to_string(),
            },
        ] {
            let handle = dashboard.find_bug(&id).await.unwrap();
            assert_eq!(handle.lock().await.extid, bug.extid);
        }
    }

    #[tokio::test]
    async fn test_unknown_bug_json_is_empty() {
        let dashboard = Dashboard::new(Config::builtin());
        let response = dashboard
            .bug_json(&BugId::ExtId("0000".to_string()))
            .await
            .unwrap();
        assert_eq!(response.content_type, "application/json");
        assert!(response.is_empty());

        let response = dashboard.group_json("nosuchns", None).await.unwrap();
        assert_eq!(response.content_type, "application/json");
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_bug() {
        let dashboard = Dashboard::new(Config::builtin());
        let err = dashboard
            .reporting_update(BugUpdate {
                id: BugId::ExtId("missing".to_string()),
                status: BugStatus::Fixed,
                fix_commits: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_bisection_with_zero_retry_budget() {
        let mut config = Config::builtin();
        config.bisect.max_retries = 0;
        let dashboard = Dashboard::new(config);
        dashboard.upload_build(upload("build1", "test1")).await.unwrap();
        let bug = dashboard.report_crash(crash("title1")).await.unwrap();

        let outcome = dashboard
            .bisection_complete(&BisectCompletion {
                bug: BugId::ExtId(bug.extid.clone()),
                kind: BisectKind::Cause,
                build_id: "build1".to_string(),
                commit: Some(BisectCommitInfo {
                    hash: "36e65cb4a0448942ec316b24d60446bbd5cc7827".to_string(),
                    title: "kernel: add a bug".to_string(),
                    repo: None,
                    branch: None,
                }),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, LinkOutcome::Attached { .. }));

        let handle = dashboard.find_bug(&BugId::ExtId(bug.extid)).await.unwrap();
        let cause = handle.lock().await.cause_commit.clone().unwrap();
        assert_eq!(cause.repo, "repo1");
    }

    #[tokio::test]
    async fn test_commit_poll_reports_pending_titles() {
        let dashboard = Dashboard::new(Config::builtin());
        dashboard.upload_build(upload("build1", "test1")).await.unwrap();
        let bug = dashboard.report_crash(crash("title1")).await.unwrap();
        dashboard
            .reporting_update(BugUpdate {
                id: BugId::ExtId(bug.extid.clone()),
                status: BugStatus::Open,
                fix_commits: vec!["foo: fix1".to_string(), "foo: fix2".to_string()],
            })
            .await
            .unwrap();
        dashboard
            .upload_commits(&[Commit::new("hash1", "foo: fix1")])
            .await
            .unwrap();

        let result = dashboard.commit_poll().await;
        assert_eq!(result.resolved, 1);
        assert_eq!(result.pending_titles, vec!["foo: fix2".to_string()]);

        let again = dashboard.commit_poll().await;
        assert_eq!(again.resolved, 0);
    }
}
