use crate::api::dashboard::Dashboard;
use crate::bisect::linker::LinkOutcome;
use crate::events::event::Event;
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub bugs_created: usize,
    pub fixes_resolved: usize,
    pub bisections_attached: usize,
}

pub fn parse_file(filepath: &str) -> Result<Vec<Event>> {
    let json_content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read json file {:?}", &filepath))?;

    let events: Vec<Event> = serde_json::from_str(&json_content)
        .with_context(|| format!("Failed to parse json file {:?}", &filepath))?;

    info!(
        "Parsing {} events from file {} successfully",
        events.len(),
        filepath
    );

    Ok(events)
}

pub async fn replay(dashboard: &Dashboard, events: Vec<Event>) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (idx, event) in events.into_iter().enumerate() {
        let name = event.name();
        let context = || format!("event #{} ({}) failed", idx, name);

        match event {
            Event::UploadBuild(upload) => dashboard.upload_build(upload).await.with_context(context)?,
            Event::ReportCrash(crash) => {
                let bug = dashboard.report_crash(crash).await.with_context(context)?;
                if bug.created {
                    summary.bugs_created += 1;
                }
            }
            Event::ReportingUpdate(update) => {
                dashboard.reporting_update(update).await.with_context(context)?
            }
            Event::UploadCommits { commits } => {
                dashboard.upload_commits(&commits).await.with_context(context)?;
            }
            Event::CommitPoll => {
                summary.fixes_resolved += dashboard.commit_poll().await.resolved;
            }
            Event::BisectionComplete(completion) => {
                let outcome = dashboard
                    .bisection_complete(&completion)
                    .await
                    .with_context(context)?;
                if matches!(outcome, LinkOutcome::Attached { .. }) {
                    summary.bisections_attached += 1;
                }
            }
        }
        summary.applied += 1;
    }

    info!("Replay finished: {:?}", summary);

    Ok(summary)
}
