use anyhow::Result;
use crash_dashboard::api::dashboard::Dashboard;
use crash_dashboard::api::wire::BugId;
use crash_dashboard::config::config::Config;
use crash_dashboard::events::replay::{parse_file, replay};
use crash_dashboard::model::bug::BugStatus;
use std::io::Write;
use tracing::{info, warn};

const DEFAULT_EVENTS: &str = "datasets/sample-events.json";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .pretty()
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_EVENTS.to_string());

    let dashboard = Dashboard::new(Config::default());
    let events = parse_file(&path)?;
    let summary = replay(&dashboard, events).await?;
    info!("Replayed {} events from {}", summary.applied, path);

    let mut stdout = std::io::stdout().lock();
    for report in dashboard.poll_bugs().await {
        let response = dashboard.bug_json(&BugId::ExtId(report.id.clone())).await?;
        if response.is_empty() {
            warn!("Bug {} vanished before rendering", report.id);
            continue;
        }
        stdout.write_all(&response.body)?;
        writeln!(stdout)?;
    }

    for namespace in &dashboard.config().dashboard.namespaces {
        for status in [BugStatus::Open, BugStatus::Fixed] {
            let response = dashboard.group_json(namespace, Some(status)).await?;
            writeln!(stdout, "# {} ({})", namespace, status)?;
            stdout.write_all(&response.body)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
