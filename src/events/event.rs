use crate::api::wire::{BisectCompletion, BugUpdate, BuildUpload, CrashDescriptor};
use crate::model::commit::Commit;
use serde::{Deserialize, Serialize};

// one entry of a recorded event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    UploadBuild(BuildUpload),
    ReportCrash(CrashDescriptor),
    ReportingUpdate(BugUpdate),
    UploadCommits { commits: Vec<Commit> },
    CommitPoll,
    BisectionComplete(BisectCompletion),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UploadBuild(_) => "upload-build",
            Event::ReportCrash(_) => "report-crash",
            Event::ReportingUpdate(_) => "reporting-update",
            Event::UploadCommits { .. } => "upload-commits",
            Event::CommitPoll => "commit-poll",
            Event::BisectionComplete(_) => "bisection-complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::wire::BugId;
    use crate::bug::state::BisectKind;

    #[test]
    fn test_parse_events() {
        let content = r#"[
            {"type": "commit-poll"},
            {"type": "upload-commits", "commits": [{"hash": "hash1", "title": "foo: fix1"}]},
            {"type": "reporting-update", "id": {"extid": "decf42d66dced481afc1"},
             "status": "open", "fix_commits": ["foo: fix1"]},
            {"type": "bisection-complete", "bug": {"title": {"namespace": "test1", "title": "title1"}},
             "kind": "cause", "build_id": "build1",
             "commit": {"hash": "36e65cb4a0448942ec316b24d60446bbd5cc7827", "title": "kernel: add a bug"}}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(content).unwrap();
        assert_eq!(
            events.iter().map(Event::name).collect::<Vec<_>>(),
            vec!["commit-poll", "upload-commits", "reporting-update", "bisection-complete"]
        );

        match &events[2] {
            Event::ReportingUpdate(update) => {
                assert_eq!(update.id, BugId::ExtId("decf42d66dced481afc1".to_string()));
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &events[3] {
            Event::BisectionComplete(completion) => {
                assert_eq!(completion.kind, BisectKind::Cause);
                assert!(completion.commit.as_ref().unwrap().repo.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
