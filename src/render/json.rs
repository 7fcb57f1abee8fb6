use crate::error::{DashboardError, Result};
use crate::model::bug::Bug;
use crate::model::build::Build;
use crate::model::commit::{BisectedCommit, FixCommit};
use crate::render::formatter::to_vec_html_safe;
use serde::Serialize;
use std::collections::HashMap;

pub const SCHEMA_VERSION: u32 = 1;
pub const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
pub struct BugDescription<'a> {
    pub version: u32,
    pub title: &'a str,
    #[serde(rename = "fix-commits", skip_serializing_if = "Vec::is_empty")]
    pub fix_commits: Vec<CommitDescription<'a>>,
    #[serde(rename = "cause-commit", skip_serializing_if = "Option::is_none")]
    pub cause_commit: Option<CommitDescription<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crashes: Vec<CrashDescription<'a>>,
}

#[derive(Debug, Serialize)]
pub struct CommitDescription<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

impl<'a> From<&'a FixCommit> for CommitDescription<'a> {
    fn from(fix: &'a FixCommit) -> Self {
        CommitDescription {
            title: &fix.title,
            hash: fix.hash.as_deref(),
            repo: None,
            branch: None,
        }
    }
}

impl<'a> From<&'a BisectedCommit> for CommitDescription<'a> {
    fn from(commit: &'a BisectedCommit) -> Self {
        CommitDescription {
            title: &commit.title,
            hash: Some(&commit.hash),
            repo: Some(&commit.repo),
            branch: Some(&commit.branch),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CrashDescription<'a> {
    #[serde(rename = "syz-reproducer", skip_serializing_if = "Option::is_none")]
    pub syz_reproducer: Option<String>,
    #[serde(rename = "c-reproducer", skip_serializing_if = "Option::is_none")]
    pub c_reproducer: Option<String>,
    #[serde(rename = "kernel-config")]
    pub kernel_config: String,
    #[serde(rename = "kernel-source-commit")]
    pub kernel_source_commit: &'a str,
    #[serde(rename = "syzkaller-git")]
    pub syzkaller_git: &'a str,
    #[serde(rename = "syzkaller-commit")]
    pub syzkaller_commit: &'a str,
}

#[derive(Debug, Serialize)]
pub struct BugGroupDescription<'a> {
    pub version: u32,
    // an empty group is rendered as null, not []
    #[serde(rename = "Bugs")]
    pub bugs: Option<&'a [BugSummary]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugSummary {
    pub title: String,
    pub link: String,
}

impl BugSummary {
    pub fn of(bug: &Bug) -> Self {
        BugSummary {
            title: bug.title.clone(),
            link: bug_link(&bug.extid),
        }
    }
}

pub fn bug_link(extid: &str) -> String {
    format!("/bug?extid={}", extid)
}

pub fn describe_bug<'a>(
    bug: &'a Bug,
    builds: &'a HashMap<String, Build>,
) -> Result<BugDescription<'a>> {
    let crashes = bug
        .crashes
        .iter()
        .map(|crash| -> Result<CrashDescription<'a>> {
            let build = builds
                .get(&crash.build_id)
                .ok_or_else(|| DashboardError::not_found("build", crash.build_id.as_str()))?;
            Ok(CrashDescription {
                syz_reproducer: crash.repro_syz.as_ref().map(|text| text.url()),
                c_reproducer: crash.repro_c.as_ref().map(|text| text.url()),
                kernel_config: build.kernel_config.url(),
                kernel_source_commit: &build.kernel_commit,
                syzkaller_git: &build.syzkaller_git,
                syzkaller_commit: &build.syzkaller_commit,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BugDescription {
        version: SCHEMA_VERSION,
        title: &bug.title,
        fix_commits: bug.fix_commits.iter().map(CommitDescription::from).collect(),
        cause_commit: bug.cause_commit.as_ref().map(CommitDescription::from),
        crashes,
    })
}

pub fn render_bug(bug: &Bug, builds: &HashMap<String, Build>) -> Result<Vec<u8>> {
    let description = describe_bug(bug, builds)?;
    Ok(to_vec_html_safe(&description)?)
}

pub fn render_group(bugs: &[BugSummary]) -> Result<Vec<u8>> {
    let group = BugGroupDescription {
        version: SCHEMA_VERSION,
        bugs: if bugs.is_empty() { None } else { Some(bugs) },
    };
    Ok(to_vec_html_safe(&group)?)
}
