use crate::api::wire::CrashDescriptor;
use crate::artifact::artifact::{ArtifactResolver, TextKind};
use crate::bug::store::BugStore;
use crate::error::{DashboardError, Result};
use crate::model::bug::{Bug, BugKey};
use crate::model::build::Build;
use crate::model::crash::Crash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugRef {
    pub key: BugKey,
    pub extid: String,
    pub created: bool,
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn dedup_key(namespace: &str, title: &str) -> BugKey {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    BugKey(hex(&hasher.finalize()))
}

pub fn extid_for(key: &BugKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"extid");
    hasher.update([0u8]);
    hasher.update(key.0.as_bytes());
    hex(&hasher.finalize()[..10])
}

pub fn validate_descriptor(build: &Build, descriptor: &CrashDescriptor) -> Result<()> {
    if descriptor.build_id != build.id {
        return Err(DashboardError::Validation(format!(
            "crash names build {:?} but was reported against {:?}",
            descriptor.build_id, build.id
        )));
    }
    let title = descriptor.title.trim();
    if title.is_empty() {
        return Err(DashboardError::Validation(
            "crash title cannot be empty".to_string(),
        ));
    }
    if title.contains('\n') {
        return Err(DashboardError::Validation(format!(
            "crash title must be a single line: {:?}",
            descriptor.title
        )));
    }
    Ok(())
}

// artifacts go in before the bug is touched
pub async fn ingest(
    store: &BugStore,
    resolver: &ArtifactResolver,
    build: &Build,
    descriptor: &CrashDescriptor,
) -> Result<BugRef> {
    validate_descriptor(build, descriptor)?;
    let title = descriptor.title.trim();

    let crash = Crash {
        title: title.to_string(),
        build_id: build.id.clone(),
        repro_syz: resolver
            .store_optional(TextKind::ReproSyz, descriptor.repro_syz.as_deref())
            .await?,
        repro_c: resolver
            .store_optional(TextKind::ReproC, descriptor.repro_c.as_deref())
            .await?,
        log: resolver
            .store_optional(TextKind::CrashLog, descriptor.log.as_deref())
            .await?,
        report: resolver
            .store_optional(TextKind::CrashReport, descriptor.report.as_deref())
            .await?,
    };

    let key = dedup_key(&build.namespace, title);
    let extid = extid_for(&key);

    let mut first = Some(crash);
    let (handle, created) = store
        .get_or_create(&key, |seq| {
            let mut bug = Bug::new(key.clone(), extid.clone(), &build.namespace, title, seq);
            bug.crashes.extend(first.take());
            bug
        })
        .await;

    let mut bug = handle.lock().await;
    if let Some(crash) = first {
        bug.crashes.push(crash);
    }

    if created {
        info!("New bug {} {:?} in {}", bug.extid, bug.title, bug.namespace);
    } else {
        debug!(
            "Crash appended to bug {} ({} crashes)",
            bug.extid,
            bug.crashes.len()
        );
    }

    Ok(BugRef {
        key: bug.key.clone(),
        extid: bug.extid.clone(),
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::artifact::TextRef;
    use crate::artifact::blob::MemoryBlobStore;
    use std::sync::Arc;

    fn build() -> Build {
        Build {
            id: "build1".to_string(),
            namespace: "test1".to_string(),
            manager: "manager1".to_string(),
            kernel_repo: "repo1".to_string(),
            kernel_branch: "branch1".to_string(),
            kernel_commit: "1111111111111111111111111111111111111111".to_string(),
            syzkaller_commit: "syzkaller_commit1".to_string(),
            syzkaller_git: "https://github.com/google/syzkaller/commits/syzkaller_commit1"
                .to_string(),
            kernel_config: TextRef {
                kind: TextKind::KernelConfig,
                id: "a989f27ebc47e2dc".to_string(),
            },
        }
    }

    fn crash(title: &str) -> CrashDescriptor {
        CrashDescriptor {
            build_id: "build1".to_string(),
            title: title.to_string(),
            repro_syz: None,
            repro_c: None,
            log: Some("log".to_string()),
            report: None,
        }
    }

    fn resolver() -> ArtifactResolver {
        ArtifactResolver::new(Arc::new(MemoryBlobStore::default()))
    }

    #[test]
    fn test_dedup_key_scoped_by_namespace() {
        assert_eq!(dedup_key("test1", "title1"), dedup_key("test1", "title1"));
        assert_ne!(dedup_key("test1", "title1"), dedup_key("test2", "title1"));
        assert_ne!(dedup_key("test1", "title1"), dedup_key("test1", "title2"));
    }

    #[test]
    fn test_extid_shape() {
        let extid = extid_for(&dedup_key("test1", "title1"));
        assert_eq!(extid.len(), 20);
        assert!(extid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_same_signature_one_bug() {
        let store = BugStore::default();
        let resolver = resolver();
        let build = build();

        let first = ingest(&store, &resolver, &build, &crash("title1")).await.unwrap();
        assert!(first.created);
        let mut second_desc = crash("title1");
        second_desc.repro_c = Some("int main() {}".to_string());
        let second = ingest(&store, &resolver, &build, &second_desc).await.unwrap();
        assert!(!second.created);
        assert_eq!(first.key, second.key);

        let bug = store.get(&first.key).await.unwrap();
        let bug = bug.lock().await;
        assert_eq!(bug.crashes.len(), 2);
        assert!(!bug.crashes[0].has_repro());
        assert!(bug.crashes[1].has_repro());
    }

    #[tokio::test]
    async fn test_rejects_bad_descriptor() {
        let store = BugStore::default();
        let resolver = resolver();
        let build = build();

        let err = ingest(&store, &resolver, &build, &crash("  ")).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));

        let err = ingest(&store, &resolver, &build, &crash("a\nb")).await.unwrap_err();
        assert!(matches!(err, DashboardError::Validation(_)));

        let mut other = crash("title1");
        other.build_id = "build2".to_string();
        assert!(ingest(&store, &resolver, &build, &other).await.is_err());
        assert_eq!(store.len().await, 0);
    }
}
