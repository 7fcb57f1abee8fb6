use crate::artifact::artifact::TextRef;
use serde::{Deserialize, Serialize};

// provenance of one fuzzing build, immutable once registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: String,
    pub namespace: String,
    pub manager: String,
    pub kernel_repo: String,
    pub kernel_branch: String,
    pub kernel_commit: String,
    pub syzkaller_commit: String,
    pub syzkaller_git: String,
    pub kernel_config: TextRef,
}
