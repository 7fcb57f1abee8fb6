use crate::artifact::blob::BlobStore;
use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextKind {
    KernelConfig,
    ReproSyz,
    ReproC,
    CrashLog,
    CrashReport,
}

impl TextKind {
    pub fn tag(&self) -> &'static str {
        match self {
            TextKind::KernelConfig => "KernelConfig",
            TextKind::ReproSyz => "ReproSyz",
            TextKind::ReproC => "ReproC",
            TextKind::CrashLog => "CrashLog",
            TextKind::CrashReport => "CrashReport",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "KernelConfig" => Some(TextKind::KernelConfig),
            "ReproSyz" => Some(TextKind::ReproSyz),
            "ReproC" => Some(TextKind::ReproC),
            "CrashLog" => Some(TextKind::CrashLog),
            "CrashReport" => Some(TextKind::CrashReport),
            _ => None,
        }
    }
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRef {
    pub kind: TextKind,
    pub id: String,
}

impl TextRef {
    pub fn url(&self) -> String {
        format!("/text?tag={}&x={}", self.kind.tag(), self.id)
    }
}

// kind tag is hashed in so kinds never share an id
pub fn text_id(kind: TextKind, payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.tag().as_bytes());
    hasher.update([0u8]);
    hasher.update(payload);
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Clone)]
pub struct ArtifactResolver {
    blobs: Arc<dyn BlobStore>,
}

impl ArtifactResolver {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        ArtifactResolver { blobs }
    }

    pub async fn store(&self, kind: TextKind, payload: &[u8]) -> Result<TextRef> {
        if payload.is_empty() {
            return Err(DashboardError::Validation(format!(
                "refusing to store empty {} artifact",
                kind
            )));
        }

        let text = TextRef {
            kind,
            id: text_id(kind, payload),
        };
        self.blobs.put(&text, payload).await?;

        debug!("Stored {} artifact {} ({} bytes)", kind, text.id, payload.len());

        Ok(text)
    }

    pub async fn store_optional(
        &self,
        kind: TextKind,
        payload: Option<&str>,
    ) -> Result<Option<TextRef>> {
        match payload {
            Some(text) if !text.is_empty() => Ok(Some(self.store(kind, text.as_bytes()).await?)),
            _ => Ok(None),
        }
    }

    pub async fn load(&self, text: &TextRef) -> Result<Vec<u8>> {
        self.blobs
            .get(text)
            .await?
            .ok_or_else(|| DashboardError::not_found("text", text.url()))
    }
}
