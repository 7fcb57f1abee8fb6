use crate::artifact::artifact::TextRef;
use serde::{Deserialize, Serialize};

// one observed failure; large payloads are only held as references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crash {
    pub title: String,
    pub build_id: String,
    pub repro_syz: Option<TextRef>,
    pub repro_c: Option<TextRef>,
    pub log: Option<TextRef>,
    pub report: Option<TextRef>,
}

impl Crash {
    pub fn has_repro(&self) -> bool {
        self.repro_syz.is_some() || self.repro_c.is_some()
    }
}
