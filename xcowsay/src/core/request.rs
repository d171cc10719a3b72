use xcowsay_ipc::{CowMode, RequestInfo};

/// A single display request: a message to say or think, or an image path to
/// dream about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CowRequest {
    pub content: String,
    pub mode: CowMode,
}

impl CowRequest {
    pub fn new(content: impl Into<String>, mode: CowMode) -> Self {
        Self {
            content: content.into(),
            mode,
        }
    }

    pub fn say(text: impl Into<String>) -> Self {
        Self::new(text, CowMode::Normal)
    }

    pub fn think(text: impl Into<String>) -> Self {
        Self::new(text, CowMode::Think)
    }

    pub fn dream(path: impl Into<String>) -> Self {
        Self::new(path, CowMode::Dream)
    }

    pub fn info(&self) -> RequestInfo {
        RequestInfo {
            mode: self.mode,
            content: self.content.clone(),
        }
    }
}
