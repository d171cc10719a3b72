use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Display requests
    ShowCow { text: String },
    Think { text: String },
    Dream { path: String },

    // Queries
    Status,

    // Control
    Quit,
}

impl Command {
    pub fn from_request(mode: CowMode, content: impl Into<String>) -> Self {
        let content = content.into();
        match mode {
            CowMode::Normal => Command::ShowCow { text: content },
            CowMode::Think => Command::Think { text: content },
            CowMode::Dream => Command::Dream { path: content },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CowMode {
    Normal,
    Think,
    Dream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error {
        message: String,
    },
    Status {
        pending: usize,
        current: Option<RequestInfo>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub mode: CowMode,
    pub content: String,
}
