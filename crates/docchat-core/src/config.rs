use crate::session::{DEFAULT_ASSISTANT_MARKER, DEFAULT_HUMAN_MARKER, MessageCodec};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub codec: CodecConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Root URL of the question-answering service, without a trailing path.
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CodecConfig {
    pub human_marker: String,
    pub assistant_marker: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            human_marker: DEFAULT_HUMAN_MARKER.to_string(),
            assistant_marker: DEFAULT_ASSISTANT_MARKER.to_string(),
        }
    }
}

impl CodecConfig {
    pub fn codec(&self) -> MessageCodec {
        MessageCodec::new(self.human_marker.clone(), self.assistant_marker.clone())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
