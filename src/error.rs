use thiserror::Error;

use crate::rules::{RuleKey, Tier};

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Failed to load {origin}: {source}")]
    Load {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rule store not loaded: {tier} tier")]
    NotReady { tier: Tier },

    #[error("Rule not found: {0}")]
    NotFound(RuleKey),

    #[error("Invalid rule key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Rule store already loaded: {tier} tier")]
    AlreadyLoaded { tier: Tier },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Project not initialized. Run 'rulekit init' first.")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RuleError {
    pub fn load(origin: impl Into<String>, source: std::io::Error) -> Self {
        Self::Load {
            origin: origin.into(),
            source,
        }
    }

    /// Whether the error means "no such rule" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
