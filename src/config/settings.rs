use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, RuleError};
use crate::rules::DEFAULT_EXTENSIONS;

/// Name of the project-local directory holding configuration and overrides.
pub const RULEKIT_DIR: &str = ".rulekit";

/// File name of the configuration inside [`RULEKIT_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulekitConfig {
    pub rules: RulesConfig,
    pub prompt: PromptConfig,
}

impl RulekitConfig {
    pub async fn load(rulekit_dir: &Path) -> Result<Self> {
        let config_path = rulekit_dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, rulekit_dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = rulekit_dir.join(CONFIG_FILE);
        let content =
            toml::to_string_pretty(self).map_err(|e| RuleError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.rules.base_dir.as_os_str().is_empty() {
            errors.push("rules.base_dir must not be empty");
        }
        if self.rules.override_dir.as_os_str().is_empty() {
            errors.push("rules.override_dir must not be empty");
        }
        if self.rules.base_dir == self.rules.override_dir {
            errors.push("rules.base_dir and rules.override_dir must differ");
        }
        if self.rules.extensions.is_empty() {
            errors.push("rules.extensions must list at least one extension");
        }
        if self
            .rules
            .extensions
            .iter()
            .any(|e| e.trim_start_matches('.').is_empty())
        {
            errors.push("rules.extensions must not contain empty entries");
        }

        if self.prompt.max_chars == 0 {
            errors.push("prompt.max_chars must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RuleError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Where the two rule tiers live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Shared base rules. Relative paths resolve against the project root.
    pub base_dir: PathBuf,
    /// Project-local overrides. Optional on disk.
    pub override_dir: PathBuf,
    /// File extensions read as rule documents, highest priority first.
    pub extensions: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("rules"),
            override_dir: Path::new(RULEKIT_DIR).join("rules"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl RulesConfig {
    pub fn base_path(&self, root: &Path) -> PathBuf {
        root.join(&self.base_dir)
    }

    pub fn override_path(&self, root: &Path) -> PathBuf {
        root.join(&self.override_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Maximum combined rule content (characters) in a rendered prompt.
    pub max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_chars: 50_000 }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub rulekit_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: PathBuf) -> Self {
        Self {
            rulekit_dir: root.join(RULEKIT_DIR),
            root,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.rulekit_dir.join(CONFIG_FILE)
    }

    /// A project is initialized once its config file exists. An override
    /// tree under `.rulekit/rules` alone does not count.
    pub fn is_initialized(&self) -> bool {
        self.config_file().is_file()
    }

    pub async fn ensure_dirs(&self, config: &RulekitConfig) -> Result<()> {
        for dir in [
            self.rulekit_dir.clone(),
            config.rules.override_path(&self.root),
        ] {
            fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}
