//! Configuration types and loading.
//!
//! - `RulekitConfig`: top-level configuration stored in `.rulekit/config.toml`
//! - `RulesConfig`, `PromptConfig`: tier locations and prompt rendering limits
//! - `ProjectPaths`: project-local directory layout

mod settings;

pub use settings::{
    CONFIG_FILE, PromptConfig, ProjectPaths, RULEKIT_DIR, RulekitConfig, RulesConfig,
};
