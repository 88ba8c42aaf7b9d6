//! Both rule tiers, loaded together.

use std::path::Path;

use tracing::debug;

use super::resolver::RuleResolver;
use super::source::{DirectorySource, RuleSource};
use super::store::RuleStore;
use crate::config::RulesConfig;
use crate::error::Result;

/// Owns the base and override stores and hands out resolvers over them.
#[derive(Debug)]
pub struct RuleSet {
    base: RuleStore,
    overrides: RuleStore,
}

impl RuleSet {
    /// Load both tiers from the directories named in `config`.
    ///
    /// The base directory must exist. A missing override directory means
    /// the project has no overrides.
    pub async fn load(config: &RulesConfig, root: &Path) -> Result<Self> {
        let base = DirectorySource::new(config.base_path(root))
            .with_extensions(config.extensions.iter().cloned());
        let overrides = DirectorySource::optional(config.override_path(root))
            .with_extensions(config.extensions.iter().cloned());

        Self::load_from(&base, &overrides).await
    }

    pub async fn load_from(base: &dyn RuleSource, overrides: &dyn RuleSource) -> Result<Self> {
        let mut set = Self {
            base: RuleStore::base(),
            overrides: RuleStore::overrides(),
        };
        set.base.load(base).await?;
        set.overrides.load(overrides).await?;

        debug!(
            base = set.base.len(),
            overrides = set.overrides.len(),
            "Rule set ready"
        );
        Ok(set)
    }

    pub fn resolver(&self) -> RuleResolver<'_> {
        RuleResolver::new(&self.base, &self.overrides)
    }

    pub fn base(&self) -> &RuleStore {
        &self.base
    }

    pub fn overrides(&self) -> &RuleStore {
        &self.overrides
    }
}
