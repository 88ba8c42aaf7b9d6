//! Two-tier rule resolution: override first, then base.

use std::collections::BTreeMap;

use super::store::RuleStore;
use super::types::{CatalogEntry, Resolution, ResolvedRules, RuleKey, Tier};
use crate::error::{Result, RuleError};

/// Answers "which rule applies for key K".
///
/// Precedence is fixed: the override store shadows the base store for any
/// key present in both. Resolution selects whole documents; nothing is merged.
#[derive(Debug, Clone, Copy)]
pub struct RuleResolver<'a> {
    base: &'a RuleStore,
    overrides: &'a RuleStore,
}

impl<'a> RuleResolver<'a> {
    /// Panics if the stores are passed in the wrong order.
    pub fn new(base: &'a RuleStore, overrides: &'a RuleStore) -> Self {
        assert_eq!(base.tier(), Tier::Base, "base store must hold the base tier");
        assert_eq!(
            overrides.tier(),
            Tier::Override,
            "override store must hold the override tier"
        );
        Self { base, overrides }
    }

    fn ensure_ready(&self) -> Result<()> {
        for store in [self.overrides, self.base] {
            if !store.is_loaded() {
                return Err(RuleError::NotReady { tier: store.tier() });
            }
        }
        Ok(())
    }

    pub fn resolve(&self, key: &RuleKey) -> Result<Resolution<'a>> {
        self.ensure_ready()?;

        if let Some(doc) = self.overrides.lookup(key)? {
            return Ok(Resolution::Found(doc));
        }
        if let Some(doc) = self.base.lookup(key)? {
            return Ok(Resolution::Found(doc));
        }
        Ok(Resolution::NotFound(key.clone()))
    }

    /// Parse `raw` as a key and resolve it.
    pub fn resolve_str(&self, raw: &str) -> Result<Resolution<'a>> {
        self.ensure_ready()?;
        self.resolve(&RuleKey::parse(raw)?)
    }

    /// Resolve several keys in order. Absent keys are collected, not fatal.
    pub fn resolve_all<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k RuleKey>,
    ) -> Result<ResolvedRules<'a>> {
        let mut resolved = ResolvedRules::new();
        for key in keys {
            resolved.push(self.resolve(key)?);
        }
        Ok(resolved)
    }

    /// The effective catalog under `prefix`: every key with the tier that wins for it.
    pub fn list(&self, prefix: &str) -> Result<Vec<CatalogEntry<'a>>> {
        self.ensure_ready()?;

        let mut entries: BTreeMap<&'a RuleKey, CatalogEntry<'a>> = BTreeMap::new();
        for key in self.base.list(prefix)? {
            entries.insert(
                key,
                CatalogEntry {
                    key,
                    tier: Tier::Base,
                    shadows_base: false,
                },
            );
        }
        for key in self.overrides.list(prefix)? {
            let shadows_base = entries.contains_key(key);
            entries.insert(
                key,
                CatalogEntry {
                    key,
                    tier: Tier::Override,
                    shadows_base,
                },
            );
        }

        Ok(entries.into_values().collect())
    }
}
