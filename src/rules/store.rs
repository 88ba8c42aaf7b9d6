//! Keyed storage for one tier of rule documents.

use std::collections::BTreeMap;
use std::collections::btree_map::{self, Entry};
use std::ops::Bound;

use tracing::{debug, warn};

use super::source::RuleSource;
use super::types::{RuleDocument, RuleKey, Tier, normalize};
use crate::error::{Result, RuleError};

#[derive(Debug)]
enum StoreState {
    Unloaded,
    Loaded {
        origin: String,
        documents: BTreeMap<RuleKey, RuleDocument>,
    },
}

/// One tier of rule documents.
///
/// A store starts `Unloaded` and becomes `Loaded` exactly once via
/// [`RuleStore::load`]. It is read-only afterwards, so shared references can
/// be used from any number of tasks.
#[derive(Debug)]
pub struct RuleStore {
    tier: Tier,
    state: StoreState,
}

impl RuleStore {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            state: StoreState::Unloaded,
        }
    }

    pub fn base() -> Self {
        Self::new(Tier::Base)
    }

    pub fn overrides() -> Self {
        Self::new(Tier::Override)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, StoreState::Loaded { .. })
    }

    /// Where the store was loaded from, once loaded.
    pub fn origin(&self) -> Option<&str> {
        match &self.state {
            StoreState::Loaded { origin, .. } => Some(origin),
            StoreState::Unloaded => None,
        }
    }

    /// Populate the store from `source`. Returns the number of documents stored.
    pub async fn load(&mut self, source: &dyn RuleSource) -> Result<usize> {
        if self.is_loaded() {
            return Err(RuleError::AlreadyLoaded { tier: self.tier });
        }

        let origin = source.describe();
        let mut documents = BTreeMap::new();

        for raw in source.read_documents().await? {
            match documents.entry(raw.key) {
                Entry::Vacant(slot) => {
                    let key = slot.key().clone();
                    slot.insert(RuleDocument::new(key, self.tier, raw.origin, raw.content));
                }
                Entry::Occupied(existing) => {
                    let kept: &RuleDocument = existing.get();
                    warn!(
                        key = %existing.key(),
                        kept = kept.source(),
                        skipped = %raw.origin,
                        "Duplicate rule key, keeping first"
                    );
                }
            }
        }

        let count = documents.len();
        debug!(tier = %self.tier, origin = %origin, count, "Loaded rules");
        self.state = StoreState::Loaded { origin, documents };
        Ok(count)
    }

    /// Get the document for `key`.
    pub fn get(&self, key: &RuleKey) -> Result<&RuleDocument> {
        self.lookup(key)?
            .ok_or_else(|| RuleError::NotFound(key.clone()))
    }

    /// Like [`get`](Self::get), but absence is `Ok(None)` rather than an error.
    pub fn lookup(&self, key: &RuleKey) -> Result<Option<&RuleDocument>> {
        Ok(self.documents()?.get(key))
    }

    pub fn contains(&self, key: &RuleKey) -> Result<bool> {
        Ok(self.documents()?.contains_key(key))
    }

    /// Keys under `prefix` in sorted order. Each call starts a fresh sequence.
    pub fn list(&self, prefix: &str) -> Result<RuleKeys<'_>> {
        let prefix = normalize(prefix);
        let range = self
            .documents()?
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded));

        Ok(RuleKeys {
            range,
            prefix,
            done: false,
        })
    }

    pub fn len(&self) -> usize {
        match &self.state {
            StoreState::Loaded { documents, .. } => documents.len(),
            StoreState::Unloaded => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn documents(&self) -> Result<&BTreeMap<RuleKey, RuleDocument>> {
        match &self.state {
            StoreState::Loaded { documents, .. } => Ok(documents),
            StoreState::Unloaded => Err(RuleError::NotReady { tier: self.tier }),
        }
    }
}

/// Lazy iterator over the keys of a [`RuleStore`] under a prefix.
pub struct RuleKeys<'a> {
    range: btree_map::Range<'a, RuleKey, RuleDocument>,
    prefix: String,
    done: bool,
}

impl<'a> Iterator for RuleKeys<'a> {
    type Item = &'a RuleKey;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for (key, _) in self.range.by_ref() {
            // Keys sharing the raw prefix are contiguous; past them nothing can match.
            if !key.as_str().starts_with(&self.prefix) {
                break;
            }
            if key.in_normalized_namespace(&self.prefix) {
                return Some(key);
            }
        }

        self.done = true;
        None
    }
}

impl std::iter::FusedIterator for RuleKeys<'_> {}
