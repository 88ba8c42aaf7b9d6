//! Two-tier rule documents.
//!
//! Rule documents (coding conventions, workflow policies, checklists) are
//! keyed by `category/name` and live in two tiers:
//!
//! | Tier     | Origin                           | Precedence |
//! |----------|----------------------------------|------------|
//! | Override | Project-local (`.rulekit/rules`) | Wins       |
//! | Base     | Shared rule set                  | Fallback   |
//!
//! Keys are namespaced by convention into `general/...`,
//! `technology/<tech>/...` and `shared/...`.

mod resolver;
mod set;
mod source;
mod store;
mod types;

pub use resolver::RuleResolver;
pub use set::RuleSet;
pub use source::{DEFAULT_EXTENSIONS, DirectorySource, MemorySource, RawDocument, RuleSource};
pub use store::{RuleKeys, RuleStore};
pub use types::{
    CatalogEntry, Resolution, ResolvedRules, RuleCategory, RuleDocument, RuleKey, RuleMetadata,
    Tier,
};
