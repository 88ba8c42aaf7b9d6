pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod rules;

pub use config::{ProjectPaths, RulekitConfig};
pub use error::{Result, RuleError};
pub use rules::{
    Resolution, ResolvedRules, RuleDocument, RuleKey, RuleResolver, RuleSet, RuleStore, Tier,
};
