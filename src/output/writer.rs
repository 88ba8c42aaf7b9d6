use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::rules::{CatalogEntry, ResolvedRules, RuleDocument, RuleKey};

/// Writes command results to stdout in the selected format.
///
/// - Text: raw rule content or human-readable listings (default)
/// - Json: one JSON object per command
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Emit a resolved rule. Text mode prints the content unchanged.
    pub fn emit_rule(&self, rule: &RuleDocument) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(rule.content().as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
            OutputFormat::Json => self.write_json(rule),
        }
    }

    /// Emit the effective catalog. Text mode is handled by `Display`.
    pub fn emit_catalog(&self, entries: &[CatalogEntry<'_>]) -> Result<()> {
        self.write_json(entries)
    }

    /// Emit a rendered prompt.
    pub fn emit_prompt(&self, resolved: &ResolvedRules<'_>, prompt: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(prompt.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
            OutputFormat::Json => {
                let output = PromptOutput {
                    rules: resolved.rules().iter().map(|r| r.key()).collect(),
                    missing: resolved.missing(),
                    prompt,
                };
                self.write_json(&output)
            }
        }
    }

    /// Emit a simple message.
    pub fn emit_message(&self, message: &str) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!("{}", message);
                Ok(())
            }
            OutputFormat::Json => self.write_json(&MessageOutput { message }),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json)?;
        stdout.flush()?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PromptOutput<'a> {
    rules: Vec<&'a RuleKey>,
    missing: &'a [RuleKey],
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct MessageOutput<'a> {
    message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Resolution, Tier};

    #[test]
    fn test_prompt_output_shape() {
        let doc = RuleDocument::new(
            RuleKey::parse("shared/git-workflow").unwrap(),
            Tier::Base,
            "test",
            "text A".into(),
        );
        let mut resolved = ResolvedRules::new();
        resolved.push(Resolution::Found(&doc));
        resolved.push(Resolution::NotFound(
            RuleKey::parse("technology/java/coding-standards").unwrap(),
        ));

        let output = PromptOutput {
            rules: resolved.rules().iter().map(|r| r.key()).collect(),
            missing: resolved.missing(),
            prompt: "p",
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["rules"][0], "shared/git-workflow");
        assert_eq!(json["missing"][0], "technology/java/coding-standards");
        assert_eq!(json["prompt"], "p");
    }

    #[test]
    fn test_rule_document_json_fields() {
        let doc = RuleDocument::new(
            RuleKey::parse("technology/csharp/coding-standards").unwrap(),
            Tier::Override,
            ".rulekit/rules/technology/csharp/coding-standards.md",
            "---\ndescription: House style\n---\n# C# Standards\n".into(),
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["key"], "technology/csharp/coding-standards");
        assert_eq!(json["tier"], "override");
        assert_eq!(json["description"], "House style");
        assert_eq!(json["title"], "C# Standards");
        assert!(json["content"].as_str().unwrap().contains("# C# Standards"));
    }
}
