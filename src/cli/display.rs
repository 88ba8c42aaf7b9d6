use console::{Style, style};

use crate::rules::{CatalogEntry, Tier};

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_catalog(&self, entries: &[CatalogEntry<'_>]) {
        if entries.is_empty() {
            println!("{}", style("No rules found.").dim());
            return;
        }

        let overrides = entries.iter().filter(|e| e.tier == Tier::Override).count();
        let shadowing = entries.iter().filter(|e| e.shadows_base).count();

        println!(
            "Rules: {}  Overrides: {}  Shadowing base: {}",
            style(entries.len()).bold(),
            style(overrides).yellow(),
            style(shadowing).magenta()
        );
        println!();

        println!(
            "{:<10} {}",
            style("Tier").bold(),
            style("Key").bold()
        );
        println!("{}", style("─".repeat(60)).dim());

        for entry in entries {
            let marker = if entry.shadows_base { " (shadows base)" } else { "" };
            println!(
                "{:<10} {}{}",
                self.tier_style(entry.tier).apply_to(entry.tier.as_str()),
                entry.key,
                style(marker).dim()
            );
        }
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    /// Warnings go to stderr so rule content on stdout stays clean.
    pub fn print_warning(&self, message: &str) {
        eprintln!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    fn tier_style(&self, tier: Tier) -> Style {
        match tier {
            Tier::Base => Style::new().dim(),
            Tier::Override => Style::new().yellow().bold(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
