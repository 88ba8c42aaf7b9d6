//! Test project fixtures with base and override rule trees on disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

#[derive(Debug, Clone)]
pub struct TestFile {
    pub path: PathBuf,
    pub content: String,
}

impl TestFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

pub struct TestProjectFixture {
    root: TempDir,
}

impl TestProjectFixture {
    /// The scenarios used throughout the docs: one shared rule, one C#
    /// rule overridden by the project, and one override-only rule.
    pub fn standard() -> Self {
        TestProjectBuilder::new()
            .base("shared/git-workflow.md", "text A")
            .base("technology/csharp/coding-standards.md", "text B")
            .base("general/naming.md", "# Naming\n\nUse descriptive names.\n")
            .overrides("technology/csharp/coding-standards.md", "text C")
            .overrides("general/local-review.md", "text L")
            .build()
            .expect("Failed to create standard project fixture")
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn base_dir(&self) -> PathBuf {
        self.root.path().join("rules")
    }

    pub fn override_dir(&self) -> PathBuf {
        self.root.path().join(".rulekit/rules")
    }
}

pub struct TestProjectBuilder {
    base: Vec<TestFile>,
    overrides: Vec<TestFile>,
    config: Option<String>,
}

impl TestProjectBuilder {
    pub fn new() -> Self {
        Self {
            base: Vec::new(),
            overrides: Vec::new(),
            config: None,
        }
    }

    /// Add a file under the base rules directory (`rules/`).
    pub fn base(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.base.push(TestFile::new(path, content));
        self
    }

    /// Add a file under the override directory (`.rulekit/rules/`).
    pub fn overrides(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.overrides.push(TestFile::new(path, content));
        self
    }

    /// Write `.rulekit/config.toml`.
    pub fn config(mut self, toml: impl Into<String>) -> Self {
        self.config = Some(toml.into());
        self
    }

    pub fn build(self) -> std::io::Result<TestProjectFixture> {
        let root = TempDir::new()?;
        let base_dir = root.path().join("rules");
        let override_dir = root.path().join(".rulekit/rules");
        fs::create_dir_all(&base_dir)?;

        for (dir, files) in [(&base_dir, &self.base), (&override_dir, &self.overrides)] {
            for file in files {
                let file_path = dir.join(&file.path);
                if let Some(parent) = file_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&file_path, &file.content)?;
            }
        }

        if let Some(config) = &self.config {
            fs::create_dir_all(root.path().join(".rulekit"))?;
            fs::write(root.path().join(".rulekit/config.toml"), config)?;
        }

        Ok(TestProjectFixture { root })
    }
}

impl Default for TestProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}
