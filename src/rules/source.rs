//! Origins a rule store can be loaded from.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::types::RuleKey;
use crate::error::{Result, RuleError};

/// Default file extensions treated as rule documents, in priority order.
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "mdc", "txt"];

/// A document as read from a source, before it is stamped with a tier.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub key: RuleKey,
    pub content: String,
    pub origin: String,
}

/// Something a [`RuleStore`](super::RuleStore) can be populated from.
///
/// Documents are returned in priority order: when two documents share a
/// key, the store keeps the first one.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Human-readable origin used in logs and errors.
    fn describe(&self) -> String;

    async fn read_documents(&self) -> Result<Vec<RawDocument>>;
}

/// Loads rules from a directory tree on disk.
///
/// ```text
/// rules/
/// ├── general/
/// │   └── naming.md                 # general/naming
/// ├── technology/
/// │   └── csharp/
/// │       └── coding-standards.md   # technology/csharp/coding-standards
/// └── shared/
///     └── git-workflow.md           # shared/git-workflow
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
    optional: bool,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            optional: false,
        }
    }

    /// A source whose root may be absent; a missing root yields no documents.
    pub fn optional(root: impl Into<PathBuf>) -> Self {
        Self {
            optional: true,
            ..Self::new(root)
        }
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_error(&self, source: io::Error) -> RuleError {
        RuleError::load(self.describe(), source)
    }

    /// Rule files under the root, skipping hidden entries.
    ///
    /// Symlinks are not traversed as directories. A link with a rule extension
    /// is kept unless it points at a directory, so a dangling link surfaces as
    /// a read failure.
    async fn collect_candidates(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let extensions = self.extensions.clone();

        let walked = tokio::task::spawn_blocking(move || -> io::Result<Vec<PathBuf>> {
            let mut candidates = Vec::new();
            for entry in WalkDir::new(&root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            {
                let entry = entry?;
                let file_type = entry.file_type();
                let is_file = if file_type.is_symlink() {
                    !std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir())
                } else {
                    file_type.is_file()
                };

                if is_file && extension_rank(&extensions, entry.path()).is_some() {
                    candidates.push(entry.into_path());
                }
            }
            Ok(candidates)
        })
        .await
        .map_err(|e| self.load_error(io::Error::other(e)))?;

        walked.map_err(|e| self.load_error(e))
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Position of the file's extension in the configured list.
fn extension_rank(extensions: &[String], path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    extensions.iter().position(|e| *e == ext)
}

#[async_trait]
impl RuleSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn read_documents(&self) -> Result<Vec<RawDocument>> {
        let exists = fs::try_exists(&self.root)
            .await
            .map_err(|e| self.load_error(e))?;
        if !exists {
            if self.optional {
                debug!(path = %self.root.display(), "Rules directory not found, skipping");
                return Ok(Vec::new());
            }
            return Err(self.load_error(io::Error::new(
                io::ErrorKind::NotFound,
                "directory does not exist",
            )));
        }

        let metadata = fs::metadata(&self.root)
            .await
            .map_err(|e| self.load_error(e))?;
        if !metadata.is_dir() {
            return Err(self.load_error(io::Error::new(
                io::ErrorKind::NotADirectory,
                "rules root is not a directory",
            )));
        }

        let mut keyed = Vec::new();
        for path in self.collect_candidates().await? {
            let relative = path.strip_prefix(&self.root).unwrap_or(path.as_path());
            match RuleKey::from_relative_path(relative) {
                Ok(key) => {
                    let rank = extension_rank(&self.extensions, &path).unwrap_or(usize::MAX);
                    keyed.push((key, rank, path));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping rule file"),
            }
        }
        keyed.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

        let mut documents = Vec::with_capacity(keyed.len());
        for (key, _, path) in keyed {
            let bytes = fs::read(&path)
                .await
                .map_err(|e| RuleError::load(path.display().to_string(), e))?;
            let content = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), "Rule file is not valid UTF-8, decoding lossily");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            documents.push(RawDocument {
                key,
                content,
                origin: path.display().to_string(),
            });
        }

        debug!(path = %self.root.display(), count = documents.len(), "Read rule files");
        Ok(documents)
    }
}

/// In-memory bundle of rule documents.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    label: String,
    documents: Vec<(String, String)>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push((key.into(), content.into()));
        self
    }
}

#[async_trait]
impl RuleSource for MemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn read_documents(&self) -> Result<Vec<RawDocument>> {
        let mut documents = Vec::with_capacity(self.documents.len());
        for (raw, content) in &self.documents {
            match RuleKey::parse(raw) {
                Ok(key) => documents.push(RawDocument {
                    key,
                    content: content.clone(),
                    origin: format!("{}:{}", self.label, raw),
                }),
                Err(e) => warn!(source = %self.label, error = %e, "Skipping bundled rule"),
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, content).await.unwrap();
    }

    fn keys(documents: &[RawDocument]) -> Vec<&str> {
        documents.iter().map(|d| d.key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_reads_nested_tree() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/git-workflow.md", b"text A").await;
        write(temp.path(), "technology/csharp/coding-standards.md", b"text B").await;
        write(temp.path(), "general/naming.txt", b"names").await;

        let documents = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap();

        assert_eq!(
            keys(&documents),
            vec![
                "general/naming",
                "shared/git-workflow",
                "technology/csharp/coding-standards"
            ]
        );
        assert_eq!(documents[1].content, "text A");
        assert!(documents[1].origin.ends_with("git-workflow.md"));
    }

    #[tokio::test]
    async fn test_skips_hidden_unknown_and_rootless_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/keep.md", b"keep").await;
        write(temp.path(), "shared/.draft.md", b"hidden").await;
        write(temp.path(), ".git/config.md", b"hidden dir").await;
        write(temp.path(), "shared/image.png", b"binary").await;
        write(temp.path(), "README.md", b"no category").await;

        let documents = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap();

        assert_eq!(keys(&documents), vec!["shared/keep"]);
    }

    #[tokio::test]
    async fn test_orders_duplicate_keys_by_extension_priority() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/policy.txt", b"from txt").await;
        write(temp.path(), "shared/policy.md", b"from md").await;

        let documents = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].content, "from md");
        assert_eq!(documents[1].content, "from txt");
    }

    #[tokio::test]
    async fn test_custom_extensions() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/a.md", b"md").await;
        write(temp.path(), "shared/b.rules", b"rules").await;

        let documents = DirectorySource::new(temp.path())
            .with_extensions(vec![".RULES".to_string()])
            .read_documents()
            .await
            .unwrap();

        assert_eq!(keys(&documents), vec!["shared/b"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decoded_lossily() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/bytes.md", &[b'o', b'k', 0xff]).await;

        let documents = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap();

        assert_eq!(documents[0].content, "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent");

        let err = DirectorySource::new(&missing)
            .read_documents()
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Load { .. }));

        let documents = DirectorySource::optional(&missing)
            .read_documents()
            .await
            .unwrap();
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_root_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("rules.md");
        fs::write(&file, "not a dir").await.unwrap();

        let err = DirectorySource::optional(&file)
            .read_documents()
            .await
            .unwrap_err();
        assert!(matches!(err, RuleError::Load { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_rule_file_fails_load() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shared/keep.md", b"keep").await;
        let dangling = temp.path().join("shared/broken.md");
        std::os::unix::fs::symlink(temp.path().join("gone.md"), &dangling).unwrap();

        let err = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap_err();

        match err {
            RuleError::Load { origin, .. } => assert!(origin.ends_with("broken.md")),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_directories_are_not_walked() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(temp.path(), "shared/keep.md", b"keep").await;
        write(outside.path(), "extra.md", b"outside").await;
        std::os::unix::fs::symlink(outside.path(), temp.path().join("linked")).unwrap();

        let documents = DirectorySource::new(temp.path())
            .read_documents()
            .await
            .unwrap();

        assert_eq!(keys(&documents), vec!["shared/keep"]);
    }

    #[tokio::test]
    async fn test_memory_source_skips_invalid_keys() {
        let source = MemorySource::new("bundled")
            .with_document("shared/git-workflow", "text A")
            .with_document("invalid", "dropped");

        let documents = source.read_documents().await.unwrap();
        assert_eq!(keys(&documents), vec!["shared/git-workflow"]);
        assert_eq!(documents[0].origin, "bundled:shared/git-workflow");
        assert_eq!(source.describe(), "bundled");
    }
}
