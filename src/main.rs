use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rulekit::cli::{Cli, Commands, ConfigAction, Display, OutputFormat};
use rulekit::config::{ProjectPaths, RULEKIT_DIR, RulekitConfig};
use rulekit::error::{Result, RuleError};
use rulekit::output::OutputWriter;
use rulekit::rules::{RuleKey, RuleSet};

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

/// Project location plus the effective configuration.
struct Project {
    paths: ProjectPaths,
    config: RulekitConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("rulekit=debug")
    } else {
        EnvFilter::new("rulekit=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let display = Display::new();
    let writer = OutputWriter::new(cli.output);
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };
    let root = match cli.root {
        Some(root) => root,
        None => find_project_root()?,
    };

    let base_dir = cli.base_dir;

    match cli.command {
        Commands::Init => cmd_init(&out, root).await,
        Commands::Resolve { key } => {
            let project = open_project(root, base_dir).await?;
            cmd_resolve(&out, &project, &key).await
        }
        Commands::List { prefix } => {
            let project = open_project(root, base_dir).await?;
            cmd_list(&out, &project, prefix).await
        }
        Commands::Prompt { keys, max_chars } => {
            let project = open_project(root, base_dir).await?;
            cmd_prompt(&out, &project, &keys, max_chars).await
        }
        Commands::Config { action } => cmd_config(&out, root, base_dir, action).await,
    }
}

/// Nearest ancestor containing `.rulekit`, falling back to the current directory.
fn find_project_root() -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = current
        .ancestors()
        .find(|dir| dir.join(RULEKIT_DIR).is_dir())
        .unwrap_or(current.as_path())
        .to_path_buf();
    debug!(root = %root.display(), "Project root");
    Ok(root)
}

async fn open_project(root: PathBuf, base_dir: Option<PathBuf>) -> Result<Project> {
    let paths = ProjectPaths::new(root);
    let mut config = RulekitConfig::load(&paths.rulekit_dir).await?;
    if let Some(base_dir) = base_dir {
        config.rules.base_dir = base_dir;
        config.validate()?;
    }
    Ok(Project { paths, config })
}

async fn load_rules(project: &Project) -> Result<RuleSet> {
    RuleSet::load(&project.config.rules, &project.paths.root).await
}

async fn cmd_init(out: &OutputContext<'_>, root: PathBuf) -> Result<()> {
    let config = RulekitConfig::default();
    let paths = ProjectPaths::new(root);

    if paths.is_initialized() {
        if out.writer.format() == OutputFormat::Text {
            out.display
                .print_warning("rulekit is already initialized in this project.");
        }
        return Ok(());
    }

    paths.ensure_dirs(&config).await?;
    config.save(&paths.rulekit_dir).await?;

    if out.writer.format() == OutputFormat::Text {
        out.display.print_success("Initialized rulekit.");
        out.display
            .print_info(&format!("Configuration: {}", paths.config_file().display()));
        out.display.print_info(&format!(
            "Overrides: {}",
            config.rules.override_path(&paths.root).display()
        ));
    } else {
        out.writer.emit_message("Initialized rulekit")?;
    }

    Ok(())
}

async fn cmd_resolve(out: &OutputContext<'_>, project: &Project, key: &str) -> Result<()> {
    let rules = load_rules(project).await?;
    let rule = rules.resolver().resolve_str(key)?.into_document()?;
    debug!(key = %rule.key(), tier = %rule.tier(), source = rule.source(), "Resolved");
    out.writer.emit_rule(rule)
}

async fn cmd_list(
    out: &OutputContext<'_>,
    project: &Project,
    prefix: Option<String>,
) -> Result<()> {
    let rules = load_rules(project).await?;
    let entries = rules.resolver().list(prefix.as_deref().unwrap_or_default())?;

    match out.writer.format() {
        OutputFormat::Text => {
            out.display.print_catalog(&entries);
            Ok(())
        }
        OutputFormat::Json => out.writer.emit_catalog(&entries),
    }
}

async fn cmd_prompt(
    out: &OutputContext<'_>,
    project: &Project,
    raw_keys: &[String],
    max_chars: Option<usize>,
) -> Result<()> {
    let keys = raw_keys
        .iter()
        .map(|raw| RuleKey::parse(raw))
        .collect::<Result<Vec<_>>>()?;

    let rules = load_rules(project).await?;
    let resolved = rules.resolver().resolve_all(&keys)?;

    if out.writer.format() == OutputFormat::Text {
        for key in resolved.missing() {
            out.display
                .print_warning(&format!("Rule not found, skipping: {}", key));
        }
    }

    let prompt = resolved.to_prompt(max_chars.unwrap_or(project.config.prompt.max_chars));
    out.writer.emit_prompt(&resolved, &prompt)
}

async fn cmd_config(
    out: &OutputContext<'_>,
    root: PathBuf,
    base_dir: Option<PathBuf>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let project = open_project(root, base_dir).await?;
            match out.writer.format() {
                OutputFormat::Text => {
                    let yaml = serde_yaml_bw::to_string(&project.config)?;
                    println!("{}", yaml);
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&project.config)?;
                    println!("{}", json);
                }
            }
        }
        ConfigAction::Reset => {
            // Reset must work even when the current file fails validation.
            let paths = ProjectPaths::new(root);
            ensure_initialized(&paths)?;
            RulekitConfig::default().save(&paths.rulekit_dir).await?;
            if out.writer.format() == OutputFormat::Text {
                out.display
                    .print_success("Configuration reset to defaults.");
            } else {
                out.writer.emit_message("Configuration reset to defaults")?;
            }
        }
    }

    Ok(())
}

fn ensure_initialized(paths: &ProjectPaths) -> Result<()> {
    if !paths.is_initialized() {
        return Err(RuleError::NotInitialized);
    }
    Ok(())
}
