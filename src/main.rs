use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod archive;
mod cli;
mod config;
mod detect;
mod metadata;
mod resolve;
mod runner;
mod scanner;
#[cfg(test)]
mod test_support;
mod util;

use cli::{Command, CreateArgs, InspectArgs, RootArgs, StartArgs};
use config::{load_config, SnapConfig};
use metadata::SnapshotMetadata;
use resolve::versions::SystemToolQuery;
use runner::exec::SystemRunner;
use runner::prompt::{AutoPrompter, Prompter, TerminalPrompter};
use runner::{RunOptions, Runner};
use scanner::{scan_directory, IgnoreSet, SNAPSHOT_EXTENSION};
use util::{display_path, summarize_deps};

const LOG_ENV: &str = "DEVSNAP_LOG";

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();

    match args.command {
        Command::Create(args) => cmd_create(args),
        Command::Start(args) => cmd_start(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn cmd_create(args: CreateArgs) -> Result<()> {
    let cwd = env::current_dir().context("resolve current directory")?;
    let config = load_config(&cwd)?;
    let requested = args.dir.unwrap_or_else(|| cwd.clone());
    let root = requested
        .canonicalize()
        .with_context(|| format!("resolve project directory {}", requested.display()))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let extra_ignores = ignore_names(&config);
    println!("Analyzing {}...", root.display());
    let detection = detect::detect_project(
        &root,
        &IgnoreSet::for_code_walk(&extra_ignores),
        &SystemToolQuery,
    )?;
    for env in &detection.environments {
        println!("  environment: {}", env.label());
    }
    for devpack in &detection.devpacks {
        println!(
            "  {}: {}",
            devpack.file_name,
            summarize_deps(&devpack.dependencies)
        );
    }
    if !detection.required_vars.is_empty() {
        println!("  secrets: {}", detection.required_vars.join(", "));
    }

    // Scanned after detection so freshly written devpacks are included.
    let out = args
        .out
        .map(|out| if out.is_absolute() { out } else { cwd.join(out) })
        .unwrap_or_else(|| cwd.join(format!("{}{SNAPSHOT_EXTENSION}", detection.name)));
    let mut files = scan_directory(&root, &IgnoreSet::for_snapshot(&extra_ignores))?;
    files.retain(|path| path != &out);

    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let meta = SnapshotMetadata::new(
        &detection.name,
        created_at,
        detection.environments,
        detection.commands,
        detection.required_vars,
    );
    archive::create_archive(&root, &files, &meta, &out)?;
    println!(
        "Created {} ({} files)",
        display_path(&out, Some(&cwd)),
        files.len()
    );
    Ok(())
}

fn cmd_start(args: StartArgs) -> Result<()> {
    let cwd = env::current_dir().context("resolve current directory")?;
    let config = load_config(&cwd)?;
    archive::ensure_snapshot_file(&args.snapshot)?;
    let snapshot = args
        .snapshot
        .canonicalize()
        .with_context(|| format!("resolve snapshot {}", args.snapshot.display()))?;
    let sandbox = cwd.join(&config.sandbox_dir);
    reset_sandbox(&sandbox, &snapshot)?;

    println!(
        "Unpacking {} into {}",
        display_path(&snapshot, Some(&cwd)),
        display_path(&sandbox, Some(&cwd))
    );
    let meta = archive::unpack(&snapshot, &sandbox)?;
    println!("Snapshot {} (created {})", meta.name, meta.created_at);

    let prompter: Box<dyn Prompter> = if args.yes {
        Box::new(AutoPrompter { answer: true })
    } else {
        Box::new(TerminalPrompter)
    };
    let options = RunOptions {
        manual: args.manual,
        secrets_file: config.secrets_file.clone(),
    };
    let summary = Runner::new(&sandbox, &SystemRunner, prompter.as_ref(), options).run(&meta)?;
    println!(
        "Done: {} environment(s) processed.",
        summary.environments.len()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> Result<()> {
    archive::ensure_snapshot_file(&args.snapshot)?;
    let meta = archive::read_metadata(&args.snapshot)?;
    if args.json {
        let text = serde_json::to_string_pretty(&meta).context("serialize snapshot metadata")?;
        println!("{text}");
        return Ok(());
    }
    print!("{}", describe(&meta));
    Ok(())
}

/// Human-readable summary used by `inspect`.
fn describe(meta: &SnapshotMetadata) -> String {
    let mut lines = vec![
        format!("name: {}", meta.name),
        format!("created: {}", meta.created_at),
        format!("schema: {}", meta.schema_version),
    ];
    if let Some(description) = &meta.description {
        lines.push(format!("description: {description}"));
    }
    if let Some(author) = &meta.author {
        lines.push(format!("author: {author}"));
    }
    if !meta.tags.is_empty() {
        lines.push(format!("tags: {}", meta.tags.join(", ")));
    }
    lines.push("environments:".to_string());
    for env in &meta.environments {
        lines.push(format!("  - {}", env.label()));
        for step in &env.setup {
            lines.push(format!("      setup: {step}"));
        }
        if let Some(run) = &env.run {
            lines.push(format!("      run: {run}"));
        }
    }
    if !meta.commands.is_empty() {
        lines.push("legacy commands:".to_string());
        for step in &meta.commands.setup {
            lines.push(format!("  setup: {step}"));
        }
        if let Some(run) = &meta.commands.run {
            lines.push(format!("  run: {run}"));
        }
        if let Some(test) = &meta.commands.test {
            lines.push(format!("  test: {test}"));
        }
    }
    if !meta.required_vars.is_empty() {
        lines.push(format!("required secrets: {}", meta.required_vars.join(", ")));
    }
    if !meta.manifest.is_empty() {
        lines.push(format!("manifest: {} file(s)", meta.manifest.len()));
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Configured ignores plus the sandbox directory name.
fn ignore_names(config: &SnapConfig) -> Vec<String> {
    let mut names = config.extra_ignores.clone();
    if let Some(name) = Path::new(&config.sandbox_dir).file_name() {
        names.push(name.to_string_lossy().into_owned());
    }
    names
}

/// Remove any previous sandbox; refuses when the snapshot itself lives there.
fn reset_sandbox(sandbox: &Path, snapshot: &Path) -> Result<()> {
    if !sandbox.exists() {
        return Ok(());
    }
    let sandbox_abs: PathBuf = sandbox
        .canonicalize()
        .with_context(|| format!("resolve sandbox {}", sandbox.display()))?;
    if snapshot.starts_with(&sandbox_abs) {
        bail!(
            "snapshot {} lives inside the sandbox {}; move it first",
            snapshot.display(),
            sandbox.display()
        );
    }
    fs::remove_dir_all(sandbox).with_context(|| format!("remove sandbox {}", sandbox.display()))?;
    tracing::debug!(sandbox = %sandbox.display(), "previous sandbox removed");
    Ok(())
}
