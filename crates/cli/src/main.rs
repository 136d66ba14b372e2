use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codebrief_analyzer::{JsonFileSnapshotSink, ProjectAnalyzer, SnapshotSink};
use codebrief_insights::{InsightExtractor, JsonCompletion, OpenAiCompatProvider};
use codebrief_protocol::FileMetadata;
use codebrief_scanner::{prioritize, FileScanner, HeuristicTokenCounter, LocalFileSystem};
use config::AppConfig;
use serde::Serialize;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "codebrief")]
#[command(about = "Token-budgeted project digests with per-file code insights", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and print its context as JSON
    Analyze(AnalyzeArgs),

    /// List analyzable files in priority order without calling a model
    Scan(ScanArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Files or directories to analyze (defaults to the project root)
    paths: Vec<PathBuf>,

    /// Project root (defaults to the first path, or the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Config file (defaults to codebrief.toml in the project root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token ceiling for the assembled content
    #[arg(long)]
    token_ceiling: Option<usize>,

    /// Do not write the snapshot file
    #[arg(long)]
    no_snapshot: bool,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ScanArgs {
    /// Project root (defaults to current directory)
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to codebrief.toml in the project root)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct ScanOutput {
    root: String,
    files: Vec<FileMetadata>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Analyze(args) => run_analyze(args).await,
        Commands::Scan(args) => run_scan(args).await,
    }
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let paths = absolute_paths(&args.paths)?;
    let root = match &args.root {
        Some(root) => absolute(root)?,
        None => default_root(&paths)?,
    };
    let paths = if paths.is_empty() {
        vec![root.clone()]
    } else {
        paths
    };

    let mut app = AppConfig::load_file(args.config.as_deref(), &root)?;
    app.apply_env(|key| env::var(key).ok())?;
    if let Some(ceiling) = args.token_ceiling {
        app.analysis.token_ceiling = Some(ceiling);
    }
    if args.no_snapshot {
        app.analysis.write_snapshot = false;
    }

    let provider = OpenAiCompatProvider::new(app.provider_config(|key| env::var(key).ok())?)
        .context("Failed to set up the model provider")?;
    log::info!("Using model {} at {}", provider.model(), app.llm.base_url);
    let completion = Arc::new(JsonCompletion::new(provider));

    let mut analyzer = ProjectAnalyzer::new(
        Arc::new(LocalFileSystem),
        Arc::new(HeuristicTokenCounter::new(app.llm.context_window)),
        completion.clone(),
        app.analyzer_config(Some(root.clone())),
    )
    .with_extractor(
        InsightExtractor::new(completion).with_sampling(app.llm.temperature, app.llm.max_tokens),
    );
    if let (true, Some(dir)) = (app.analysis.write_snapshot, &app.analysis.snapshot_dir) {
        let dir = if dir.is_absolute() {
            dir.clone()
        } else {
            root.join(dir)
        };
        let sink: Arc<dyn SnapshotSink> = Arc::new(JsonFileSnapshotSink::in_dir(dir));
        analyzer = analyzer.with_snapshot_sink(Some(sink));
    }

    let context = analyzer
        .analyze_project(&paths)
        .await
        .with_context(|| format!("Analysis of {} failed", root.display()))?;

    let json = serde_json::to_string_pretty(&context)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => print_stdout(&json)?,
    }
    Ok(())
}

async fn run_scan(args: ScanArgs) -> Result<()> {
    let root = absolute(&args.root)?;
    let mut app = AppConfig::load_file(args.config.as_deref(), &root)?;
    app.apply_env(|key| env::var(key).ok())?;

    let scanner = FileScanner::with_options(Arc::new(LocalFileSystem), app.scan_options());
    let discovered = scanner.discover(&root).await?;
    let files = prioritize(scanner.describe(&root, &discovered).await);

    let output = ScanOutput {
        root: root.display().to_string(),
        files,
    };
    print_stdout(&serde_json::to_string_pretty(&output)?)
}

/// Absolute form of `path`; existing paths are canonicalized, missing ones
/// are joined onto the current directory so discovery can report them.
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

fn absolute_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    paths.iter().map(|path| absolute(path)).collect()
}

fn default_root(paths: &[PathBuf]) -> Result<PathBuf> {
    match paths.first() {
        Some(first) if first.is_file() => Ok(first
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| first.clone())),
        Some(first) => Ok(first.clone()),
        None => absolute(Path::new(".")),
    }
}
