//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use keyness_artifacts::ArtifactStore;
use keyness_core::{DirectorySource, PipelineOptions, ProgressReporter, RunSummary};
use keyness_shared::{AppConfig, DocumentId, RunConfig, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Keyness: find the terms each document over-uses relative to its corpus.
#[derive(Parser)]
#[command(
    name = "keyness",
    version,
    about = "Score log-likelihood keyness of every document in an HTML corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline over every raw document.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Overrides for one pipeline run. Unset flags fall back to the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Directory holding one `<doc-id>.html` file per document.
    #[arg(long, env = "KEYNESS_RAW_DIR")]
    pub raw: Option<PathBuf>,

    /// Output directory for artifacts.
    #[arg(long, env = "KEYNESS_OUTPUT_DIR")]
    pub out: Option<PathBuf>,

    /// Minimum term length in characters.
    #[arg(long)]
    pub min_term_chars: Option<usize>,

    /// Frequency substituted for a term absent from one side.
    #[arg(long)]
    pub smoothing_floor: Option<f64>,

    /// Minimum critical value for a term to be reported.
    #[arg(long)]
    pub cutoff: Option<f64>,

    /// Score only these document ids (can be specified multiple times).
    #[arg(long = "doc")]
    pub docs: Vec<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Default filter directive for a `-v` count, used when `RUST_LOG` is unset.
fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "keyness=info",
        1 => "keyness=debug",
        _ => "keyness=trace",
    }
}

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the run summary.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_directive(cli.verbose)));

    let output = match cli.log_format {
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(output)
        .init();
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Merge flags over the loaded config.
fn resolve_run_config(config: &AppConfig, args: &RunArgs) -> RunConfig {
    let mut run = RunConfig::from(config);
    if let Some(raw) = &args.raw {
        run.raw_dir = raw.clone();
    }
    if let Some(out) = &args.out {
        run.output_dir = out.clone();
    }
    if let Some(n) = args.min_term_chars {
        run.analysis.min_term_chars = n;
    }
    if let Some(floor) = args.smoothing_floor {
        run.analysis.smoothing_floor = floor;
    }
    if let Some(cutoff) = args.cutoff {
        run.analysis.significance_cutoff = cutoff;
    }
    run
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let config = load_config()?;
    let run_config = resolve_run_config(&config, &args);
    run_config.analysis.validate()?;

    if !run_config.raw_dir.is_dir() {
        return Err(eyre!(
            "raw directory '{}' does not exist",
            run_config.raw_dir.display()
        ));
    }

    let source = if args.docs.is_empty() {
        DirectorySource::new(&run_config.raw_dir)
    } else {
        let ids = args
            .docs
            .iter()
            .map(|d| DocumentId::new(d.as_str()))
            .collect::<keyness_shared::Result<Vec<_>>>()?;
        DirectorySource::with_ids(&run_config.raw_dir, ids)
    };
    let store = ArtifactStore::open(&run_config.output_dir)?;
    let options = PipelineOptions {
        analysis: run_config.analysis,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        raw = %run_config.raw_dir.display(),
        out = %run_config.output_dir.display(),
        min_term_chars = options.analysis.min_term_chars,
        cutoff = options.analysis.significance_cutoff,
        "running keyness pipeline"
    );

    let reporter = CliProgress::new();
    let summary = keyness_core::run(&source, &store, &options, &reporter)?;

    println!();
    println!("  Keyness computed.");
    println!("  Scored:     {}", summary.scored.len());
    println!("  Skipped:    {}", summary.skipped.len());
    for skipped in &summary.skipped {
        println!("    - {} ({})", skipped.doc_id, skipped.kind);
    }
    println!("  Vocabulary: {}", summary.vocabulary_size);
    println!("  Artifacts:  {}", summary.artifacts_written);
    println!("  Path:       {}", store.root().display());
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_counted(&self, doc_id: &DocumentId, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Counting [{current}/{total}] {doc_id}"));
    }

    fn document_skipped(&self, doc_id: &DocumentId, reason: &str) {
        self.spinner.println(format!("  skipped {doc_id}: {reason}"));
    }

    fn document_scored(&self, doc_id: &DocumentId, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scoring [{current}/{total}] {doc_id}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("{}", config.to_toml()?);
    Ok(())
}
