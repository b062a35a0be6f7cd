//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cardtrack_core::enrichment::{EnrichmentRun, run_enrichment};
use cardtrack_core::pipeline::{AddExpansionConfig, ProgressReporter, add_expansions};
use cardtrack_core::selection::pending_batches;
use cardtrack_crawler::HttpPageSource;
use cardtrack_shared::{
    AppConfig, BASE_COLUMNS, CrawlConfig, EnrichConfig, EnrichmentKind, init_config, load_config,
    load_config_from, split,
};
use cardtrack_storage::{DatasetStore, WorkingSubset};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// cardtrack — scrape a card catalog and enrich it with usage and prices.
#[derive(Parser)]
#[command(
    name = "cardtrack",
    version,
    about = "Scrape card expansions into a dataset and enrich selected rows.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.cardtrack/cardtrack.toml.
    #[arg(long, global = true, env = "CARDTRACK_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Create an empty dataset with the record header.
    Init {
        /// Overwrite an existing dataset.
        #[arg(long)]
        force: bool,
    },

    /// Crawl one or more expansions and append their cards to the dataset.
    Add {
        /// Expansion identifiers, as they appear in catalog URLs.
        #[arg(required = true)]
        expansions: Vec<String>,
    },

    /// Patch tournament usage or price trends onto working-subset rows.
    Enrich {
        /// Which pass to run: tournaments or prices.
        kind: EnrichmentKind,

        /// Dataset index to enrich (repeatable).
        #[arg(short, long = "index", conflicts_with = "pending")]
        indices: Vec<usize>,

        /// Enrich the next batch of working-subset rows this pass has not filled yet.
        #[arg(long)]
        pending: bool,

        /// Indices per batch; each batch is saved on its own.
        #[arg(long)]
        batch: Option<usize>,
    },

    /// List working-subset rows a pass has not filled yet, in batches.
    Pending {
        /// Which pass to inspect: tournaments or prices.
        kind: EnrichmentKind,

        /// Indices per batch.
        #[arg(long)]
        batch: Option<usize>,

        /// Print batches as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
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

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "cardtrack=info",
        1 => "cardtrack=debug",
        _ => "cardtrack=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Init { force } => cmd_init(config_path, force),
        Command::Add { expansions } => cmd_add(config_path, &expansions).await,
        Command::Enrich {
            kind,
            indices,
            pending,
            batch,
        } => cmd_enrich(config_path, kind, &indices, pending, batch).await,
        Command::Pending { kind, batch, json } => cmd_pending(config_path, kind, batch, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let config = resolve_config(config_path)?;
    let store = DatasetStore::new(&config.paths.dataset);
    store.create_empty(&BASE_COLUMNS, force)?;
    println!("Dataset initialized at: {}", store.path().display());
    Ok(())
}

async fn cmd_add(config_path: Option<&Path>, expansions: &[String]) -> Result<()> {
    let config = resolve_config(config_path)?;
    let crawl = CrawlConfig::try_from(&config)?;
    let source = HttpPageSource::new(crawl.timeout)?;

    let add_config = AddExpansionConfig {
        dataset_path: PathBuf::from(&config.paths.dataset),
        crawl,
    };

    info!(
        expansions = ?expansions,
        dataset = %add_config.dataset_path.display(),
        "adding expansions"
    );

    let reporter = CliProgress::new();
    let results = add_expansions(&add_config, expansions, source, &reporter).await?;

    println!();
    for result in &results {
        println!(
            "  {:<24} +{:>5} rows  (indices {}..{}, {:.1}s)",
            result.expansion,
            result.rows_added(),
            result.indices.start,
            result.indices.end,
            result.elapsed.as_secs_f64()
        );
    }
    if let Some(last) = results.last() {
        println!("  Dataset now holds {} rows.", last.total_rows);
    }
    println!();
    Ok(())
}

async fn cmd_enrich(
    config_path: Option<&Path>,
    kind: EnrichmentKind,
    indices: &[usize],
    pending: bool,
    batch: Option<usize>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let enrich = EnrichConfig::try_from(&config)?;
    let batch_size = batch.unwrap_or(enrich.batch_size);

    let run = EnrichmentRun {
        kind,
        dataset_path: PathBuf::from(&config.paths.dataset),
        working_subset_path: PathBuf::from(&config.paths.working_subset),
        config: enrich,
    };

    let batches: Vec<Vec<usize>> = if pending {
        let dataset = DatasetStore::new(&run.dataset_path).load()?;
        let subset = WorkingSubset::load(&run.working_subset_path)?;
        pending_batches(&dataset, &subset, kind, batch_size)?
            .into_iter()
            .take(1)
            .collect()
    } else if indices.is_empty() {
        return Err(eyre!("nothing to enrich: pass --index or --pending"));
    } else {
        split(indices, batch_size)?
    };

    if batches.is_empty() {
        println!("No rows pending for the {kind} pass.");
        return Ok(());
    }

    info!(kind = %kind, batches = batches.len(), batch_size, "starting enrichment");

    let mut total = 0;
    for (n, batch) in batches.iter().enumerate() {
        let source = HttpPageSource::new(run.config.timeout)?;
        let reporter = CliProgress::new();
        let report = run_enrichment(&run, batch, source, &reporter).await?;
        total += report.enriched.len();
        println!(
            "  batch {}/{}: {} rows enriched ({:.1}s)",
            n + 1,
            batches.len(),
            report.enriched.len(),
            report.elapsed.as_secs_f64()
        );
    }

    println!();
    println!("  {kind} pass complete: {total} rows enriched.");
    println!();
    Ok(())
}

fn cmd_pending(
    config_path: Option<&Path>,
    kind: EnrichmentKind,
    batch: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let batch_size = batch.unwrap_or(config.batch.size);
    let dataset = DatasetStore::new(&config.paths.dataset).load()?;
    let subset = WorkingSubset::load(Path::new(&config.paths.working_subset))?;
    let batches = pending_batches(&dataset, &subset, kind, batch_size)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&batches)?);
        return Ok(());
    }

    let total: usize = batches.iter().map(Vec::len).sum();
    println!("{total} rows pending for the {kind} pass in {} batches", batches.len());
    for (n, batch) in batches.iter().enumerate() {
        let list: Vec<String> = batch.iter().map(usize::to_string).collect();
        println!("  {:>3}: {}", n + 1, list.join(", "));
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn step(&self, current: usize, total: usize, detail: &str) {
        self.spinner
            .set_message(format!("[{current}/{total}] {detail}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_enrich_with_repeated_indices() {
        let cli = Cli::parse_from(["cardtrack", "enrich", "prices", "-i", "3", "-i", "7"]);
        match cli.command {
            Command::Enrich {
                kind,
                indices,
                pending,
                batch,
            } => {
                assert_eq!(kind, EnrichmentKind::Prices);
                assert_eq!(indices, vec![3, 7]);
                assert!(!pending);
                assert_eq!(batch, None);
            }
            _ => panic!("expected enrich"),
        }
    }

    #[test]
    fn index_and_pending_conflict() {
        assert!(
            Cli::try_parse_from(["cardtrack", "enrich", "tournaments", "-i", "1", "--pending"])
                .is_err()
        );
    }

    #[test]
    fn add_requires_an_expansion() {
        assert!(Cli::try_parse_from(["cardtrack", "add"]).is_err());
    }
}
