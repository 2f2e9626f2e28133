//! Command-line interface for running batches of seeded generations

use crate::algorithm::generator::{DungeonGenerator, GenerationReport};
use crate::algorithm::selection::OrderingPolicy;
use crate::io::configuration::{DEFAULT_RUNS, GenerationConfig};
use crate::io::error::{DungeonError, Result, invalid_parameter};
use crate::io::progress::ProgressManager;
use crate::rooms::registry::TemplateRegistry;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "dungeonweave")]
#[command(
    author,
    version,
    about = "Generate grid dungeons with walkers and atomic connector placement"
)]
/// Command-line arguments for the dungeon generator
pub struct Cli {
    /// Template registry JSON file; the built-in set is used when omitted
    #[arg(short, long, value_name = "FILE")]
    pub templates: Option<PathBuf>,

    /// Generation config JSON file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Random seed of the first run
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of runs on consecutive seeds
    #[arg(short, long, default_value_t = DEFAULT_RUNS)]
    pub runs: usize,

    /// Number of walkers per run
    #[arg(short, long)]
    pub walkers: Option<usize>,

    /// Total room limit per run
    #[arg(short, long)]
    pub max_rooms: Option<usize>,

    /// Grid width in cells
    #[arg(short = 'W', long)]
    pub width: Option<usize>,

    /// Grid height in cells
    #[arg(short = 'H', long)]
    pub height: Option<usize>,

    /// Candidate ordering policy
    #[arg(short, long, value_enum)]
    pub ordering: Option<OrderingPolicy>,

    /// Print each run report as a JSON line
    #[arg(short, long)]
    pub json: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Configuration file values with command-line overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result
    /// fails validation
    pub fn resolve_config(&self) -> Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => GenerationConfig::from_json_file(path)?,
            None => GenerationConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(walkers) = self.walkers {
            config.walker_count = walkers;
        }
        if let Some(max_rooms) = self.max_rooms {
            config.max_rooms = max_rooms;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(ordering) = self.ordering {
            config.ordering = ordering;
        }

        config.validate()?;
        Ok(config)
    }

    /// Registry from `--templates`, or the built-in set
    ///
    /// # Errors
    ///
    /// Returns an error if the template file cannot be loaded
    pub fn load_registry(&self) -> Result<TemplateRegistry> {
        match &self.templates {
            Some(path) => TemplateRegistry::from_json_file(path),
            None => TemplateRegistry::builtin(),
        }
    }
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Reports of successful runs in seed order
    pub reports: Vec<GenerationReport>,
    /// Seeds whose run ended with an error
    pub failed_seeds: Vec<u64>,
}

/// Runs generation over consecutive seeds with progress tracking
pub struct BatchRunner {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl BatchRunner {
    /// Create a runner for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Run every seed in the batch
    ///
    /// Runs that stop on a generation error are logged and counted; the
    /// batch continues with the next seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or registry cannot be loaded
    pub fn run(&mut self) -> Result<BatchSummary> {
        if self.cli.runs == 0 {
            return Err(invalid_parameter("runs", &0, &"must be positive"));
        }
        let base = self.cli.resolve_config()?;
        let registry = Arc::new(self.cli.load_registry()?);
        info!(
            "Loaded {} templates, running {} seeds from {}",
            registry.len(),
            self.cli.runs,
            base.seed
        );

        let mut generator = DungeonGenerator::new(Arc::clone(&registry), base.bounds())?;
        let mut summary = BatchSummary::default();

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(self.cli.runs);
        }

        for offset in 0..self.cli.runs {
            let config = GenerationConfig {
                seed: base.seed.wrapping_add(offset as u64),
                ..base.clone()
            };
            if let Some(ref pm) = self.progress_manager {
                pm.start_run(config.seed);
            }

            let start = Instant::now();
            match generator.generate(&config) {
                Ok(report) => {
                    if let Some(ref mut pm) = self.progress_manager {
                        pm.complete_run(config.seed, report.rooms_placed, start.elapsed());
                    }
                    self.emit(&report)?;
                    summary.reports.push(report);
                }
                Err(err) if err.is_recoverable() || is_run_failure(&err) => {
                    warn!("Seed {} failed: {err}", config.seed);
                    if let Some(ref mut pm) = self.progress_manager {
                        pm.fail_run(config.seed);
                    }
                    summary.failed_seeds.push(config.seed);
                }
                Err(err) => return Err(err),
            }
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }
        info!(
            "Batch finished: {} succeeded, {} failed",
            summary.reports.len(),
            summary.failed_seeds.len()
        );
        Ok(summary)
    }

    #[allow(clippy::print_stdout)]
    fn emit(&self, report: &GenerationReport) -> Result<()> {
        if self.cli.json {
            let line = serde_json::to_string(report).map_err(|source| {
                DungeonError::Parse {
                    path: "<stdout>".into(),
                    source,
                }
            })?;
            println!("{line}");
        } else {
            println!(
                "seed {:>6}  rooms {:>4}  connectors {:>3}  rollbacks {:>3}  abandoned {:>3}",
                report.seed,
                report.rooms_placed,
                report.connectors_committed,
                report.transactions_rolled_back,
                report.frontiers_abandoned
            );
        }
        Ok(())
    }
}

const fn is_run_failure(err: &DungeonError) -> bool {
    matches!(
        err,
        DungeonError::RetryBudgetExhausted { .. }
            | DungeonError::StartPlacementFailed { .. }
            | DungeonError::Cancelled { .. }
    )
}
