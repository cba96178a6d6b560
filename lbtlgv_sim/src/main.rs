//! LBT-LGV transport CLI
//!
//! Runs heavy-quark transport scenarios or run cards and records the history.

use clap::{Parser, ValueEnum};
use lbtlgv_env::RunId;
use lbtlgv_sim::{
    JsonHistoryExport, RunCard, RunResult, Runner, ScenarioId, SimError, SledHistoryStore,
};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Sled key-value container (init_pT, p-<step>, x-<step>)
    Sled,
    /// One JSON document per run
    Json,
}

/// Heavy-quark transport in a QGP medium (LBT / LGV)
#[derive(Parser, Debug)]
#[command(name = "lbtlgv-sim")]
#[command(about = "Run LBT/LGV heavy-quark transport", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (static_lbt, static_lgv, static_lgv_einstein, hydro_lgv, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Heavy quarks per run
    #[arg(short = 'n', long, default_value = "1000")]
    particles: usize,

    /// Maximum number of steps per run
    #[arg(long, default_value = "100")]
    steps: u64,

    /// Record a frame every N steps
    #[arg(long, default_value = "10")]
    record_every: u64,

    /// JSON run card; overrides --scenario
    #[arg(long)]
    run_card: Option<PathBuf>,

    /// Hydro history for dynamic-medium scenarios
    #[arg(long)]
    hydro: Option<PathBuf>,

    /// Directory for recorded histories
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// History container format
    #[arg(long, value_enum, default_value = "sled")]
    format: OutputFormat,

    /// JSON summary output for scripting
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run_one(card: RunCard, seed: u64, args: &Args) -> Result<RunResult, SimError> {
    let runner = Runner::new(card, seed);
    let label = runner.card().label.clone();
    let seed = runner.seed();

    let Some(dir) = &args.output else {
        return runner.run(&mut JsonHistoryExport::new(&label, seed));
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| SimError::store(format!("{}: {}", dir.display(), e)))?;

    let result = match args.format {
        OutputFormat::Sled => {
            let path = dir.join(format!("{}-{}.sled", label, seed));
            let mut store = SledHistoryStore::open(&path, RunId::from_seed(seed))?;
            let result = runner.run(&mut store)?;
            info!("History written to {}", path.display());
            result
        }
        OutputFormat::Json => {
            let path = dir.join(format!("{}-{}.json", label, seed));
            let mut export = JsonHistoryExport::new(&label, seed).with_path(&path);
            let result = runner.run(&mut export)?;
            info!("History written to {}", path.display());
            result
        }
    };
    Ok(result)
}

fn load_cards(args: &Args) -> Result<Vec<RunCard>, SimError> {
    if let Some(path) = &args.run_card {
        return Ok(vec![RunCard::load(path)?]);
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
            .into_iter()
            .filter(|s| {
                let runnable = !s.needs_hydro() || args.hydro.is_some();
                if !runnable {
                    warn!("Skipping {}: no --hydro given", s.name());
                }
                runnable
            })
            .collect()
    } else {
        vec![args
            .scenario
            .parse()
            .map_err(|e: String| SimError::run_card(e))?]
    };

    scenarios
        .iter()
        .map(|s| {
            s.run_card(
                args.particles,
                args.steps,
                args.record_every,
                args.hydro.as_deref(),
            )
        })
        .collect()
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("LBT-LGV transport v{}", env!("CARGO_PKG_VERSION"));
    }

    let cards = load_cards(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available scenarios: static_lbt, static_lgv, static_lgv_einstein, hydro_lgv, all");
        std::process::exit(1);
    });

    // Determine base seed; 0 picks one from the clock (low 64 bits of the nanoseconds)
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let mut results: Vec<RunResult> = Vec::new();
    let mut failures: Vec<(String, SimError)> = Vec::new();
    for card in cards {
        let label = card.label.clone();
        match run_one(card, seed, &args) {
            Ok(result) => results.push(result),
            Err(e) => {
                error!("✗ {} failed: {}", label, e);
                failures.push((label, e));
            }
        }
    }

    if args.json {
        let summary = serde_json::json!({
            "total": results.len() + failures.len(),
            "failed": failures.len(),
            "results": results,
            "failures": failures.iter().map(|(label, e)| {
                serde_json::json!({ "label": label, "error": e.to_string() })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else if failures.is_empty() {
        info!("✅ All {} runs completed", results.len());
    } else {
        error!("❌ {}/{} runs failed", failures.len(), results.len() + failures.len());
    }

    if !failures.is_empty() {
        std::process::exit(1);
    }
}
