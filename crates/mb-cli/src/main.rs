//! Mystery Box command-line front end
//!
//! Usage:
//!   mysterybox draw [--count N]          - Draw winners from the catalog
//!   mysterybox simulate [--draws N]      - Batch-simulate draws and compare odds
//!   mysterybox validate                  - Check weights and print ticket ranges
//!   mysterybox reveal [--winner ID]      - Build a reveal strip and run the spin
//!   mysterybox export [--output PATH]    - Write the catalog as JSON records

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use mb_lottery::{LotteryEngine, RevealSequencer, TicketTable, simulate};
use mb_reveal::{
    AnimationController, FixedStepClock, RecordingSink, RevealEvent, RevealTiming, SpinSpeed,
    drive_to_completion, spawn_realtime_reveal,
};
use mb_state::CatalogStore;

use crate::config::{AppConfig, load_catalog};

#[derive(Parser)]
#[command(name = "mysterybox", about = "Weighted mystery box draws and reveals")]
struct Cli {
    /// Config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file (exported JSON records); demo catalog if omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// RNG seed (overrides config)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw winners
    Draw {
        /// Number of draws
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,
    },
    /// Batch-simulate draws
    Simulate {
        /// Number of draws
        #[arg(short, long, default_value_t = 1_000_000)]
        draws: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate catalog weights
    Validate,
    /// Build a reveal strip and run the spin
    Reveal {
        /// Use the fast timing profile
        #[arg(short, long)]
        fast: bool,

        /// Run at wall-clock pace on a background thread
        #[arg(long)]
        realtime: bool,

        /// Winner supplied by a trusted authority (prize id)
        #[arg(short, long)]
        winner: Option<String>,

        /// Print every event as a JSON line
        #[arg(long)]
        events: bool,
    },
    /// Export the catalog
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let store = open_store(cli.catalog.as_deref(), &config)?;

    match cli.command {
        Commands::Draw { count } => draw(&store, &config, count),
        Commands::Simulate { draws, json } => run_simulation(&store, &config, draws, json),
        Commands::Validate => validate(&store),
        Commands::Reveal {
            fast,
            realtime,
            winner,
            events,
        } => reveal(&store, &config, fast, realtime, winner.as_deref(), events),
        Commands::Export { output } => export(&store, output.as_deref()),
    }
}

fn open_store(catalog: Option<&Path>, config: &AppConfig) -> Result<CatalogStore> {
    let prizes = load_catalog(catalog)?;
    log::debug!("Loaded {} prizes", prizes.len());
    Ok(CatalogStore::with_ticket_space(
        prizes,
        config.lottery.ticket_space,
    )?)
}

fn engine(config: &AppConfig) -> LotteryEngine {
    match config.seed {
        Some(seed) => LotteryEngine::seeded(seed),
        None => LotteryEngine::new(),
    }
}

fn table(store: &CatalogStore) -> Result<std::sync::Arc<TicketTable>> {
    store
        .ticket_table()
        .context("Catalog cannot be normalized into ticket ranges")
}

fn draw(store: &CatalogStore, config: &AppConfig, count: u64) -> Result<()> {
    let table = table(store)?;
    let mut engine = engine(config);

    for _ in 0..count {
        let draw = engine.select_weighted_winner(&table)?;
        println!(
            "ticket {:>9}  {:<12} {:<20} {:?}",
            draw.ticket, draw.winner.id, draw.winner.name, draw.winner.rarity
        );
    }

    if count > 1 {
        let stats = engine.stats();
        println!();
        for (rarity, wins) in &stats.wins_by_rarity {
            println!("{:<10} {:>8}", rarity.name(), wins);
        }
        if stats.fallback_resolutions > 0 {
            log::warn!("{} draws used the fallback scan", stats.fallback_resolutions);
        }
    }
    Ok(())
}

fn run_simulation(store: &CatalogStore, config: &AppConfig, draws: u64, json: bool) -> Result<()> {
    let table = table(store)?;
    let seed = config.seed.unwrap_or(0);
    let report = simulate(&table, draws, seed)?;

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("{} draws (seed {})\n", report.draws, report.seed);
    println!("{:<12} {:>10} {:>10} {:>10} {:>9}", "prize", "hits", "config %", "observed %", "delta");
    for outcome in &report.outcomes {
        println!(
            "{:<12} {:>10} {:>10.4} {:>10.4} {:>+9.4}",
            outcome.id, outcome.hits, outcome.configured_odds, outcome.observed_odds, outcome.deviation
        );
    }
    println!("\nmax |delta| {:.4} pp", report.max_abs_deviation);
    if report.unresolved > 0 {
        bail!("{} tickets resolved to no prize", report.unresolved);
    }
    Ok(())
}

fn validate(store: &CatalogStore) -> Result<()> {
    let snapshot = store.snapshot();
    let report = snapshot.odds_report();

    println!("total weight {:.4}", report.total_weight);
    for warning in &report.warnings {
        println!("warning: {}", warning.describe());
    }

    let table = table(store)?;
    let space = table.ticket_space();
    println!();
    for entry in table.entries() {
        let range = if entry.ticket_count() == 0 {
            "-".to_string()
        } else {
            format!("[{}, {}]", entry.ticket_start, entry.ticket_end)
        };
        println!(
            "{:<12} {:>24} {:>9.4}% {:>9.4}%",
            entry.prize.id,
            range,
            entry.normalized_odds,
            entry.effective_odds(space)
        );
    }

    if report.is_clean() {
        println!("\nok");
    }
    Ok(())
}

fn reveal(
    store: &CatalogStore,
    config: &AppConfig,
    fast: bool,
    realtime: bool,
    winner: Option<&str>,
    events: bool,
) -> Result<()> {
    let table = table(store)?;
    let sequencer = RevealSequencer::new(config.lottery.layout)?;
    let mut engine = engine(config);

    let strip = match winner {
        Some(id) => {
            let snapshot = store.snapshot();
            let prize = snapshot
                .get(id)
                .with_context(|| format!("Unknown prize '{id}'"))?
                .clone();
            sequencer.build_reveal_strip(&mut engine, prize, &table)?
        }
        None => sequencer.draw_and_build(&mut engine, &table)?.1,
    };

    if let Some(miss) = strip.near_miss() {
        log::info!("Near-miss '{}' at slot {}", miss.bait_id, miss.index);
    }

    let timing = if fast {
        RevealTiming {
            profile: SpinSpeed::Fast,
            duration_ms: RevealTiming::fast().duration_ms,
            ..config.timing.clone()
        }
    } else {
        config.timing.clone()
    };

    let recorded: Vec<RevealEvent> = if realtime {
        let (handle, rx) = spawn_realtime_reveal(strip.clone(), config.geometry, timing)?;
        let mut recorded = Vec::new();
        for event in rx.iter() {
            if events {
                println!("{}", serde_json::to_string(&event)?);
            }
            recorded.push(event);
        }
        if handle.join().is_err() {
            bail!("Reveal thread panicked");
        }
        recorded
    } else {
        let step = timing.frame_interval_ms;
        let max_frames = timing.expected_frames().saturating_mul(4).max(16);
        let mut controller = AnimationController::new(config.geometry, timing, RecordingSink::new());
        let token = controller.start_spin(&strip)?;
        drive_to_completion(&mut controller, token, &mut FixedStepClock::new(step), max_frames);
        let recorded = controller.into_sink().take();
        if events {
            for event in &recorded {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        recorded
    };

    let ticks = recorded
        .iter()
        .filter(|e| matches!(e, RevealEvent::Tick(_)))
        .count();
    let Some(RevealEvent::Settled {
        winner,
        displacement,
    }) = recorded.iter().find(|e| e.is_settled())
    else {
        bail!("Spin ended without settling");
    };

    if !events {
        let strip_ids: Vec<&str> = strip.slots().iter().map(|p| p.id.as_str()).collect();
        println!("strip   {}", strip_ids.join(" "));
        println!("ticks   {}", ticks);
        println!("landed  {:.1}px on slot {}", displacement, strip.winning_index());
        println!("winner  {} ({:?})", winner.name, winner.rarity);
    }
    Ok(())
}

fn export(store: &CatalogStore, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            store
                .save_to_file(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Exported {} prizes", store.snapshot().len());
        }
        None => println!("{}", store.export_json()?),
    }
    Ok(())
}
