use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use royale_meta::aggregate::Aggregator;
use royale_meta::calculate::derive;
use royale_meta::config::AppConfig;
use royale_meta::ingest::Ingestor;
use royale_meta::models::{Card, CardCatalog, RawBattle};
use royale_meta::parse_scope;
use royale_meta::storage::{JsonlReader, SnapshotStore, StorageConfig};

#[derive(Parser)]
#[command(name = "royale-meta")]
#[command(about = "Clash Royale battle-log meta aggregation and snapshots")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a battle log file into a new meta snapshot
    Aggregate {
        /// JSONL file of raw battles
        #[arg(long)]
        battles: PathBuf,

        /// JSON file of card reference data
        #[arg(long)]
        cards: Option<PathBuf>,

        /// Scope label, e.g. "6000-7000/ladder" or "all"
        #[arg(long, default_value = "all")]
        scope: String,

        /// Free-form snapshot type tag
        #[arg(long)]
        snapshot_type: Option<String>,
    },

    /// List persisted snapshots
    Snapshots {
        /// Only show snapshots for this scope label
        #[arg(long)]
        scope: Option<String>,

        /// Only show the most recent matching snapshot
        #[arg(long)]
        latest: bool,
    },
}

fn load_catalog(path: Option<&PathBuf>) -> Result<CardCatalog> {
    let Some(path) = path else {
        warn!("no card reference file supplied; snapshot will have unresolved card names");
        return Ok(CardCatalog::default());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read card file {:?}", path))?;
    let cards: Vec<Card> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse card file {:?}", path))?;

    info!("loaded {} cards from {:?}", cards.len(), path);
    Ok(CardCatalog::new(cards))
}

fn run_aggregate(
    config: &AppConfig,
    storage: StorageConfig,
    battles: &PathBuf,
    cards: Option<&PathBuf>,
    scope_label: &str,
    snapshot_type: Option<&str>,
) -> Result<()> {
    let scope =
        parse_scope(scope_label).with_context(|| format!("invalid scope '{}'", scope_label))?;
    let catalog = load_catalog(cards)?;

    let reader = JsonlReader::<RawBattle>::new(battles.clone());
    let mut ingestor = Ingestor::new();
    let mut aggregator = Aggregator::new(scope);

    for battle in reader.iter().context("failed to open battle file")? {
        let battle = match battle {
            Ok(battle) => battle,
            Err(e) => {
                warn!("skipping unreadable battle row: {}", e);
                continue;
            }
        };
        for record in ingestor.ingest(&battle) {
            aggregator.observe(&record);
        }
    }

    let stats = ingestor.stats();
    info!(
        battles = stats.battles_seen,
        records = stats.records_produced,
        sides_skipped = stats.sides_skipped,
        duplicates = stats.duplicates_skipped,
        out_of_scope = aggregator.out_of_scope(),
        "ingestion complete"
    );

    let counters = aggregator.finish();
    let metrics = derive(&counters, &catalog, &config.thresholds);

    let store = SnapshotStore::new(storage);
    let snapshot = store.create(&scope.label(), snapshot_type, &counters, metrics)?;

    println!("Created snapshot {}", snapshot.id);
    println!("  scope:           {}", snapshot.scope);
    println!("  sample size:     {}", snapshot.sample_size);
    println!("  unique decks:    {}", snapshot.total_decks);
    println!("  balance score:   {:.2}", snapshot.balance_score);
    println!("  diversity index: {:.2}", snapshot.diversity_index);
    println!("  top-deck share:  {:.2}%", snapshot.top_deck_dominance);

    Ok(())
}

fn run_snapshots(storage: StorageConfig, scope: Option<&str>, latest: bool) -> Result<()> {
    let store = SnapshotStore::new(storage);

    let snapshots = match (scope, latest) {
        (Some(label), true) => store.latest(label)?.into_iter().collect(),
        (Some(label), false) => store.by_scope(label)?,
        (None, _) => store.list()?,
    };

    if snapshots.is_empty() {
        println!("No snapshots found");
        return Ok(());
    }

    for snapshot in &snapshots {
        println!(
            "{}  {}  {}  battles={}  decks={}  balance={:.1}  diversity={:.1}",
            snapshot.id,
            snapshot.taken_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.scope,
            snapshot.sample_size,
            snapshot.total_decks,
            snapshot.balance_score,
            snapshot.diversity_index,
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = AppConfig::load_or_default(&cli.config)?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let storage = StorageConfig::new(data_dir);

    match cli.command {
        Commands::Aggregate {
            battles,
            cards,
            scope,
            snapshot_type,
        } => run_aggregate(
            &config,
            storage,
            &battles,
            cards.as_ref(),
            &scope,
            snapshot_type.as_deref(),
        ),
        Commands::Snapshots { scope, latest } => {
            run_snapshots(storage, scope.as_deref(), latest)
        }
    }
}
