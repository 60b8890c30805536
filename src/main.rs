use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use ans_etl::config::EtlConfig;
use ans_etl::infra::ReqwestHttp;
use ans_etl::logging;
use ans_etl::pipeline::{Pipeline, RunManifest};

#[derive(Parser)]
#[command(name = "ans_etl")]
#[command(about = "ANS quarterly expense ETL: discovery, consolidation and aggregation")]
#[command(version)]
struct Cli {
    /// TOML configuration file; defaults apply when it does not exist
    #[arg(long, env = "ETL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, download and transform the latest quarters
    Run,
    /// Print the archive URLs a run would download
    Discover,
    /// Transform local quarterly CSVs against a registry CSV
    Transform {
        /// Operator registry (Relatorio_cadop.csv)
        #[arg(long)]
        registry: PathBuf,
        /// Quarterly CSV files named like 1T2024.csv
        #[arg(required = true)]
        quarterly: Vec<PathBuf>,
    },
    /// Re-aggregate a consolidated detail CSV
    Aggregate {
        #[arg(long)]
        input: PathBuf,
    },
}

fn print_summary(manifest: &RunManifest) {
    println!("\n📊 {} finished", manifest.command);
    println!("   Quarterly records: {}", manifest.counts.quarterly_records);
    println!("   Dropped rows: {}", manifest.counts.dropped_rows);
    println!("   Unmatched records: {}", manifest.counts.unmatched_records);
    println!("   Aggregated groups: {}", manifest.counts.aggregated_groups);
    if !manifest.skipped_files.is_empty() {
        println!("\n⚠️  Skipped files:");
        for skipped in &manifest.skipped_files {
            println!("   - {}: {}", skipped.path.display(), skipped.reason);
        }
    }
    for output in &manifest.outputs {
        println!("💾 {} ({} bytes)", output.path.display(), output.bytes);
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = EtlConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _guard = logging::init_logging(&config.log_dir).context("initializing logging")?;
    ans_etl::metrics::init_metrics();

    let http = ReqwestHttp::from_config(&config);
    let pipeline = Pipeline::new(config, http);

    let outcome = match cli.command {
        Commands::Run => pipeline.run().map(|m| print_summary(&m)),
        Commands::Discover => pipeline.discover().map(|archives| {
            for archive in &archives {
                println!("{}", archive.url);
            }
            info!(selected = archives.len(), "discovery finished");
        }),
        Commands::Transform { registry, quarterly } => {
            pipeline.transform(&quarterly, &registry).map(|m| print_summary(&m))
        }
        Commands::Aggregate { input } => pipeline.aggregate_file(&input).map(|m| print_summary(&m)),
    };

    if let Err(e) = &outcome {
        error!(error = %e, "ETL failed");
    }
    outcome.context("ETL run failed")
}
