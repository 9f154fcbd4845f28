use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use featurecost::config::EstimatorConfig;
use featurecost::estimate::{self, EstimateResult};
use featurecost::import::{self, PartialImport};
use featurecost::{api, db, render};

#[derive(Parser)]
#[command(name = "fcost")]
#[command(about = "Staffing, duration and price estimates from a feature breakdown")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Estimate a project document
    Estimate {
        file: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the feature tree of a project document
    Tree { file: PathBuf },
}

/// Initialize tracing with output to stderr (for one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "featurecost=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // Keep stdout clean for the command's own output
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let config = EstimatorConfig::load();

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        None => serve(config, None).await?,
        Some(Commands::Estimate { file, json }) => {
            let imported = load_document(&file)?;
            let result = estimate::compute(&imported.project, &config.calibration);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
        Some(Commands::Tree { file }) => {
            let imported = load_document(&file)?;
            print!("{}", render::render_tree(&imported.project.tree));
        }
    }

    Ok(())
}

async fn serve(config: EstimatorConfig, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.server.port);
    tracing::info!("Starting featurecost server on port {}", port);

    let db = db::Database::open_default()?;
    db.migrate()?;

    let app = api::create_router(api::AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("featurecost server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn load_document(path: &Path) -> anyhow::Result<PartialImport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let imported = import::import_project(&content).with_context(|| format!("Failed to import {}", path.display()))?;
    if !imported.is_complete() {
        eprintln!("Skipped {} unreadable entries", imported.skipped.len());
    }
    Ok(imported)
}

fn print_summary(result: &EstimateResult) {
    println!(
        "{} chargeable units, {:.1} baseline days (x{:.2})",
        result.chargeable_units, result.backend_baseline_days, result.aggregate_multiplier
    );
    println!();
    println!(
        "{:<18} {:>6} {:>10} {:>5} {:>10} {:>12}",
        "ROLE", "RATIO", "WORK DAYS", "HC", "ELAPSED", "COST"
    );
    for w in &result.team_workloads {
        println!(
            "{:<18} {:>6.2} {:>10.1} {:>5} {:>10.1} {:>12.2}",
            w.role.label(),
            w.ratio,
            w.work_days,
            w.headcount,
            w.elapsed_days,
            w.cost
        );
    }
    println!();
    println!("Total duration:  {:.1} days", result.total_days);
    println!("Base cost:       {:.2}", result.base_cost);
    if !result.impact_factors.is_empty() {
        println!("Adjusted cost:   {:.2} (x{:.2})", result.adjusted_cost, result.impact_multiplier);
    }
    println!("Final price:     {:.2}", result.final_price);
    if !result.hardware.items.is_empty() {
        println!(
            "Hardware:        {:.2} / year ({:.2} / month)",
            result.hardware.annual_total, result.hardware.monthly_total
        );
    }
}
