//! Atelier - deliverable orchestration and quality-gate pipeline
//!
//! Usage:
//!   atelier serve                 Run the HTTP API
//!   atelier plan "<request>"      Print the plan for a request without executing

use anyhow::Result;
use atelier_agents::AgentRegistry;
use atelier_core::config::AtelierConfig;
use atelier_core::ClientRequest;
use atelier_planning::PlanBuilder;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Deliverable orchestration and quality-gate pipeline")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file
    #[arg(long, default_value = "atelier.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },

    /// Plan a request and print the phase breakdown without executing
    Plan {
        /// Client request text
        request: String,

        /// Client identifier
        #[arg(long, default_value = "cli")]
        client_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AtelierConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Serve { addr } => {
            let state = atelier_api::AppState::build(config);
            atelier_api::serve(state, &addr).await?;
        }
        Commands::Plan { request, client_id } => {
            let builder = PlanBuilder::new(AgentRegistry::standard());
            let plan = builder.build(Uuid::new_v4(), &ClientRequest::new(request, client_id))?;
            println!(
                "{:?} ({:?}, {:?}) - {} phases, {} agents, {} deliverables",
                plan.analysis.project_type,
                plan.analysis.complexity,
                plan.analysis.channels,
                plan.phases.len(),
                plan.total_agents,
                plan.total_deliverables,
            );
            for phase in &plan.phases {
                println!("  {} - {}", phase.name, phase.description);
                for assignment in &phase.assignments {
                    println!(
                        "    {} ({}) x{}",
                        assignment.agent_id,
                        assignment.deliverable_type,
                        assignment.expected_deliverables
                    );
                }
            }
            if !plan.quality_gates.is_empty() {
                println!("  gates: {}", plan.quality_gates.join(", "));
            }
        }
    }

    Ok(())
}
