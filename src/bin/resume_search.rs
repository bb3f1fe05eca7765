use std::sync::Arc;

use ai_relay::{
    config, logging,
    hiring::{HiringApi, HiringService, QueryOutcome, QueryRequest, QueryStrategy},
    metrics::RelayMetrics,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "resume-search",
    about = "Ingest the resume corpus or search it from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index every sampled resume from RESUME_CSV_PATH.
    Ingest,
    /// Rank candidates for a free-text query.
    Query {
        /// Description of the wanted candidate.
        text: String,
        /// `categories` or `top-k`.
        #[arg(long, default_value = "categories")]
        strategy: QueryStrategy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::init_config();
    logging::init_tracing();

    let service = HiringService::new(config::get_config(), Arc::new(RelayMetrics::new()))
        .await
        .context("failed to initialize hiring service")?;

    match cli.command {
        Command::Ingest => {
            let outcome = service
                .generate_embeddings()
                .await
                .context("corpus ingestion failed")?;
            println!(
                "Ingested {} candidates ({} index entries).",
                outcome.candidates_ingested, outcome.entries_written
            );
        }
        Command::Query { text, strategy } => {
            let outcome = service
                .query(QueryRequest {
                    query_text: text,
                    strategy,
                })
                .await
                .context("query failed")?;
            print_outcome(outcome);
        }
    }

    Ok(())
}

fn print_outcome(outcome: QueryOutcome) {
    match outcome {
        QueryOutcome::NotFound => println!("No candidates matched the query."),
        QueryOutcome::Success {
            candidates,
            detailed_response,
        } => {
            println!("Found {} top candidates.", candidates.len());
            for (rank, candidate) in candidates.iter().enumerate() {
                println!("{:>2}. {} (score {:.3})", rank + 1, candidate.id, candidate.score);
            }
            println!();
            println!("{detailed_response}");
        }
    }
}
