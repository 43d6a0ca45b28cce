use std::io;

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;
use vectorlink_queries::export::export_queries;

#[derive(Parser, Debug)]
#[command(version, about = "Sample stored vectors from a FAISS index as a query set", long_about = None)]
struct Command {
    /// path to FAISS index
    #[arg(long)]
    faiss_index: String,
    /// how many queries to generate
    #[arg(long)]
    query_count: usize,
    /// output prefix, queries are written to <output>.queries
    #[arg(long)]
    output: String,
    /// seed for the sampler, taken from the OS when absent
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Command::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    export_queries(
        &args.faiss_index,
        args.query_count,
        &args.output,
        &mut rng,
        &mut io::stdout().lock(),
    )?;

    Ok(())
}
