use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vectorlink_queries::{faiss::FlatIndex, sidx::SortedValues};

/// Dump all values of a flat FAISS index, sorted, as an sidx file
#[derive(Parser, Debug)]
struct Command {
    index_path: String,
    sidx_path: String,

    /// clear this many low mantissa bits before sorting
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=23))]
    truncate_bits: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Command::parse();
    let index = FlatIndex::read(&args.index_path)?;
    println!("Dim    = {}", index.header().dimension);
    println!("Ntotal = {}", index.header().ntotal);

    SortedValues::from_vectors_truncated(index.vectors(), args.truncate_bits)
        .write(&args.sidx_path)?;

    Ok(())
}
