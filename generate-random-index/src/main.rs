use std::io;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use vectorlink_queries::{
    faiss::{FlatIndex, Metric},
    test_util::{random_vectors, random_vectors_normalized},
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    L2,
    Ip,
}

impl From<MetricArg> for Metric {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::L2 => Metric::L2,
            MetricArg::Ip => Metric::InnerProduct,
        }
    }
}

/// Write a FAISS flat index filled with random vectors
#[derive(Parser, Debug)]
struct Command {
    index_path: String,
    num_vecs: usize,

    #[arg(long, default_value_t = 768)]
    dimension: usize,
    #[arg(long, default_value_t = 0x533D)]
    seed: u64,
    #[arg(long)]
    normalize: bool,
    #[arg(long, value_enum, default_value_t = MetricArg::L2)]
    metric: MetricArg,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Command::parse();
    let vectors = if args.normalize {
        random_vectors_normalized(args.num_vecs, args.dimension, args.seed)
    } else {
        random_vectors(args.num_vecs, args.dimension, args.seed)
    };
    FlatIndex::new(vectors, args.metric.into()).write(&args.index_path)?;

    Ok(())
}
