use clap::Parser;
use itertools::Itertools;
use vectorlink_queries::queries::QuerySet;

#[derive(Parser, Debug)]
#[command(version, about = "Summarize a .queries archive", long_about = None)]
struct Command {
    queries_file: String,
    /// how many leading query ids to print
    #[arg(long, default_value_t = 10)]
    show: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Command::parse();
    let queries = QuerySet::load(&args.queries_file)?;

    println!("queries:   {}", queries.len());
    println!("dimension: {}", queries.dimension());
    let mut shown: Vec<String> = queries
        .qids()
        .iter()
        .take(args.show)
        .map(|id| id.to_string())
        .collect();
    if queries.len() > args.show {
        shown.push("...".to_string());
    }
    println!("qids:      [{}]", shown.iter().join(", "));

    Ok(())
}
