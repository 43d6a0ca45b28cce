use std::{
    io::Write,
    path::{Path, PathBuf},
};

use rand::Rng;
use tracing::info;

use crate::{
    faiss::FlatIndex,
    index::VectorIndex,
    queries::{QueryError, QuerySet},
    sample::warns_full_population,
};

/// Loads the flat index at `index_path`, samples `query_count` stored
/// vectors and writes them to `<output_prefix>.queries`.
///
/// Progress lines go to `progress`. The full population warning is only
/// advisory, so asking for more queries than there are vectors still
/// prints it before failing.
pub fn export_queries<P1, P2, R, W>(
    index_path: P1,
    query_count: usize,
    output_prefix: P2,
    rng: &mut R,
    progress: &mut W,
) -> Result<PathBuf, QueryError>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    R: Rng + ?Sized,
    W: Write + ?Sized,
{
    writeln!(progress, "Loading FAISS index from file")?;
    let index = FlatIndex::read(&index_path)?;
    info!(
        ntotal = index.count(),
        dimension = index.dimension(),
        "loaded {:?}",
        index_path.as_ref()
    );

    if warns_full_population(query_count, index.count()) {
        writeln!(
            progress,
            "Warning: We're going to sample every document as a query..."
        )?;
    }
    let queries = QuerySet::generate(&index, query_count, rng)?;

    writeln!(progress, "Exporting the queries...")?;
    let path = queries.store(output_prefix)?;
    info!("wrote {} queries to {:?}", queries.len(), path);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{faiss::Metric, sample::SampleError, test_util::random_vectors};

    use super::*;

    const LOADING: &str = "Loading FAISS index from file\n";
    const WARNING: &str = "Warning: We're going to sample every document as a query...\n";
    const EXPORTING: &str = "Exporting the queries...\n";

    fn write_index(dir: &Path, num_vecs: usize) -> PathBuf {
        let path = dir.join("corpus.index");
        FlatIndex::new(random_vectors(num_vecs, 8, 0x533D), Metric::L2)
            .write(&path)
            .unwrap();
        path
    }

    #[test]
    fn export_prints_two_lines() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = write_index(dir.path(), 100);
        let mut rng = StdRng::seed_from_u64(0x533D);
        let mut out = Vec::new();

        let path = export_queries(&index_path, 10, dir.path().join("q"), &mut rng, &mut out)
            .unwrap();

        assert_eq!(format!("{LOADING}{EXPORTING}"), String::from_utf8(out).unwrap());
        assert_eq!(dir.path().join("q.queries"), path);
        let queries = QuerySet::load(path).unwrap();
        assert_eq!(10, queries.len());
        assert_eq!(8, queries.dimension());
    }

    #[test]
    fn export_whole_population_warns_first() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = write_index(dir.path(), 5);
        let mut rng = StdRng::seed_from_u64(0x533D);
        let mut out = Vec::new();

        let path =
            export_queries(&index_path, 5, dir.path().join("q"), &mut rng, &mut out).unwrap();

        assert_eq!(
            format!("{LOADING}{WARNING}{EXPORTING}"),
            String::from_utf8(out).unwrap()
        );
        let queries = QuerySet::load(path).unwrap();
        assert_eq!(&[0, 1, 2, 3, 4], queries.qids().as_slice().unwrap());
    }

    #[test]
    fn export_too_many_warns_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = write_index(dir.path(), 5);
        let mut rng = StdRng::seed_from_u64(0x533D);
        let mut out = Vec::new();

        let result = export_queries(&index_path, 6, dir.path().join("q"), &mut rng, &mut out);

        assert!(matches!(
            result,
            Err(QueryError::Sample(SampleError::CountExceedsPopulation {
                count: 6,
                population: 5
            }))
        ));
        assert_eq!(format!("{LOADING}{WARNING}"), String::from_utf8(out).unwrap());
        assert!(!dir.path().join("q.queries").exists());
    }

    #[test]
    fn export_zero_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = write_index(dir.path(), 5);
        let mut rng = StdRng::seed_from_u64(0x533D);
        let mut out = Vec::new();

        let result = export_queries(&index_path, 0, dir.path().join("q"), &mut rng, &mut out);

        assert!(matches!(
            result,
            Err(QueryError::Sample(SampleError::ZeroCount))
        ));
        assert_eq!(LOADING, String::from_utf8(out).unwrap());
        assert!(!dir.path().join("q.queries").exists());
    }

    #[test]
    fn export_from_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(0x533D);
        let mut out = Vec::new();

        let result = export_queries(
            dir.path().join("missing.index"),
            3,
            dir.path().join("q"),
            &mut rng,
            &mut out,
        );

        assert!(matches!(result, Err(QueryError::Index(_))));
        assert_eq!(LOADING, String::from_utf8(out).unwrap());
    }
}
