use std::{
    ffi::OsString,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use ndarray::{Array1, Array2};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError, WriteNpzError};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::{
    faiss::IndexReadError,
    index::{ReconstructError, VectorIndex},
    sample::{sample_ids, SampleError},
};

pub const QUERIES_EXTENSION: &str = "queries";

const QIDS_NAME: &str = "qids";
const QUERY_VECTORS_NAME: &str = "query_vectors";

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Index(#[from] IndexReadError),
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("error while writing query archive: {0}")]
    Write(#[from] WriteNpzError),
    #[error("error while reading query archive: {0}")]
    Read(#[from] ReadNpzError),
    #[error("query archive has {qids} ids but {vectors} vectors")]
    Misaligned { qids: usize, vectors: usize },
}

/// Sampled query ids together with their stored vectors. Row `i` of
/// `query_vectors` belongs to `qids[i]`, and ids ascend.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySet {
    qids: Array1<i64>,
    query_vectors: Array2<f32>,
}

impl QuerySet {
    pub fn generate<I, R>(index: &I, count: usize, rng: &mut R) -> Result<Self, QueryError>
    where
        I: VectorIndex + ?Sized,
        R: Rng + ?Sized,
    {
        let ids = sample_ids(rng, index.count(), count)?;
        debug!(count = ids.len(), population = index.count(), "sampled query ids");
        let query_vectors = index.reconstruct_batch(&ids)?;
        let qids = ids.iter().map(|&id| id as i64).collect();

        Ok(Self {
            qids,
            query_vectors,
        })
    }

    pub fn qids(&self) -> &Array1<i64> {
        &self.qids
    }

    pub fn query_vectors(&self) -> &Array2<f32> {
        &self.query_vectors
    }

    pub fn len(&self) -> usize {
        self.qids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.qids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.query_vectors.ncols()
    }

    /// `<prefix>.queries`. The suffix is appended as is, so a prefix that
    /// already has an extension keeps it.
    pub fn output_path<P: AsRef<Path>>(prefix: P) -> PathBuf {
        let mut path: OsString = prefix.as_ref().as_os_str().to_owned();
        path.push(".");
        path.push(QUERIES_EXTENSION);
        PathBuf::from(path)
    }

    /// Writes the archive to `<prefix>.queries` and returns that path.
    pub fn store<P: AsRef<Path>>(&self, prefix: P) -> Result<PathBuf, QueryError> {
        let path = Self::output_path(prefix);
        debug!("storing {} queries to {:?}", self.len(), path);
        let mut npz = NpzWriter::new(BufWriter::new(File::create(&path)?));
        npz.add_array(QIDS_NAME, &self.qids)?;
        npz.add_array(QUERY_VECTORS_NAME, &self.query_vectors)?;
        let mut writer = npz.finish()?;
        writer.flush()?;

        Ok(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, QueryError> {
        debug!("loading queries from {:?}", path.as_ref());
        let mut npz = NpzReader::new(BufReader::new(File::open(path)?))?;
        let qids: Array1<i64> = npz.by_name(QIDS_NAME)?;
        let query_vectors: Array2<f32> = npz.by_name(QUERY_VECTORS_NAME)?;
        if qids.len() != query_vectors.nrows() {
            return Err(QueryError::Misaligned {
                qids: qids.len(),
                vectors: query_vectors.nrows(),
            });
        }

        Ok(Self {
            qids,
            query_vectors,
        })
    }
}
