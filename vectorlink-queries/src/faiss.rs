//! Reading and writing FAISS flat indexes without linking FAISS.
//!
//! A flat index is a 37 byte header followed by the raw vector data:
//!
//! | field         | type  | notes                                    |
//! |---------------|-------|------------------------------------------|
//! | fourcc        | `u32` | `IxF2` (L2), `IxFI` (inner product), `IxFl` |
//! | d             | `i32` | vector dimensionality                    |
//! | ntotal        | `i64` | number of stored vectors                 |
//! | dummy         | `i64` | always `1 << 20`                         |
//! | dummy         | `i64` | always `1 << 20`                         |
//! | is_trained    | `u8`  | meaningless for flat indexes             |
//! | metric_type   | `i32` | only followed by `metric_arg: f32` if > 1 |
//!
//! The data is a `u64` float count and then that many `f32`s. Everything
//! is in native byte order, like FAISS writes it.
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

use crate::{
    index::{ReconstructError, VectorIndex},
    vectors::Vectors,
};

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

const FOURCC_FLAT_L2: u32 = fourcc(b"IxF2");
const FOURCC_FLAT_IP: u32 = fourcc(b"IxFI");
const FOURCC_FLAT: u32 = fourcc(b"IxFl");

const HEADER_DUMMY: i64 = 1 << 20;

const METRIC_INNER_PRODUCT: i32 = 0;
const METRIC_L2: i32 = 1;

#[derive(Error, Debug)]
pub enum IndexReadError {
    #[error("io error while reading index: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported index type {0:?}, only flat indexes can be read")]
    UnsupportedIndexType(String),
    #[error("invalid index header: {0}")]
    InvalidHeader(String),
    #[error("index header promises {expected} floats but data holds {found}")]
    CodeLengthMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    InnerProduct,
    L2,
    /// Any of the other FAISS metrics, which carry an extra argument.
    Other { metric_type: i32, metric_arg: f32 },
}

impl Metric {
    fn metric_type(&self) -> i32 {
        match self {
            Metric::InnerProduct => METRIC_INNER_PRODUCT,
            Metric::L2 => METRIC_L2,
            Metric::Other { metric_type, .. } => *metric_type,
        }
    }

    fn fourcc(&self) -> u32 {
        match self {
            Metric::InnerProduct => FOURCC_FLAT_IP,
            Metric::L2 => FOURCC_FLAT_L2,
            Metric::Other { .. } => FOURCC_FLAT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatHeader {
    pub fourcc: u32,
    pub dimension: usize,
    pub ntotal: usize,
    pub is_trained: bool,
    pub metric: Metric,
}

fn fourcc_name(fourcc: u32) -> String {
    String::from_utf8_lossy(&fourcc.to_le_bytes()).into_owned()
}

impl FlatHeader {
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, IndexReadError> {
        let fourcc = reader.read_u32::<NativeEndian>()?;
        if ![FOURCC_FLAT_L2, FOURCC_FLAT_IP, FOURCC_FLAT].contains(&fourcc) {
            return Err(IndexReadError::UnsupportedIndexType(fourcc_name(fourcc)));
        }

        let dimension = reader.read_i32::<NativeEndian>()?;
        let ntotal = reader.read_i64::<NativeEndian>()?;
        // two dummies that FAISS never reads back
        reader.read_i64::<NativeEndian>()?;
        reader.read_i64::<NativeEndian>()?;
        let is_trained = reader.read_u8()? != 0;
        let metric = match reader.read_i32::<NativeEndian>()? {
            METRIC_INNER_PRODUCT => Metric::InnerProduct,
            METRIC_L2 => Metric::L2,
            metric_type if metric_type > METRIC_L2 => Metric::Other {
                metric_type,
                metric_arg: reader.read_f32::<NativeEndian>()?,
            },
            metric_type => {
                return Err(IndexReadError::InvalidHeader(format!(
                    "unknown metric type {metric_type}"
                )))
            }
        };

        if dimension <= 0 {
            return Err(IndexReadError::InvalidHeader(format!(
                "dimension must be positive, got {dimension}"
            )));
        }
        if ntotal < 0 {
            return Err(IndexReadError::InvalidHeader(format!(
                "vector count must not be negative, got {ntotal}"
            )));
        }

        Ok(Self {
            fourcc,
            dimension: dimension as usize,
            ntotal: ntotal as usize,
            is_trained,
            metric,
        })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<NativeEndian>(self.fourcc)?;
        writer.write_i32::<NativeEndian>(self.dimension as i32)?;
        writer.write_i64::<NativeEndian>(self.ntotal as i64)?;
        writer.write_i64::<NativeEndian>(HEADER_DUMMY)?;
        writer.write_i64::<NativeEndian>(HEADER_DUMMY)?;
        writer.write_u8(self.is_trained as u8)?;
        writer.write_i32::<NativeEndian>(self.metric.metric_type())?;
        match self.metric {
            Metric::Other {
                metric_type,
                metric_arg,
            } if metric_type > METRIC_L2 => writer.write_f32::<NativeEndian>(metric_arg)?,
            _ => {}
        }

        Ok(())
    }

    pub fn index_type(&self) -> String {
        fourcc_name(self.fourcc)
    }
}

/// A FAISS flat index held fully in memory.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    header: FlatHeader,
    vectors: Vectors,
}

impl FlatIndex {
    pub fn new(vectors: Vectors, metric: Metric) -> Self {
        let header = FlatHeader {
            fourcc: metric.fourcc(),
            dimension: vectors.dimension(),
            ntotal: vectors.num_vecs(),
            is_trained: true,
            metric,
        };

        Self { header, vectors }
    }

    pub fn header(&self) -> &FlatHeader {
        &self.header
    }

    pub fn vectors(&self) -> &Vectors {
        &self.vectors
    }

    pub fn metric(&self) -> Metric {
        self.header.metric
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, IndexReadError> {
        debug!("reading flat index from {:?}", path.as_ref());
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, IndexReadError> {
        let header = FlatHeader::read_from(&mut reader)?;
        debug!(
            index_type = %header.index_type(),
            dimension = header.dimension,
            ntotal = header.ntotal,
            "read flat index header"
        );

        let expected = header
            .dimension
            .checked_mul(header.ntotal)
            .filter(|floats| floats.checked_mul(std::mem::size_of::<f32>()).is_some())
            .ok_or_else(|| {
                IndexReadError::InvalidHeader(format!(
                    "{} vectors of dimension {} overflow",
                    header.ntotal, header.dimension
                ))
            })?;
        let found = reader.read_u64::<NativeEndian>()? as usize;
        if found != expected {
            return Err(IndexReadError::CodeLengthMismatch { expected, found });
        }

        let vectors = Vectors::from_reader(reader, header.ntotal, header.dimension)?;

        Ok(Self { header, vectors })
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        debug!("writing flat index to {:?}", path.as_ref());
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        self.header.write_to(&mut writer)?;
        writer.write_u64::<NativeEndian>(self.vectors.data().len() as u64)?;
        self.vectors.write_to(writer)
    }
}

impl VectorIndex for FlatIndex {
    fn count(&self) -> usize {
        self.vectors.num_vecs()
    }

    fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    fn reconstruct_batch(&self, ids: &[usize]) -> Result<Array2<f32>, ReconstructError> {
        self.vectors.reconstruct_batch(ids)
    }
}
