//! The `sidx` export: every float of a flat index, sorted ascending, behind
//! a two word header (`u64` dimension, `u64` vector count, native endian).
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteorder::{NativeEndian, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use tracing::debug;

use crate::vectors::Vectors;

const MANTISSA_BITS: u32 = 23;

#[derive(Debug, Clone, PartialEq)]
pub struct SortedValues {
    dimension: usize,
    num_vecs: usize,
    values: Vec<f32>,
}

/// Clears the lowest `bits` bits of the mantissa of `value`.
pub fn truncate_mantissa(value: f32, bits: u32) -> f32 {
    assert!(
        bits <= MANTISSA_BITS,
        "can't truncate {bits} bits of a {MANTISSA_BITS} bit mantissa"
    );
    let mask = u32::MAX << bits;
    f32::from_bits(value.to_bits() & mask)
}

impl SortedValues {
    pub fn from_vectors(vectors: &Vectors) -> Self {
        Self::from_vectors_truncated(vectors, 0)
    }

    /// Like [`SortedValues::from_vectors`], but drops the lowest `bits`
    /// mantissa bits of every value before sorting.
    pub fn from_vectors_truncated(vectors: &Vectors, bits: u32) -> Self {
        let mut values = vectors.data().to_vec();
        if bits > 0 {
            values
                .par_iter_mut()
                .for_each(|v| *v = truncate_mantissa(*v, bits));
        }
        values.par_sort_unstable_by(f32::total_cmp);

        Self {
            dimension: vectors.dimension(),
            num_vecs: vectors.num_vecs(),
            values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_vecs(&self) -> usize {
        self.num_vecs
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        debug!("writing {} sorted values to {:?}", self.values.len(), path.as_ref());
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u64::<NativeEndian>(self.dimension as u64)?;
        writer.write_u64::<NativeEndian>(self.num_vecs as u64)?;
        writer.write_all(bytemuck::cast_slice(&self.values))
    }

    pub fn read<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }

    pub fn read_from<R: Read>(mut reader: R) -> io::Result<Self> {
        let dimension = reader.read_u64::<NativeEndian>()? as usize;
        let num_vecs = reader.read_u64::<NativeEndian>()? as usize;
        if dimension == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "sorted values need a positive dimension",
            ));
        }
        let values = Vectors::from_reader(reader, num_vecs, dimension)?.into_data();

        Ok(Self {
            dimension,
            num_vecs,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        faiss::{FlatIndex, Metric},
        test_util::random_vectors,
    };

    use super::*;

    #[test]
    fn values_are_sorted() {
        let vectors = random_vectors(50, 16, 0x533D);
        let sorted = SortedValues::from_vectors(&vectors);
        assert_eq!(16, sorted.dimension());
        assert_eq!(50, sorted.num_vecs());
        assert_eq!(50 * 16, sorted.values().len());
        assert!(sorted.values().windows(2).all(|w| w[0] <= w[1]));

        let mut expected = vectors.data().to_vec();
        expected.sort_by(f32::total_cmp);
        assert_eq!(expected, sorted.values());
    }

    #[test]
    fn write_layout() {
        let vectors = Vectors::new(vec![3.0, -1.0, 2.0, 0.5], 2);
        let mut buf = Vec::new();
        SortedValues::from_vectors(&vectors)
            .write_to(&mut buf)
            .unwrap();

        assert_eq!(16 + 4 * 4, buf.len());
        assert_eq!(&2_u64.to_ne_bytes(), &buf[0..8]);
        assert_eq!(&2_u64.to_ne_bytes(), &buf[8..16]);
        assert_eq!(&(-1.0_f32).to_ne_bytes(), &buf[16..20]);
        assert_eq!(&3.0_f32.to_ne_bytes(), &buf[28..32]);
    }

    #[test]
    fn flat_index_to_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = dir.path().join("flat.index");
        let sidx_path = dir.path().join("flat.sidx");
        FlatIndex::new(random_vectors(20, 8, 0x533D), Metric::L2)
            .write(&index_path)
            .unwrap();

        let index = FlatIndex::read(&index_path).unwrap();
        let sorted = SortedValues::from_vectors(index.vectors());
        sorted.write(&sidx_path).unwrap();

        assert_eq!(sorted, SortedValues::read(&sidx_path).unwrap());
    }

    #[test]
    fn truncate_mantissa_bits() {
        assert_eq!(1.0, truncate_mantissa(1.0, 23));
        assert_eq!(1.0, truncate_mantissa(f32::from_bits(0x3fff_ffff), 23));
        assert_eq!(-1.5, truncate_mantissa(-1.75, 22));
        assert_eq!(0.1_f32, truncate_mantissa(0.1, 0));
        let truncated = truncate_mantissa(0.123_456, 8);
        assert_eq!(0, truncated.to_bits() & 0xff);
    }

    #[test]
    fn truncated_values_are_sorted() {
        let vectors = random_vectors(30, 8, 0x533D);
        let sorted = SortedValues::from_vectors_truncated(&vectors, 16);
        assert!(sorted.values().windows(2).all(|w| w[0] <= w[1]));
        assert!(sorted
            .values()
            .iter()
            .all(|v| v.to_bits() & 0xffff == 0));
    }

    #[test]
    #[should_panic]
    fn truncate_too_many_bits() {
        truncate_mantissa(1.0, 24);
    }

    #[test]
    fn read_truncated_file() {
        let vectors = random_vectors(4, 4, 0x533D);
        let mut buf = Vec::new();
        SortedValues::from_vectors(&vectors)
            .write_to(&mut buf)
            .unwrap();

        let err = SortedValues::read_from(&buf[..buf.len() - 1]).unwrap_err();
        assert_eq!(io::ErrorKind::UnexpectedEof, err.kind());
    }
}
