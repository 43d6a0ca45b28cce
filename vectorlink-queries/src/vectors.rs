use std::{
    io::{self, Read, Write},
    ops::{Index, IndexMut},
};

/// Floats read per step. Storage only grows as data actually arrives.
const READ_CHUNK_FLOATS: usize = 1 << 20;

/// Contiguous row-major storage for fixed-dimension `f32` vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectors {
    data: Vec<f32>,
    dimension: usize,
}

impl Vectors {
    pub fn new(data: Vec<f32>, dimension: usize) -> Self {
        assert!(dimension > 0, "vectors need at least one dimension");
        assert_eq!(0, data.len() % dimension);
        Self { data, dimension }
    }

    pub fn empty(dimension: usize) -> Self {
        Self::new(Vec::new(), dimension)
    }

    pub fn from_reader<R: Read>(
        mut reader: R,
        num_vecs: usize,
        dimension: usize,
    ) -> io::Result<Self> {
        let len = num_vecs
            .checked_mul(dimension)
            .filter(|len| len.checked_mul(std::mem::size_of::<f32>()).is_some())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{num_vecs} vectors of dimension {dimension} do not fit in memory"),
                )
            })?;

        let mut data: Vec<f32> = Vec::new();
        while data.len() < len {
            let start = data.len();
            let end = std::cmp::min(len, start + READ_CHUNK_FLOATS);
            data.resize(end, 0.0);
            reader.read_exact(bytemuck::cast_slice_mut(&mut data[start..end]))?;
        }

        Ok(Self::new(data, dimension))
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(bytemuck::cast_slice(&self.data))
    }

    pub fn num_vecs(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        let offset = self.dimension.checked_mul(index)?;
        self.data.get(offset..offset.checked_add(self.dimension)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dimension)
    }

    pub fn normalize(&mut self) {
        for i in 0..self.num_vecs() {
            let vector = &mut self[i];
            let size: f32 = vector.iter().map(|e| e * e).sum::<f32>().sqrt();
            if size != 0.0 {
                vector.iter_mut().for_each(|e| *e /= size);
            }
        }
    }
}

impl Index<usize> for Vectors {
    type Output = [f32];

    fn index(&self, index: usize) -> &Self::Output {
        let offset = self.dimension * index;
        &self.data[offset..offset + self.dimension]
    }
}

impl IndexMut<usize> for Vectors {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let offset = self.dimension * index;
        &mut self.data[offset..offset + self.dimension]
    }
}
