use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

use crate::vectors::Vectors;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("vector id {id} out of range for index holding {count} vectors")]
    IdOutOfRange { id: usize, count: usize },
}

/// What the query generator needs from a vector index: how many vectors
/// it holds, and a way to get stored vectors back by id.
///
/// Ids are dense in `[0, count())`. Reconstruction must be pure, so
/// asking for the same ids twice yields bit-identical rows.
pub trait VectorIndex {
    fn count(&self) -> usize;
    fn dimension(&self) -> usize;

    /// Row `i` of the result is the stored vector for `ids[i]`.
    fn reconstruct_batch(&self, ids: &[usize]) -> Result<Array2<f32>, ReconstructError>;

    fn reconstruct(&self, id: usize) -> Result<Array1<f32>, ReconstructError> {
        let batch = self.reconstruct_batch(&[id])?;
        Ok(batch.row(0).to_owned())
    }
}

impl VectorIndex for Vectors {
    fn count(&self) -> usize {
        self.num_vecs()
    }

    fn dimension(&self) -> usize {
        Vectors::dimension(self)
    }

    fn reconstruct_batch(&self, ids: &[usize]) -> Result<Array2<f32>, ReconstructError> {
        let count = self.num_vecs();
        let mut result = Array2::zeros((ids.len(), self.dimension()));
        for (mut row, &id) in result.rows_mut().into_iter().zip(ids) {
            let vector = self
                .get(id)
                .ok_or(ReconstructError::IdOutOfRange { id, count })?;
            row.assign(&ArrayView1::from(vector));
        }

        Ok(result)
    }
}
