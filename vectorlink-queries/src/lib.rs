pub mod export;
pub mod faiss;
pub mod index;
pub mod queries;
pub mod sample;
pub mod sidx;
pub mod test_util;
pub mod vectors;
