use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::vectors::Vectors;

pub fn random_vectors(num_vecs: usize, dimension: usize, seed: u64) -> Vectors {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..num_vecs * dimension)
        .map(|_| rng.gen_range(-1.0..1.0))
        .collect();

    Vectors::new(data, dimension)
}

pub fn random_vectors_normalized(num_vecs: usize, dimension: usize, seed: u64) -> Vectors {
    let mut vectors = random_vectors(num_vecs, dimension, seed);
    vectors.normalize();

    vectors
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn random_vectors_are_seeded() {
        let first = random_vectors(10, 8, 0x533D);
        let second = random_vectors(10, 8, 0x533D);
        let other = random_vectors(10, 8, 0x533E);
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.data().iter().all(|e| (-1.0..1.0).contains(e)));
    }

    #[test]
    fn normalized_vectors_have_unit_length() {
        let vectors = random_vectors_normalized(10, 64, 0x533D);
        for vector in vectors.iter() {
            let size: f32 = vector.iter().map(|e| e * e).sum::<f32>().sqrt();
            assert_relative_eq!(1.0, size, epsilon = 1e-5);
        }
    }
}
