use rand::{seq::index, Rng};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleError {
    #[error("query count must be positive")]
    ZeroCount,
    #[error("cannot sample {count} distinct ids from a population of {population}")]
    CountExceedsPopulation { count: usize, population: usize },
}

/// Whether a sample of `count` ids would take the whole population (or
/// more). This is advisory only: `count > population` still fails in
/// [`sample_ids`].
pub fn warns_full_population(count: usize, population: usize) -> bool {
    count >= population
}

/// Draws `count` distinct ids uniformly from `[0, population)` and returns
/// them in ascending order.
pub fn sample_ids<R: Rng + ?Sized>(
    rng: &mut R,
    population: usize,
    count: usize,
) -> Result<Vec<usize>, SampleError> {
    if count == 0 {
        return Err(SampleError::ZeroCount);
    }
    if count > population {
        return Err(SampleError::CountExceedsPopulation { count, population });
    }

    let mut ids = index::sample(rng, population, count).into_vec();
    ids.sort_unstable();

    Ok(ids)
}
