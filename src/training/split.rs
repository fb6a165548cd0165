//! Seeded train/test partitioning

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `rows` indices with a fixed seed and hold out
/// `ceil(rows * test_fraction)` of them for testing.
///
/// Identical arguments always produce identical partitions.
pub fn train_test_split(rows: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let test_len = ((rows as f64) * fraction).ceil() as usize;

    let mut indices: Vec<usize> = (0..rows).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let train = indices.split_off(test_len.min(rows));
    SplitIndices {
        train,
        test: indices,
    }
}

/// Select the rows at `indices`
pub fn take<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(101, 0.2, 42);
        assert_eq!(split.test.len(), 21);
        assert_eq!(split.train.len(), 80);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        assert_eq!(train_test_split(500, 0.2, 42), train_test_split(500, 0.2, 42));
        assert_ne!(train_test_split(500, 0.2, 42), train_test_split(500, 0.2, 43));
    }

    #[test]
    fn test_take() {
        let items = ["a", "b", "c", "d"];
        assert_eq!(take(&items, &[3, 0]), vec!["d", "a"]);
    }
}
