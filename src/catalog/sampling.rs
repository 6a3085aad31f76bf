use rand::{seq::SliceRandom, Rng};

/// Up to `limit` items of `pool` in uniformly random order.
pub fn sample_recipes<T, R>(mut pool: Vec<T>, limit: usize, rng: &mut R) -> Vec<T>
where
    R: Rng + ?Sized,
{
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

pub fn suggest_recipes<T>(pool: Vec<T>, limit: usize) -> Vec<T> {
    sample_recipes(pool, limit, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn sample_is_bounded_by_pool_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = sample_recipes(vec![1, 2, 3], 5, &mut rng);

        assert_eq!(sample.len(), 3);
        let unique: HashSet<i32> = sample.iter().copied().collect();
        assert_eq!(unique, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn sample_is_truncated_to_limit() {
        let mut rng = StdRng::seed_from_u64(42);
        let sample = sample_recipes((0..50).collect::<Vec<i32>>(), 5, &mut rng);

        assert_eq!(sample.len(), 5);
        let unique: HashSet<i32> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn empty_pool_and_zero_limit() {
        assert!(suggest_recipes(Vec::<i32>::new(), 3).is_empty());
        assert!(suggest_recipes(vec![1, 2], 0).is_empty());
    }

    #[test]
    fn every_item_can_come_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            firsts.insert(sample_recipes(vec![1, 2, 3], 1, &mut rng)[0]);
        }
        assert_eq!(firsts.len(), 3);
    }
}
