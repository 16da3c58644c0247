use rand::seq::SliceRandom;
use rand::Rng;

/// Asked for more items than exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: usize,
    pub requested: usize,
}

/// Exactly `count` distinct items drawn without replacement, in draw order.
pub fn sample<T, R: Rng>(mut pool: Vec<T>, count: usize, rng: &mut R) -> Result<Vec<T>, Shortfall> {
    if pool.len() < count {
        return Err(Shortfall {
            available: pool.len(),
            requested: count,
        });
    }
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let i = rng.gen_range(0..pool.len());
        picked.push(pool.swap_remove(i));
    }
    Ok(picked)
}

/// Shuffle everything and keep at most `limit`; never fails on a short pool.
pub fn shuffle_take<T, R: Rng>(mut pool: Vec<T>, limit: usize, rng: &mut R) -> Vec<T> {
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}

/// One random element, if any.
pub fn pick<'a, T, R: Rng>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    items.choose(rng)
}
