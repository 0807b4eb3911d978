use fnv::FnvHasher;
use lazy_static::lazy_static;
use std::{
    collections::HashMap,
    hash::{BuildHasherDefault, Hash}
};

pub type FnvHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FnvHasher>>;

/// Construct a hash map with the specified capacity. The hashing algorithm is much faster than the default
/// on short keys such as integers and small strings.
/// On large keys it is actually slower.
/// Note it is less robust against security attacks on key collisions.
pub fn fnv_hashmap<K: Hash + Eq, V>(capacity: usize) -> FnvHashMap<K, V> {
    let fnv = BuildHasherDefault::<FnvHasher>::default();
    HashMap::<K, V, _>::with_capacity_and_hasher(capacity, fnv)
}

/// The number of cells in a dense grid with the given axis lengths, or None if it overflows a usize.
pub fn cells_count(sizes: &[usize]) -> Option<usize> {
    sizes.iter()
         .try_fold(1usize, |count, &size| count.checked_mul(size))
}

const AXIS_PRIMES_COUNT: usize = 64;

lazy_static! {
    static ref AXIS_PRIMES: Vec<u64> = first_primes(AXIS_PRIMES_COUNT);
}

/// Hash multiplier for an axis. Axes beyond the table reuse it cyclically.
#[inline]
pub fn axis_prime(axis: usize) -> u64 {
    AXIS_PRIMES[axis % AXIS_PRIMES_COUNT]
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        let is_prime = primes.iter()
                             .take_while(|&&p| p * p <= candidate)
                             .all(|&p| candidate % p != 0);
        if is_prime {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
