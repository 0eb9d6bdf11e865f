//! Distinct-key accumulators.
//!
//! A run picks one strategy up front and feeds every parsed key into it; the
//! count comes out of [`DedupStore::finish`]. Insertion order never matters.

use rayon::slice::ParallelSliceMut;
use rustc_hash::FxHashSet;
use std::fmt;
use std::hash::Hash;

/// One bit for every `u32`.
pub const BITSET_BYTES: usize = 1 << 29;

pub trait DedupStore<K = u32>: Send {
    fn insert(&mut self, key: K);

    fn extend(&mut self, keys: &[K])
    where
        K: Copy,
    {
        for &key in keys {
            self.insert(key);
        }
    }

    /// Number of distinct keys inserted so far.
    fn finish(&mut self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Bitset,
    Sorted,
    Hashed,
}

impl StoreKind {
    /// Builds an IPv4 store. `expected` only sizes the growable strategies.
    pub fn build(self, expected: usize) -> Box<dyn DedupStore<u32>> {
        match self {
            StoreKind::Bitset => Box::new(BitsetStore::new()),
            StoreKind::Sorted => Box::new(SortedStore::with_capacity(expected)),
            StoreKind::Hashed => Box::new(HashedStore::with_capacity(expected)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreKind::Bitset => "bitset",
            StoreKind::Sorted => "sorted",
            StoreKind::Hashed => "hashed",
        })
    }
}

/// Fixed 512 MiB bitmap over the whole IPv4 key space.
pub struct BitsetStore {
    bits: Box<[u8]>,
    count: u64,
}

impl BitsetStore {
    pub fn new() -> Self {
        BitsetStore {
            bits: vec![0u8; BITSET_BYTES].into_boxed_slice(),
            count: 0,
        }
    }

    pub fn contains(&self, key: u32) -> bool {
        self.bits[(key >> 3) as usize] & (1 << (key & 7)) != 0
    }
}

impl Default for BitsetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DedupStore<u32> for BitsetStore {
    #[inline]
    fn insert(&mut self, key: u32) {
        let byte = &mut self.bits[(key >> 3) as usize];
        let mask = 1u8 << (key & 7);
        if *byte & mask == 0 {
            *byte |= mask;
            self.count += 1;
        }
    }

    fn finish(&mut self) -> u64 {
        self.count
    }
}

/// Keeps every key, duplicates included, and counts runs after a sort.
pub struct SortedStore<K> {
    keys: Vec<K>,
}

impl<K> SortedStore<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        SortedStore {
            keys: Vec::with_capacity(capacity),
        }
    }
}

impl<K: Ord + Copy + Send> DedupStore<K> for SortedStore<K> {
    #[inline]
    fn insert(&mut self, key: K) {
        self.keys.push(key);
    }

    fn extend(&mut self, keys: &[K]) {
        self.keys.extend_from_slice(keys);
    }

    fn finish(&mut self) -> u64 {
        self.keys.par_sort_unstable();
        count_runs(&self.keys)
    }
}

/// Distinct values in an ascending slice.
fn count_runs<K: PartialEq>(sorted: &[K]) -> u64 {
    match sorted.first() {
        None => 0,
        Some(_) => 1 + sorted.windows(2).filter(|w| w[0] != w[1]).count() as u64,
    }
}

/// Hash set strategy, for key spaces too wide for a bitmap.
pub struct HashedStore<K> {
    keys: FxHashSet<K>,
}

impl<K> HashedStore<K> {
    pub fn with_capacity(capacity: usize) -> Self {
        HashedStore {
            keys: FxHashSet::with_capacity_and_hasher(capacity, Default::default()),
        }
    }
}

impl<K: Hash + Eq + Send> DedupStore<K> for HashedStore<K> {
    #[inline]
    fn insert(&mut self, key: K) {
        self.keys.insert(key);
    }

    fn finish(&mut self) -> u64 {
        self.keys.len() as u64
    }
}
