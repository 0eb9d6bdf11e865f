//! How many workers a run gets, and which store they feed.

use crate::config::{Config, StorePolicy};
use crate::store::{StoreKind, BITSET_BYTES};

const MIB: u64 = 1 << 20;
const GIB: u64 = 1 << 30;

/// The smallest valid record, `0.0.0.0` plus its separator.
const MIN_RECORD_BYTES: u64 = 8;

/// Growable stores are never presized past what the auto policy would use
/// for the largest file it keeps off the bitset.
const MAX_PRESIZE: u64 = BITSET_BYTES as u64 / MIN_RECORD_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub workers: usize,
    pub store: StoreKind,
    /// Upper bound on the number of records, used to presize growable stores.
    pub expected: usize,
}

impl Plan {
    pub fn is_parallel(&self) -> bool {
        self.workers > 1
    }
}

/// Workers for a file of `size` bytes: one per 1 GiB below 1 GiB (so one),
/// one per 100 MiB up to 10 GiB, one per 1 GiB past that. Never more than
/// `max_workers`, nor more than 1.5 times `cores`.
pub fn worker_count(size: u64, max_workers: usize, cores: usize) -> usize {
    let chunk = if size < GIB {
        size.max(1)
    } else if size <= 10 * GIB {
        100 * MIB
    } else {
        GIB
    };
    let wanted = usize::try_from(size / chunk).unwrap_or(usize::MAX);
    let core_cap = cores.max(1) * 3 / 2;
    wanted.min(max_workers).min(core_cap).max(1)
}

pub fn plan(size: u64, config: &Config, cores: usize) -> Plan {
    let workers = worker_count(size, config.max_workers, cores);
    let estimate = size / MIN_RECORD_BYTES;
    let store = match config.store {
        StorePolicy::Bitset => StoreKind::Bitset,
        StorePolicy::Sorted => StoreKind::Sorted,
        StorePolicy::Hashed => StoreKind::Hashed,
        StorePolicy::Auto if workers > 1 || size > BITSET_BYTES as u64 => StoreKind::Bitset,
        StorePolicy::Auto => StoreKind::Sorted,
    };
    Plan {
        workers,
        store,
        expected: match store {
            StoreKind::Bitset => 0,
            _ => estimate.min(MAX_PRESIZE) as usize,
        },
    }
}
