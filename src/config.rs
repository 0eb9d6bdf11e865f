//! Run configuration.

use crate::addr::LOOKAHEAD;
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use std::fmt;
use std::str::FromStr;
use std::thread;

/// Which dedup strategy to use. `Auto` leaves the choice to the size policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorePolicy {
    #[default]
    Auto,
    Bitset,
    Sorted,
    Hashed,
}

impl FromStr for StorePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(StorePolicy::Auto),
            "bitset" => Ok(StorePolicy::Bitset),
            "sorted" => Ok(StorePolicy::Sorted),
            "hashed" => Ok(StorePolicy::Hashed),
            other => Err(format!(
                "unknown store {other:?}, expected auto, bitset, sorted or hashed"
            )),
        }
    }
}

impl fmt::Display for StorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorePolicy::Auto => "auto",
            StorePolicy::Bitset => "bitset",
            StorePolicy::Sorted => "sorted",
            StorePolicy::Hashed => "hashed",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on concurrent readers.
    /// Default: available parallelism
    pub max_workers: usize,
    /// Byte ending each record.
    /// Default: b'\n'
    pub separator: u8,
    /// Applied to every individual read.
    /// Default: 3 attempts, 10ms apart
    pub retry: RetryPolicy,
    /// Default: Auto
    pub store: StorePolicy,
    /// Bytes per positioned read in a worker, and buffer size of the
    /// sequential reader.
    /// Default: 64 KiB
    pub block_size: usize,
    /// Key batches that may wait for the consumer before workers block.
    /// Default: 256
    pub queue_capacity: usize,
    /// Keys per batch sent by a worker.
    /// Default: 4096
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_workers: thread::available_parallelism().map_or(1, |n| n.get()),
            separator: b'\n',
            retry: RetryPolicy::default(),
            store: StorePolicy::Auto,
            block_size: 64 * 1024,
            queue_capacity: 256,
            batch_size: 4096,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_store(mut self, store: StorePolicy) -> Self {
        self.store = store;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".into()));
        }
        if self.separator.is_ascii_digit() || self.separator == b'.' {
            return Err(Error::Config(format!(
                "separator {:?} can appear inside an address",
                self.separator as char
            )));
        }
        if self.block_size < LOOKAHEAD {
            return Err(Error::Config(format!(
                "block_size must be at least {LOOKAHEAD} bytes"
            )));
        }
        if self.queue_capacity == 0 || self.batch_size == 0 {
            return Err(Error::Config(
                "queue_capacity and batch_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.max_workers >= 1);
        assert_eq!(config.separator, b'\n');
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            Config::new().with_max_workers(0),
            Config::new().with_separator(b'.'),
            Config::new().with_separator(b'7'),
            Config::new().with_block_size(LOOKAHEAD - 1),
            Config::new().with_queue_capacity(0),
            Config::new().with_batch_size(0),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{config:?}");
        }
    }

    #[test]
    fn store_policy_parsing() {
        assert_eq!("Bitset".parse::<StorePolicy>(), Ok(StorePolicy::Bitset));
        assert_eq!("hashed".parse::<StorePolicy>(), Ok(StorePolicy::Hashed));
        assert!("bloom".parse::<StorePolicy>().is_err());
        assert_eq!(StorePolicy::Sorted.to_string(), "sorted");
    }
}
