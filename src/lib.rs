//! Counts distinct IPv4 addresses in large newline-delimited files.
//!
//! Small inputs are streamed through one reader into a sort-based store.
//! Large ones are cut into separator-aligned partitions, each read by its
//! own thread with positioned reads, and every parsed address lands in a
//! 512 MiB bitset owned by the calling thread. Memory stays bounded either
//! way, however many addresses the file holds.
//!
//! ```no_run
//! use ipcount::{CancelToken, Config, IpCounter};
//!
//! let counter = IpCounter::new(Config::default())?;
//! let unique = counter.unique_ipv4(&CancelToken::new(), "addresses.txt")?;
//! println!("{unique}");
//! # Ok::<(), ipcount::Error>(())
//! ```

pub mod addr;
pub mod cancel;
pub mod config;
pub mod error;
pub mod parallel;
pub mod partition;
pub mod policy;
pub mod records;
pub mod retry;
pub mod sequential;
pub mod source;
pub mod store;

pub use cancel::CancelToken;
pub use config::{Config, StorePolicy};
pub use error::{Error, ParseError, Result};
pub use records::Tally;
pub use retry::{Backoff, RetryPolicy};
pub use source::Source;
pub use store::{DedupStore, StoreKind};

use std::fs::File;
use std::path::Path;
use std::thread;
use tracing::{debug, info_span};

#[derive(Debug, Clone)]
pub struct IpCounter {
    config: Config,
    cores: usize,
}

impl IpCounter {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(IpCounter {
            config,
            cores: thread::available_parallelism().map_or(1, |n| n.get()),
        })
    }

    /// Overrides the detected core count the worker cap is derived from.
    pub fn with_cores(mut self, cores: usize) -> Self {
        self.cores = cores.max(1);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of distinct IPv4 addresses in the file at `path`.
    pub fn unique_ipv4(&self, cancel: &CancelToken, path: impl AsRef<Path>) -> Result<u64> {
        self.count_ipv4(cancel, path).map(|tally| tally.unique)
    }

    pub fn count_ipv4(&self, cancel: &CancelToken, path: impl AsRef<Path>) -> Result<Tally> {
        cancel.check()?;
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.count_source(cancel, &file)
    }

    /// Counts over any [`Source`]; [`count_ipv4`](Self::count_ipv4) calls this
    /// with the opened file.
    pub fn count_source<S: Source + ?Sized>(
        &self,
        cancel: &CancelToken,
        source: &S,
    ) -> Result<Tally> {
        cancel.check()?;
        let size = source.size()?;
        let plan = policy::plan(size, &self.config, self.cores);
        let _span =
            info_span!("count", size, workers = plan.workers, store = %plan.store).entered();
        debug!(?plan, "planned run");

        let mut store = plan.store.build(plan.expected);
        let tally = if plan.is_parallel() {
            let ends = partition::plan(
                source,
                size,
                self.config.separator,
                plan.workers,
                &self.config.retry,
                cancel,
            )?;
            parallel::count(source, &ends, &self.config, store.as_mut(), cancel)?
        } else {
            sequential::count(source, &self.config, store.as_mut(), cancel)?
        };

        if tally.malformed > 0 {
            debug!(malformed = tally.malformed, "skipped malformed records");
        }
        debug!(unique = tally.unique, records = tally.records, "done");
        Ok(tally)
    }

    /// IPv6 needs a 128-bit key space, which a bitset can't cover.
    pub fn unique_ipv6(&self, _cancel: &CancelToken, _path: impl AsRef<Path>) -> Result<u64> {
        Err(Error::Unsupported("ipv6"))
    }
}
