//! One reader thread per partition, feeding a single consumer.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::records::{align_to_separator, RecordSplitter, Tally};
use crate::source::Source;
use crate::store::DedupStore;
use crossbeam::channel::{self, Sender};
use crossbeam::thread;
use std::mem;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

/// Reads every partition on its own thread. Workers only parse; the calling
/// thread owns `store` and drains their key batches into it.
///
/// The first worker error cancels the rest and is returned once every
/// worker has stopped. An invalid `config` fails before any thread starts.
pub fn count<S: Source + ?Sized>(
    source: &S,
    ends: &[u64],
    config: &Config,
    store: &mut dyn DedupStore<u32>,
    cancel: &CancelToken,
) -> Result<Tally> {
    config.validate()?;
    let group = cancel.child();
    let first_error = OnceLock::new();
    let (tx, rx) = channel::bounded::<Vec<u32>>(config.queue_capacity);

    let joined = thread::scope(|s| {
        let handles: Vec<_> = partitions(ends)
            .map(|range| {
                let tx = tx.clone();
                let worker = Worker {
                    source,
                    config,
                    cancel: &group,
                    range,
                };
                let group = &group;
                let first_error = &first_error;
                s.spawn(move |_| match worker.run(&tx) {
                    Ok(tally) => Some(tally),
                    Err(e) => {
                        debug!(range = ?worker.range, error = %e, "worker stopped");
                        let _ = first_error.set(e);
                        group.cancel();
                        None
                    }
                })
            })
            .collect();
        drop(tx);

        for batch in rx.iter() {
            store.extend(&batch);
        }

        let mut tally = Tally::default();
        let mut panicked = false;
        for handle in handles {
            match handle.join() {
                Ok(Some(t)) => tally.merge(&t),
                Ok(None) => {}
                Err(_) => panicked = true,
            }
        }
        (tally, panicked)
    });

    if let Some(e) = first_error.into_inner() {
        return Err(e);
    }
    let (mut tally, panicked) = joined.map_err(|_| Error::WorkerPanicked)?;
    if panicked {
        return Err(Error::WorkerPanicked);
    }
    tally.unique = store.finish();
    Ok(tally)
}

/// `0..ends[0]`, `ends[0]..ends[1]`, ...
fn partitions(ends: &[u64]) -> impl Iterator<Item = Range<u64>> + '_ {
    ends.iter().scan(0, |start, &end| {
        let range = *start..end;
        *start = end;
        Some(range)
    })
}

struct Worker<'a, S: ?Sized> {
    source: &'a S,
    config: &'a Config,
    cancel: &'a CancelToken,
    range: Range<u64>,
}

impl<S: Source + ?Sized> Worker<'_, S> {
    fn run(&self, tx: &Sender<Vec<u32>>) -> Result<Tally> {
        let Config {
            separator,
            block_size,
            batch_size,
            ref retry,
            ..
        } = *self.config;
        let end = self.range.end;
        let mut pos = self.range.start;
        let mut buf = vec![0u8; (end - pos).min(block_size as u64) as usize];
        let mut splitter = RecordSplitter::new(separator);
        let mut batch = Vec::with_capacity(batch_size);

        while pos < end {
            self.cancel.check()?;
            let want = (end - pos).min(buf.len() as u64) as usize;
            let n = retry.run(self.cancel, pos, || self.source.read_at(&mut buf[..want], pos))?;
            if n == 0 {
                break;
            }
            // Stop this block at its last separator unless it reaches the end
            // of the range; the cut-off tail is read again with the next block.
            let mut take = n;
            if pos + (n as u64) < end {
                if let Some(aligned) = align_to_separator(&buf[..n], separator) {
                    take = aligned;
                }
            }
            splitter.feed(&buf[..take], |key| batch.push(key));
            pos += take as u64;

            if batch.len() >= batch_size {
                let full = mem::replace(&mut batch, Vec::with_capacity(batch_size));
                tx.send(full).map_err(|_| Error::Cancelled)?;
            }
        }

        let tally = splitter.finish(|key| batch.push(key));
        if !batch.is_empty() {
            tx.send(batch).map_err(|_| Error::Cancelled)?;
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition;
    use crate::retry::RetryPolicy;
    use crate::store::BitsetStore;

    fn run(data: &[u8], workers: usize, config: &Config) -> Result<Tally> {
        let token = CancelToken::new();
        let ends = partition::plan(
            data,
            data.len() as u64,
            config.separator,
            workers,
            &config.retry,
            &token,
        )?;
        let mut store = BitsetStore::new();
        count(data, &ends, config, &mut store, &token)
    }

    fn run_plan(data: &[u8], workers: usize, token: &CancelToken) -> Vec<u64> {
        let retry = RetryPolicy::none();
        partition::plan(data, data.len() as u64, b'\n', workers, &retry, token).unwrap()
    }

    fn small_blocks() -> Config {
        Config::default()
            .with_block_size(32)
            .with_batch_size(3)
            .with_queue_capacity(2)
            .with_retry(RetryPolicy::none())
    }

    #[test]
    fn partition_ranges() {
        let ranges: Vec<_> = partitions(&[5, 9, 20]).collect();
        assert_eq!(ranges, vec![0..5, 5..9, 9..20]);
        assert_eq!(partitions(&[]).count(), 0);
    }

    #[test]
    fn counts_across_workers() {
        let mut data = Vec::new();
        for i in 0..2_000u32 {
            data.extend_from_slice(format!("10.0.{}.{}\n", (i / 256) % 4, i % 256).as_bytes());
        }
        for workers in [1, 2, 3, 7, 16] {
            let tally = run(&data, workers, &small_blocks()).unwrap();
            assert_eq!(tally.unique, 1024, "{workers} workers");
            assert_eq!(tally.records, 2_000);
        }
    }

    #[test]
    fn last_record_without_separator() {
        let data = b"192.168.1.1\n10.0.0.1\n172.16.0.1\n8.8.8.8\n1.2.3.4";
        let tally = run(data, 3, &small_blocks()).unwrap();
        assert_eq!(tally.unique, 5);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let data = b"192.168.1.1\ninvalid_ip\n10.0.0.1\n192.168.1.1\n  10.0.0.1  \n";
        let tally = run(data, 2, &small_blocks()).unwrap();
        assert_eq!(tally.unique, 2);
        assert_eq!(tally.malformed, 1);
    }

    #[test]
    fn empty_input() {
        let tally = run(b"", 4, &small_blocks()).unwrap();
        assert_eq!(tally, Tally::default());
    }

    #[test]
    fn invalid_config_starts_no_workers() {
        let config = small_blocks().with_queue_capacity(0);
        let err = run(b"1.1.1.1\n2.2.2.2\n", 2, &config).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn cancelled_before_start_returns_error() {
        let data = b"1.1.1.1\n2.2.2.2\n".repeat(100);
        let token = CancelToken::new();
        let ends = run_plan(&data, 4, &token);
        token.cancel();
        let mut store = BitsetStore::new();
        let err = count(&data[..], &ends, &small_blocks(), &mut store, &token).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
