//! Single reader over the whole input.

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::Result;
use crate::records::{RecordSplitter, Tally};
use crate::source::{Source, SourceCursor};
use crate::store::DedupStore;
use std::io::{BufRead, BufReader};

/// Streams `source` start to end through one buffer and feeds every valid
/// address into `store`. A final record without a separator still counts.
/// Fails with [`Error::Config`](crate::Error::Config) before reading when
/// `config` is invalid.
pub fn count<S: Source + ?Sized>(
    source: &S,
    config: &Config,
    store: &mut dyn DedupStore<u32>,
    cancel: &CancelToken,
) -> Result<Tally> {
    config.validate()?;
    let mut reader = BufReader::with_capacity(config.block_size, SourceCursor::new(source));
    let mut splitter = RecordSplitter::new(config.separator);

    loop {
        cancel.check()?;
        let offset = reader.get_ref().position();
        let n = config
            .retry
            .run(cancel, offset, || reader.fill_buf().map(|buf| buf.len()))?;
        if n == 0 {
            break;
        }
        splitter.feed(reader.buffer(), |key| store.insert(key));
        reader.consume(n);
    }

    let mut tally = splitter.finish(|key| store.insert(key));
    tally.unique = store.finish();
    Ok(tally)
}
