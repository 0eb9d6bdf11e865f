//! Splits the input into separator-aligned byte ranges, one per worker.

use crate::addr::LOOKAHEAD;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::records::align_to_separator;
use crate::retry::RetryPolicy;
use crate::source::Source;
use tracing::debug;

/// Read size for the forward search past a window without a separator.
pub const SCAN_BLOCK: usize = 64 * 1024;

/// Returns the end offset of each partition; partition `i` covers
/// `ends[i-1]..ends[i]`, the first one starting at 0.
///
/// Ends increase strictly, the last one is `size`, and every other end sits
/// just past a separator. Candidate boundaries are placed every
/// `size / workers` bytes and pulled back to the last separator in the
/// [`LOOKAHEAD`] window that follows them. Should that window hold no
/// separator the search reads forward in [`SCAN_BLOCK`] steps up to the
/// next one, or the end of the input, so no record is ever cut in two.
/// A search never starts behind the previous boundary, so the input is
/// scanned at most once however long its records are.
///
/// Candidates that land too close to the end, or behind a boundary already
/// placed, are dropped, so small inputs get fewer than `workers` partitions.
/// An empty input has no partitions.
pub fn plan<S: Source + ?Sized>(
    source: &S,
    size: u64,
    separator: u8,
    workers: usize,
    retry: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<Vec<u64>> {
    cancel.check()?;
    if size == 0 {
        return Ok(Vec::new());
    }
    let workers = (workers.max(1) as u64).min(size);
    let chunk = size / workers;

    let mut ends = Vec::with_capacity(workers as usize);
    let mut window = [0u8; LOOKAHEAD];
    let mut prev = 0;
    for i in 1..workers {
        cancel.check()?;
        let candidate = chunk * i;
        if candidate + LOOKAHEAD as u64 > size {
            break;
        }
        let from = candidate.max(prev);
        let end = next_boundary(source, size, from, separator, &mut window, retry, cancel)?;
        let Some(end) = end.filter(|&end| end < size) else {
            break;
        };
        if end > prev {
            ends.push(end);
            prev = end;
        }
    }
    ends.push(size);
    debug!(?ends, "planned partitions");
    Ok(ends)
}

/// First offset after `from` that directly follows a separator. The last
/// separator of the lookahead window wins; past the window, the first one.
fn next_boundary<S: Source + ?Sized>(
    source: &S,
    size: u64,
    from: u64,
    separator: u8,
    window: &mut [u8],
    retry: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<Option<u64>> {
    cancel.check()?;
    let n = retry.run(cancel, from, || source.read_at(window, from))?;
    if let Some(keep) = align_to_separator(&window[..n], separator) {
        return Ok(Some(from + keep as u64));
    }

    let mut from = from + n as u64;
    let mut block = vec![0u8; SCAN_BLOCK];
    while from < size {
        cancel.check()?;
        let n = retry.run(cancel, from, || source.read_at(&mut block, from))?;
        if n == 0 {
            break;
        }
        if let Some(i) = block[..n].iter().position(|&b| b == separator) {
            return Ok(Some(from + i as u64 + 1));
        }
        from += n as u64;
    }
    Ok(None)
}
