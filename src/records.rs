//! Splits a byte stream into records and turns each into a key.

use crate::addr::{parse_ipv4, MAX_RECORD_LEN};
use tracing::trace;

/// Records seen by one reader.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Distinct addresses. Only filled in once the store is finished.
    pub unique: u64,
    /// Non-blank records.
    pub records: u64,
    /// Records that weren't a valid address and were skipped.
    pub malformed: u64,
}

impl Tally {
    pub fn merge(&mut self, other: &Tally) {
        self.unique += other.unique;
        self.records += other.records;
        self.malformed += other.malformed;
    }
}

/// Carries at most one record of scratch between calls to [`feed`], so a
/// record may straddle any number of reads.
///
/// Whitespace before and after an address is dropped. Whitespace inside
/// one, or more bytes than any address can have, spoils the record; the
/// rest of it is skipped up to the next separator.
///
/// [`feed`]: RecordSplitter::feed
pub struct RecordSplitter {
    separator: u8,
    scratch: [u8; MAX_RECORD_LEN],
    len: usize,
    gap: bool,
    spoiled: bool,
    tally: Tally,
}

impl RecordSplitter {
    pub fn new(separator: u8) -> Self {
        RecordSplitter {
            separator,
            scratch: [0; MAX_RECORD_LEN],
            len: 0,
            gap: false,
            spoiled: false,
            tally: Tally::default(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8], mut emit: impl FnMut(u32)) {
        for &b in bytes {
            if b == self.separator {
                self.flush(&mut emit);
            } else if b.is_ascii_whitespace() {
                self.gap = self.len > 0;
            } else if self.spoiled {
                continue;
            } else if self.gap || self.len == MAX_RECORD_LEN {
                self.spoiled = true;
            } else {
                self.scratch[self.len] = b;
                self.len += 1;
            }
        }
    }

    /// Emits a final record that had no trailing separator.
    pub fn finish(mut self, mut emit: impl FnMut(u32)) -> Tally {
        self.flush(&mut emit);
        self.tally
    }

    fn flush(&mut self, emit: &mut impl FnMut(u32)) {
        if self.len > 0 {
            self.tally.records += 1;
            if self.spoiled {
                self.tally.malformed += 1;
            } else {
                match parse_ipv4(&self.scratch[..self.len]) {
                    Ok(key) => emit(key),
                    Err(e) => {
                        trace!(error = %e, "skipping record");
                        self.tally.malformed += 1;
                    }
                }
            }
        }
        self.len = 0;
        self.gap = false;
        self.spoiled = false;
    }
}

/// Length of the prefix of `buf` that ends right after its last separator,
/// or `None` if `buf` holds no separator.
pub fn align_to_separator(buf: &[u8], separator: u8) -> Option<usize> {
    buf.iter().rposition(|&b| b == separator).map(|i| i + 1)
}
