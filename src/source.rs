//! The file-like input the counter reads from.

use std::fs::File;
use std::io::{self, Read};

/// Size inquiry plus positioned reads. Positioned reads at different offsets
/// must not interfere with each other, so one handle can serve every worker.
pub trait Source: Sync {
    fn size(&self) -> io::Result<u64>;

    /// Reads into `buf` starting at `offset`. Returns `Ok(0)` at end of input;
    /// short reads are allowed.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl Source for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }
}

impl Source for [u8] {
    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.len());
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

impl Source for Vec<u8> {
    fn size(&self) -> io::Result<u64> {
        self.as_slice().size()
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn size(&self) -> io::Result<u64> {
        (**self).size()
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

/// Sequential [`Read`] over a [`Source`], starting at offset 0.
pub struct SourceCursor<'a, S: ?Sized> {
    source: &'a S,
    pos: u64,
}

impl<'a, S: Source + ?Sized> SourceCursor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        SourceCursor { source, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }
}

impl<S: Source + ?Sized> Read for SourceCursor<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read_at(buf, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}
