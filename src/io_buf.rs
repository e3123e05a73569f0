//! Byte I/O & buffers (spec §4.1)
//!
//! Thin pull/push streams over a file handle, plus little-endian fixed-width
//! readers/writers and reusable scratch buffers. Wraps `BufReader<File>`/
//! `BufWriter<File>` in a named type so the record codec and planner don't
//! each hand-roll `read_exact`/seek dances.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Pull-style byte stream over a file handle.
pub struct InputStream {
    inner: BufReader<File>,
    path: String,
}

impl InputStream {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let file = File::open(&path).map_err(|e| Error::from(e).with_path(path_str.clone()))?;
        Ok(Self {
            inner: BufReader::new(file),
            path: path_str,
        })
    }

    pub fn len(&mut self) -> Result<u64> {
        let cur = self.tell()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(cur))?;
        Ok(end)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::from(e).with_path(self.path.clone()))?;
        Ok(())
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Truncated(format!("expected {} bytes at format boundary", n))
            } else {
                Error::from(e).with_path(self.path.clone())
            }
        })?;
        Ok(buf)
    }

    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::Truncated(format!("expected {} bytes at format boundary", buf.len()))
            } else {
                Error::from(e).with_path(self.path.clone())
            }
        })
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_into(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn inner_mut(&mut self) -> &mut BufReader<File> {
        &mut self.inner
    }
}

/// Push-style byte stream over a file handle.
pub struct OutputStream {
    inner: BufWriter<File>,
    path: String,
}

impl OutputStream {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::from(e).with_path(path_str.clone()))?;
        Ok(Self {
            inner: BufWriter::new(file),
            path: path_str,
        })
    }

    /// Wraps an already-open file (e.g. a `tempfile::NamedTempFile` handle)
    /// for writing, tagging errors with `path` for context.
    pub fn from_file(file: File, path: impl Into<String>) -> Self {
        Self {
            inner: BufWriter::new(file),
            path: path.into(),
        }
    }

    pub fn tell(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .map_err(|e| Error::from(e).with_path(self.path.clone()))?;
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write(&v.to_le_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flushes buffered writes and fsyncs the underlying file.
    pub fn sync(&mut self) -> Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_all()?;
        Ok(())
    }

    pub fn get_mut(&mut self) -> &mut BufWriter<File> {
        &mut self.inner
    }
}

/// A reusable scratch buffer that only ever grows (doubling), so a
/// compressor and a CRC consumer can each hold one without churning the
/// allocator per entry.
#[derive(Default)]
pub struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns a mutable slice of at least `min_size` bytes, growing (by
    /// doubling) if the current buffer is smaller.
    pub fn get(&mut self, min_size: usize) -> &mut [u8] {
        if self.buf.len() < min_size {
            let mut new_len = self.buf.len().max(1);
            while new_len < min_size {
                new_len *= 2;
            }
            self.buf.resize(new_len, 0);
        }
        &mut self.buf[..min_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn scratch_grows_by_doubling_and_never_shrinks() {
        let mut s = Scratch::new();
        assert_eq!(s.get(10).len(), 10);
        let cap_after_10 = s.buf.len();
        assert!(cap_after_10 >= 10);
        assert_eq!(s.get(5).len(), 5);
        assert_eq!(s.buf.len(), cap_after_10, "must not shrink on smaller request");
        assert_eq!(s.get(cap_after_10 * 3).len(), cap_after_10 * 3);
    }

    #[test]
    fn read_exact_short_is_truncated_not_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            f.write_all(&[1, 2, 3]).unwrap();
        }
        let mut input = InputStream::open(&path).unwrap();
        let err = input.read_exact(10).unwrap_err();
        assert!(matches!(err, Error::Truncated(_)));
    }

    #[test]
    fn le_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("le.bin");
        {
            let mut out = OutputStream::create(&path).unwrap();
            out.write_u16(0xABCD).unwrap();
            out.write_u32(0xDEADBEEF).unwrap();
            out.write_u64(0x0102030405060708).unwrap();
            out.flush().unwrap();
        }
        let mut input = InputStream::open(&path).unwrap();
        assert_eq!(input.read_u16().unwrap(), 0xABCD);
        assert_eq!(input.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(input.read_u64().unwrap(), 0x0102030405060708);
    }
}
