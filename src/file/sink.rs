use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// A seekable byte sink the file writer appends to
///
/// Writes are strictly sequential; `position` only ever grows. The file
/// writer samples it to record page and chunk offsets for the footer.
pub trait PositionedByteSink {
    /// Append `bytes` to the sink
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Bytes written since the sink was created
    fn position(&self) -> u64;

    /// Flush and release the sink; called once by the file writer
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory sink, mostly for tests and buffering callers
impl PositionedByteSink for Vec<u8> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.len() as u64
    }
}

/// Adapter giving any [`Write`] a byte-counted position
#[derive(Debug)]
pub struct TrackedSink<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> TrackedSink<W> {
    /// Wrap a writer, starting the position at zero
    pub fn new(inner: W) -> Self {
        TrackedSink { inner, position: 0 }
    }

    /// The wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap, discarding the position counter
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl TrackedSink<BufWriter<File>> {
    /// Create a buffered file sink at `path`, truncating any existing file
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(TrackedSink::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> PositionedByteSink for TrackedSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
