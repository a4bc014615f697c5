use std::{io, path::Path};

/// A dump target or source.
pub trait File: Send + Sync {
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    ));
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;

    fn len(&self) -> io::Result<u64>;

    /// Truncates or extends the file. The cursor is left where it is.
    fn set_len(&self, size: u64) -> io::Result<()>;

    fn is_empty(&self) -> bool {
        self.len().map(|len| len == 0).unwrap_or(false)
    }

    /// Exclusive advisory lock, fails instead of blocking.
    fn lock(&self) -> io::Result<()>;

    fn unlock(&self) -> io::Result<()>;
}

pub trait FileSystem: Send + Sync {
    type File: File;

    /// Creates the file, truncating it if it already exists.
    fn create<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File>;

    fn open<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File>;

    /// Opens the file for writing, creating it if missing. Existing content
    /// is kept.
    fn open_write<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File>;

    fn remove<P: AsRef<Path>>(&self, path: P) -> io::Result<()>;

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool;
}
