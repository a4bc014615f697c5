use std::{
    io::{self, Read, Write},
    path::Path,
};

use crate::traits::{File, FileSystem};

pub type NativeFile = std::fs::File;

impl File for NativeFile {
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        Read::read_to_end(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    /// Nothing to do here, the file is closed when it goes out of scope
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn set_len(&self, size: u64) -> io::Result<()> {
        std::fs::File::set_len(self, size)
    }

    fn lock(&self) -> io::Result<()> {
        fs2::FileExt::try_lock_exclusive(self)
    }

    fn unlock(&self) -> io::Result<()> {
        fs2::FileExt::unlock(self)
    }
}

#[derive(Debug, Default, Clone)]
pub struct NativeFileSystem;

impl FileSystem for NativeFileSystem {
    type File = NativeFile;

    fn create<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    fn open<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        std::fs::OpenOptions::new().read(true).open(path)
    }

    fn open_write<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    }

    fn remove<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref().exists()
    }
}
