use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::RwLock;

use crate::traits::{File, FileSystem};

#[derive(Debug, Default)]
struct Inode {
    data: RwLock<Vec<u8>>,
    locked: AtomicBool,
}

/// A flat, in-memory file system. Paths are compared as given, there are
/// no directories.
#[derive(Debug, Default, Clone)]
pub struct MemFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, Arc<Inode>>>>,
}

pub struct MemFile {
    inode: Arc<Inode>,
    pos: usize,
}

impl File for MemFile {
    fn read_to_end(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let data = self.inode.data.read();

        let start = self.pos.min(data.len());
        buf.extend_from_slice(&data[start..]);
        self.pos = data.len();
        Ok(data.len() - start)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.inode.data.write();

        let end = self.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.inode.data.read().len() as u64)
    }

    fn is_empty(&self) -> bool {
        self.inode.data.read().is_empty()
    }

    fn set_len(&self, size: u64) -> io::Result<()> {
        let size = usize::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "File too large"))?;
        self.inode.data.write().resize(size, 0);
        Ok(())
    }

    fn lock(&self) -> io::Result<()> {
        if self
            .inode
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "File already locked",
            ))
        } else {
            Ok(())
        }
    }

    fn unlock(&self) -> io::Result<()> {
        self.inode.locked.store(false, Ordering::Release);
        Ok(())
    }
}

impl FileSystem for MemFileSystem {
    type File = MemFile;

    fn create<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        let path = checked_path(path.as_ref())?;
        let mut files = self.files.write();

        let inode = files.entry(path.to_path_buf()).or_default().clone();
        inode.data.write().clear();
        Ok(MemFile { inode, pos: 0 })
    }

    fn open<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        let path = checked_path(path.as_ref())?;

        match self.files.read().get(path) {
            Some(inode) => Ok(MemFile {
                inode: inode.clone(),
                pos: 0,
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
        }
    }

    fn open_write<P: AsRef<Path>>(&self, path: P) -> io::Result<Self::File> {
        let path = checked_path(path.as_ref())?;
        let inode = self.files.write().entry(path.to_path_buf()).or_default().clone();
        Ok(MemFile { inode, pos: 0 })
    }

    fn remove<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = checked_path(path.as_ref())?;

        match self.files.write().remove(path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
        }
    }

    fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.read().contains_key(path.as_ref())
    }
}

fn checked_path(path: &Path) -> io::Result<&Path> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "Empty path"));
    }
    Ok(path)
}
