//! File systems a [`SkipDB`](crate::SkipDB) can dump to and load from.

pub use skipdb_fs::{File, FileSystem, MemFile, MemFileSystem, NativeFile, NativeFileSystem};
