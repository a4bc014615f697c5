use std::{fmt::Display, sync::Arc};

use parking_lot::Mutex;
use skipdb_skiplist::SkipList;

use crate::{
    error::Result,
    fs::{FileSystem, NativeFileSystem},
    options::DBOptions,
};

mod persist;

pub use persist::LoadReport;

/// An ordered key-value store held in a skip list, with a plain-text dump
/// file for persistence.
pub struct SkipDB<K, V, FS = NativeFileSystem> {
    list: SkipList<K, V>,
    fs: FS,
    options: Arc<DBOptions>,

    /// Serializes dump and load against each other.
    file_lock: Mutex<()>,
}

impl<K: Ord, V> SkipDB<K, V, NativeFileSystem> {
    pub fn open(options: Arc<DBOptions>) -> Self {
        Self::open_with_fs(options, NativeFileSystem)
    }
}

impl<K, V, FS> SkipDB<K, V, FS>
where
    K: Ord,
    FS: FileSystem,
{
    pub fn open_with_fs(options: Arc<DBOptions>, fs: FS) -> Self {
        let list = match options.seed {
            Some(seed) => SkipList::with_seed(options.max_level, seed),
            None => SkipList::new(options.max_level),
        };

        tracing::info!(
            max_level = options.max_level,
            dump_path = %options.dump_path.display(),
            "DB opened"
        );

        Self {
            list,
            fs,
            options,
            file_lock: Mutex::new(()),
        }
    }

    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.list.insert(key, value)?;
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.list.get(key).map(|value| V::clone(&value))
    }

    /// Replaces the value of an existing key and returns the old one.
    pub fn update(&self, key: &K, value: V) -> Result<V> {
        Ok(self.list.update(key, value)?)
    }

    pub fn delete(&self, key: &K) -> Result<V> {
        Ok(self.list.remove(key)?)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.list.contains_key(key)
    }
}

impl<K, V, FS> SkipDB<K, V, FS> {
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn level(&self) -> usize {
        self.list.level()
    }

    pub fn list(&self) -> &SkipList<K, V> {
        &self.list
    }

    pub fn options(&self) -> &Arc<DBOptions> {
        &self.options
    }

    /// Every level from 0 up to the current height, one line each.
    pub fn display(&self) -> String
    where
        K: Display,
        V: Display,
    {
        self.list.to_string()
    }
}
