use std::{path::PathBuf, sync::Arc};

use crate::{
    SkipDB,
    error::{Error, Result},
    fs::FileSystem,
    format::DEFAULT_DELIMITER,
};

#[derive(Debug)]
pub struct DBOptions {
    pub(crate) max_level: usize,

    pub(crate) delimiter: String,

    pub(crate) dump_path: PathBuf,

    pub(crate) seed: Option<u64>,
}

impl DBOptions {
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn dump_path(&self) -> &PathBuf {
        &self.dump_path
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[derive(Debug, Clone)]
pub struct DBOpenOptions {
    max_level: usize,

    delimiter: String,

    dump_path: PathBuf,

    seed: Option<u64>,
}

impl Default for DBOpenOptions {
    fn default() -> Self {
        Self {
            max_level: 6,
            delimiter: DEFAULT_DELIMITER.to_string(),
            dump_path: PathBuf::from("./dumpFile"),
            seed: None,
        }
    }
}

impl DBOpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ceiling on the index height
    pub fn max_level(&mut self, max_level: usize) -> &mut Self {
        self.max_level = max_level;
        self
    }

    /// Separator between key and value in dump files
    pub fn delimiter(&mut self, delimiter: impl Into<String>) -> &mut Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Default target of `dump` and source of `load`
    pub fn dump_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.dump_path = path.into();
        self
    }

    /// Seeds the level generator, for reproducible layouts
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(&self) -> Result<Arc<DBOptions>> {
        if self.max_level == 0 {
            return Err(Error::InvalidOptions(
                "max_level must be greater than 0".to_string(),
            ));
        }
        if self.delimiter.is_empty() {
            return Err(Error::InvalidOptions(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.delimiter.contains(['\n', '\r']) {
            return Err(Error::InvalidOptions(
                "delimiter must not contain line breaks".to_string(),
            ));
        }

        let opts = DBOptions {
            max_level: self.max_level,
            delimiter: self.delimiter.clone(),
            dump_path: self.dump_path.clone(),
            seed: self.seed,
        };
        Ok(Arc::new(opts))
    }

    pub fn open<K: Ord, V>(&self) -> Result<SkipDB<K, V>> {
        Ok(SkipDB::open(self.build()?))
    }

    pub fn open_with_fs<K, V, FS>(&self, fs: FS) -> Result<SkipDB<K, V, FS>>
    where
        K: Ord,
        FS: FileSystem,
    {
        Ok(SkipDB::open_with_fs(self.build()?, fs))
    }
}
