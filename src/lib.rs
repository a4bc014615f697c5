mod db;

pub mod error;
pub mod format;
pub mod fs;
pub mod options;

#[cfg(test)]
mod test_utils;

pub use db::{LoadReport, SkipDB};
pub use skipdb_skiplist::{LevelGenerator, RandomLevel, ReadView, SkipList};
