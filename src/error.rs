#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Engine(#[from] skipdb_skiplist::Error),

    #[error("Unparsable key at line {line}: {key:?}")]
    UnparsableKey { line: usize, key: String },

    #[error("Unparsable value at line {line}: {value:?}")]
    UnparsableValue { line: usize, value: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::Engine(skipdb_skiplist::Error::DuplicateKey))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Engine(skipdb_skiplist::Error::NotFound))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
