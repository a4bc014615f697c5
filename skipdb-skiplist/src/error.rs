#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("key already exists")]
    DuplicateKey,

    #[error("key not found")]
    NotFound,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
