//! Errors raised while setting up a binary

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid logging setup (bad filter, subscriber already set)
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}
