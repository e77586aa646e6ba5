use common::message::{ErrorKind, ErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("batch doesn't exist: {0}")]
    BatchNotFound(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("cannot open database: {0}")]
    Connection(#[from] diesel::ConnectionError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::BatchNotFound(_) => ErrorKind::BatchNotFound,
            LedgerError::Database(_) | LedgerError::Connection(_) => ErrorKind::Database,
        }
    }
}

impl From<&LedgerError> for ErrorResponse {
    fn from(err: &LedgerError) -> Self {
        let mut trace = Vec::new();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }

        ErrorResponse {
            kind: err.kind(),
            message: err.to_string(),
            trace,
        }
    }
}
