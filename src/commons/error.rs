//! The errors that end a run.
//!
//! Per-record failures are not errors in this sense; they are collected in
//! the batch report and the run carries on. Everything here either stops
//! the run before it talks to the registry or summarizes a batch that did
//! not fully go through.

use std::{fmt, io};

use crate::api::roa::ValidationError;
use crate::cli::report::ReportError;
use crate::commons::crypto::KeyError;
use crate::commons::httpclient;


//------------ Error ---------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    /// A required credential or flag is missing or inconsistent.
    Config(String),

    /// The production confirmation gate was not satisfied.
    GateDeclined,

    /// The signing key could not be loaded or used.
    KeyLoad(KeyError),

    /// A request outside the per-record loop failed.
    HttpClient(httpclient::Error),

    /// An input record is invalid and the abort policy is active.
    InvalidRecord { line: usize, error: ValidationError },

    Report(ReportError),

    Io(io::Error),

    /// One or more records in the batch did not go through.
    BatchIncomplete { failed: usize, total: usize },
}

impl Error {
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(msg) => msg.fmt(f),
            Error::GateDeclined => {
                write!(f, "production registry not confirmed, aborting")
            }
            Error::KeyLoad(err) => err.fmt(f),
            Error::HttpClient(err) => err.fmt(f),
            Error::InvalidRecord { line, error } => {
                write!(f, "invalid record on line {}: {}", line, error)
            }
            Error::Report(err) => err.fmt(f),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::BatchIncomplete { failed, total } => {
                write!(f, "{} of {} records failed", failed, total)
            }
        }
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::KeyLoad(err)
    }
}

impl From<httpclient::Error> for Error {
    fn from(err: httpclient::Error) -> Self {
        Error::HttpClient(err)
    }
}

impl From<ReportError> for Error {
    fn from(err: ReportError) -> Self {
        Error::Report(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
