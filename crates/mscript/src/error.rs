use mscript_link::LinkError;
use std::path::PathBuf;
use thiserror::Error;

/// A malformed variable token inside a data package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("token too short: {len} characters, need at least 10")]
    TooShort { len: usize },
    #[error("invalid value field: {0:?}")]
    InvalidValue(String),
    #[error("unknown SI prefix: {0:?}")]
    UnknownPrefix(char),
    #[error("invalid metadata token: {0:?}")]
    InvalidMetadata(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed data package {line:?}: {source}")]
    Decode {
        line: String,
        #[source]
        source: DecodeError,
    },
    #[error("column {column} out of range, narrowest package has {width} values")]
    ColumnOutOfRange { column: usize, width: usize },
    #[error("curve {curve} out of range, result has {count} curves")]
    CurveOutOfRange { curve: usize, count: usize },
}

/// Failures of the transport session.
///
/// A read timeout is deliberately absent: it is reported as
/// [`LineRead::Timeout`](crate::LineRead::Timeout), not as an error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("communication error: {0}")]
    Communication(String),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("refusing to write non-ASCII text")]
    NonAscii,
    #[error("session is not connected")]
    NotConnected,
    #[error("session is in the error state; reconnect")]
    Faulted,
    #[error("a script is still running")]
    Busy,
    #[error("no response within the read timeout")]
    NoResponse,
    #[error("reading script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}
