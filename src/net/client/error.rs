//! Error type for client transports.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::base::wire::ParseError;
use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::Arc;

//------------ Error ---------------------------------------------------------

/// The outcome of a failed query on a message transport.
///
/// Values of this type are cloned to every caller affected by a failure of
/// the shared connection, which is why I/O errors are kept behind an arc.
#[derive(Clone, Debug)]
pub enum Error {
    /// No matching response arrived before the query’s deadline.
    Timeout,

    /// The caller’s cancellation token fired.
    Cancelled,

    /// The transport was closed while the query was outstanding or queued.
    ConnectionClosed,

    /// Sending or receiving over the underlying connection failed.
    Transport(TransportError),
}

impl Error {
    /// Returns whether this error was caused by a failed connection.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::ConnectionClosed)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::Timeout => write!(f, "timeout waiting for response"),
            Error::Cancelled => write!(f, "query cancelled"),
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::Transport(err) => write!(f, "resolution failed: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Timeout => None,
            Error::Cancelled => None,
            Error::ConnectionClosed => None,
            Error::Transport(e) => Some(e),
        }
    }
}

//------------ TransportError ------------------------------------------------

/// A failure of the connection underneath a message transport.
#[derive(Clone, Debug)]
pub enum TransportError {
    /// Establishing the connection gave an error.
    Connect(Arc<io::Error>),

    /// Reading from the connection gave an error.
    Read(Arc<io::Error>),

    /// Writing to the connection gave an error.
    Write(Arc<io::Error>),

    /// A datagram was only partially sent.
    ShortSend,

    /// The peer closed the connection.
    UnexpectedEndOfData,

    /// A received message could not be parsed.
    Parse(ParseError),
}

impl From<ParseError> for TransportError {
    fn from(err: ParseError) -> Self {
        TransportError::Parse(err)
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            TransportError::Connect(_) => write!(f, "error connecting"),
            TransportError::Read(_) => write!(f, "error reading"),
            TransportError::Write(_) => write!(f, "error writing"),
            TransportError::ShortSend => write!(f, "partial send"),
            TransportError::UnexpectedEndOfData => {
                write!(f, "unexpected end of data")
            }
            TransportError::Parse(_) => write!(f, "malformed message"),
        }
    }
}

impl error::Error for TransportError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            TransportError::Connect(e) => Some(e),
            TransportError::Read(e) => Some(e),
            TransportError::Write(e) => Some(e),
            TransportError::ShortSend => None,
            TransportError::UnexpectedEndOfData => None,
            TransportError::Parse(e) => Some(e),
        }
    }
}

//============ Tests =========================================================
