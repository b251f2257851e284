//! Error type for the stub resolver.

use super::name::NameError;
use crate::net::client;
use std::error;
use std::fmt::{Display, Formatter};

/// A resolver operation failed.
#[derive(Clone, Debug)]
pub enum Error {
    /// The name to resolve was not acceptable.
    InvalidName(NameError),

    /// The resolver has no servers configured.
    NoServers,

    /// Querying the servers failed.
    Query(client::Error),
}

impl From<NameError> for Error {
    fn from(err: NameError) -> Self {
        Error::InvalidName(err)
    }
}

impl From<client::Error> for Error {
    fn from(err: client::Error) -> Self {
        Error::Query(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::InvalidName(err) => err.fmt(f),
            Error::NoServers => write!(f, "no servers configured"),
            Error::Query(err) => err.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::InvalidName(err) => Some(err),
            Error::NoServers => None,
            Error::Query(err) => Some(err),
        }
    }
}
