//! Checking and normalizing host names.
//!
//! Names given by users are checked and brought into a canonical form
//! before being used in queries. Names containing non-ASCII characters are
//! converted into their ASCII form via IDNA first.

use crate::base::name::DnameError;
use std::{error, fmt};

/// The maximum length of a name in presentation format.
const MAX_NAME_LEN: usize = 253;

/// The maximum length of a single label.
const MAX_LABEL_LEN: usize = 63;

//------------ normalize_name ------------------------------------------------

/// Checks a host name and returns its normalized form.
///
/// The normalized name is all lower case ASCII without a trailing dot. A
/// single trailing dot in `name` is accepted. The name must consist of
/// labels of one to 63 letters, digits, hyphens, or underscores, separated
/// by dots. Labels must not start or end with a hyphen. The normalized
/// name must not be longer than 253 characters.
pub fn normalize_name(name: &str) -> Result<String, NameError> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let name = if name.is_ascii() {
        name.to_ascii_lowercase()
    } else {
        idna::domain_to_ascii(name)
            .map_err(|_| NameError::new("IDNA conversion failed"))?
    };
    check_name(&name)?;
    Ok(name)
}

/// Returns whether `name` is a valid host name.
pub fn is_valid_name(name: &str) -> bool {
    normalize_name(name).is_ok()
}

/// Checks the syntax of a normalized name.
fn check_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::new("empty name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::new("name too long"));
    }
    for label in name.split('.') {
        check_label(label)?;
    }
    Ok(())
}

/// Checks a single label.
fn check_label(label: &str) -> Result<(), NameError> {
    if label.is_empty() {
        return Err(NameError::new("empty label"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(NameError::new("label too long"));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(NameError::new("label starts or ends with hyphen"));
    }
    let ok = label.bytes().all(|ch| {
        ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == b'-' || ch == b'_'
    });
    if !ok {
        return Err(NameError::new("illegal character in label"));
    }
    Ok(())
}

//------------ NameError -----------------------------------------------------

/// A host name was not acceptable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NameError(&'static str);

impl NameError {
    /// Creates a new error with the given diagnostic message.
    fn new(msg: &'static str) -> Self {
        NameError(msg)
    }
}

impl From<DnameError> for NameError {
    fn from(_: DnameError) -> Self {
        NameError("malformed domain name")
    }
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid name: {}", self.0)
    }
}

impl error::Error for NameError {}

//============ Testing =======================================================
