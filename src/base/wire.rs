//! Creating and consuming data in wire format.

use core::fmt;
use octseq::parse::ShortInput;

pub use octseq::parse::Parser;

//------------ parse functions -----------------------------------------------

/// Takes a big endian `u16` from the beginning of the parser.
pub fn parse_u16(parser: &mut Parser<'_, [u8]>) -> Result<u16, ParseError> {
    let mut buf = [0u8; 2];
    parser.parse_buf(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Takes a big endian `u32` from the beginning of the parser.
pub fn parse_u32(parser: &mut Parser<'_, [u8]>) -> Result<u32, ParseError> {
    let mut buf = [0u8; 4];
    parser.parse_buf(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Takes `len` octets from the beginning of the parser into a vec.
pub fn parse_vec(
    parser: &mut Parser<'_, [u8]>,
    len: usize,
) -> Result<Vec<u8>, ParseError> {
    let mut res = vec![0; len];
    parser.parse_buf(&mut res)?;
    Ok(res)
}

//------------ compose functions ---------------------------------------------

/// Appends data prefixed by its length as a `u16`.
///
/// # Panics
///
/// The function panics if the length of the composed data is greater than
/// 0xFFFF.
pub fn compose_len_prefixed<F>(target: &mut Vec<u8>, op: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    target.extend_from_slice(&[0; 2]);
    let pos = target.len();
    op(target);
    let len = u16::try_from(target.len() - pos).expect("long data");
    target[pos - 2..pos].copy_from_slice(&len.to_be_bytes());
}

//============ Error Types ===================================================

//------------ ParseError ----------------------------------------------------

/// An error happened while parsing data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// An attempt was made to go beyond the end of the parser.
    ShortInput,

    /// A formatting error occurred.
    Form(FormError),
}

impl ParseError {
    /// Creates a new parse error as a form error with the given message.
    pub fn form_error(msg: &'static str) -> Self {
        FormError::new(msg).into()
    }
}

//--- From

impl From<ShortInput> for ParseError {
    fn from(_: ShortInput) -> Self {
        ParseError::ShortInput
    }
}

impl From<FormError> for ParseError {
    fn from(err: FormError) -> Self {
        ParseError::Form(err)
    }
}

//--- Display and Error

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::ShortInput => f.write_str("unexpected end of input"),
            ParseError::Form(ref err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ParseError {}

//------------ FormError -----------------------------------------------------

/// A formatting error occured.
///
/// This is a generic error for all kinds of error cases that result in data
/// not being accepted. For diagnostics, the error is being given a static
/// string describing the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormError(&'static str);

impl FormError {
    /// Creates a new form error value with the given diagnostics string.
    pub fn new(msg: &'static str) -> Self {
        FormError(msg)
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for FormError {}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_integers() {
        let data = [0x12u8, 0x34, 0xde, 0xad, 0xbe, 0xef, 0x01];
        let mut parser = Parser::from_ref(&data[..]);
        assert_eq!(parse_u16(&mut parser), Ok(0x1234));
        assert_eq!(parse_u32(&mut parser), Ok(0xdead_beef));
        assert_eq!(parse_u16(&mut parser), Err(ParseError::ShortInput));
    }

    #[test]
    fn len_prefixed() {
        let mut target = vec![0xff];
        compose_len_prefixed(&mut target, |t| t.extend_from_slice(b"abc"));
        assert_eq!(target, b"\xff\x00\x03abc");
    }
}
