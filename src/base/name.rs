//! Domain names.
//!
//! This module provides [`Dname`], an owned absolute domain name kept in
//! uncompressed wire format. Names can be created from their presentation
//! format via `FromStr`, parsed from DNS messages (following compression
//! pointers), and composed back into wire format.
//!
//! Domain names compare and hash ASCII case-insensitively as required by
//! [RFC 4343].
//!
//! [RFC 4343]: https://tools.ietf.org/html/rfc4343

use super::wire::{parse_vec, ParseError, Parser};
use bytes::Bytes;
use core::{cmp, fmt, hash, str};
use std::str::FromStr;

//------------ Module Configuration ------------------------------------------

/// The maximum length of a label.
const MAX_LABEL_LEN: usize = 63;

/// The maximum length of a domain name in wire format.
const MAX_NAME_LEN: usize = 255;

/// The maximum number of compression pointers followed for a single name.
///
/// A name has at most 127 labels, so any more pointers than that must be
/// a loop.
const MAX_COMPRESSION_POINTERS: usize = 127;

//------------ Dname ---------------------------------------------------------

/// An uncompressed, absolute domain name.
///
/// The name is kept as its wire format octets which always end in the
/// empty root label.
#[derive(Clone)]
pub struct Dname(Bytes);

/// # Creation
///
impl Dname {
    /// Returns the root name.
    pub fn root() -> Self {
        Dname(Bytes::from_static(b"\0"))
    }

    /// Creates a name from its uncompressed wire format.
    ///
    /// The octets must contain exactly one complete name.
    pub fn from_octets(octets: Bytes) -> Result<Self, DnameError> {
        let mut pos = 0;
        loop {
            let len = match octets.get(pos) {
                Some(len) => usize::from(*len),
                None => return Err(DnameError::ShortInput),
            };
            if len > MAX_LABEL_LEN {
                return Err(DnameError::LongLabel);
            }
            pos += len + 1;
            if pos > MAX_NAME_LEN {
                return Err(DnameError::LongName);
            }
            if len == 0 {
                break;
            }
        }
        if pos != octets.len() {
            return Err(DnameError::TrailingData);
        }
        Ok(Dname(octets))
    }

    /// Creates a name from a sequence of labels.
    ///
    /// The root label is added automatically and must not be part of
    /// `labels`.
    pub fn from_labels<'a, I>(labels: I) -> Result<Self, DnameError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut builder = DnameBuilder::new();
        for label in labels {
            builder.push_label(label)?;
        }
        Ok(builder.finish())
    }

    /// Takes a possibly compressed name from the beginning of the parser.
    ///
    /// Compression pointers are resolved against the octets the parser was
    /// created from, which therefore need to start with the beginning of
    /// the message. Upon success, the parser is positioned right after the
    /// name as it appears in the message.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        let mut builder = DnameBuilder::new();
        let mut resume = None;
        let mut pointers = 0;
        loop {
            let len = parser.parse_u8()?;
            match len & 0xC0 {
                0x00 => {
                    if len == 0 {
                        break;
                    }
                    let label = parse_vec(parser, usize::from(len))?;
                    builder.push_label(&label).map_err(|_| {
                        ParseError::form_error("long domain name")
                    })?;
                }
                0xC0 => {
                    let low = parser.parse_u8()?;
                    let target = usize::from(len & 0x3F) << 8 | usize::from(low);
                    if resume.is_none() {
                        resume = Some(parser.pos());
                    }
                    pointers += 1;
                    if pointers > MAX_COMPRESSION_POINTERS {
                        return Err(ParseError::form_error(
                            "compression pointer loop",
                        ));
                    }
                    parser.seek(target)?;
                }
                _ => {
                    return Err(ParseError::form_error("invalid label type"))
                }
            }
        }
        if let Some(pos) = resume {
            parser.seek(pos)?;
        }
        Ok(builder.finish())
    }
}

/// # Properties and Conversion
///
impl Dname {
    /// Returns the wire format octets of the name.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the length of the name in wire format.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Returns an iterator over the labels of the name.
    ///
    /// The final root label is not included.
    pub fn iter_labels(&self) -> LabelIter<'_> {
        LabelIter {
            octets: self.as_slice(),
        }
    }

    /// Returns the number of labels not counting the root label.
    pub fn label_count(&self) -> usize {
        self.iter_labels().count()
    }

    /// Returns a new name with `suffix` appended to this name.
    pub fn join(&self, suffix: &Dname) -> Result<Self, DnameError> {
        let mut builder = DnameBuilder::new();
        for label in self.iter_labels().chain(suffix.iter_labels()) {
            builder.push_label(label)?;
        }
        Ok(builder.finish())
    }

    /// Returns whether this name ends with the given name.
    pub fn ends_with(&self, base: &Dname) -> bool {
        let own: Vec<_> = self.iter_labels().collect();
        let other: Vec<_> = base.iter_labels().collect();
        own.len() >= other.len()
            && own
                .iter()
                .rev()
                .zip(other.iter().rev())
                .all(|(left, right)| left.eq_ignore_ascii_case(right))
    }

    /// Appends the name in wire format to the target.
    pub fn compose(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(self.as_slice())
    }
}

//--- FromStr

impl FromStr for Dname {
    type Err = DnameError;

    /// Parses a name from its presentation format.
    ///
    /// The name is always considered absolute, a trailing dot is optional.
    /// Escape sequences of the form `\c` and `\DDD` are supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "." {
            return Ok(Dname::root());
        }
        if s.is_empty() {
            return Err(DnameError::EmptyLabel);
        }
        let mut builder = DnameBuilder::new();
        let mut label = Vec::new();
        let mut chars = s.chars();
        let mut dangling = false;
        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if label.is_empty() {
                        return Err(DnameError::EmptyLabel);
                    }
                    builder.push_label(&label)?;
                    label.clear();
                    dangling = false;
                    continue;
                }
                '\\' => label.push(parse_escape(&mut chars)?),
                '!'..='-' | '/'..='[' | ']'..='~' => label.push(ch as u8),
                _ => return Err(DnameError::IllegalCharacter),
            }
            dangling = true;
        }
        if dangling {
            builder.push_label(&label)?;
        }
        Ok(builder.finish())
    }
}

/// Parses the remainder of an escape sequence.
fn parse_escape(chars: &mut str::Chars) -> Result<u8, DnameError> {
    let ch = chars.next().ok_or(DnameError::BadEscape)?;
    if let Some(first) = ch.to_digit(10) {
        let second = chars
            .next()
            .and_then(|ch| ch.to_digit(10))
            .ok_or(DnameError::BadEscape)?;
        let third = chars
            .next()
            .and_then(|ch| ch.to_digit(10))
            .ok_or(DnameError::BadEscape)?;
        u8::try_from(first * 100 + second * 10 + third)
            .map_err(|_| DnameError::BadEscape)
    } else if ch.is_ascii() {
        Ok(ch as u8)
    } else {
        Err(DnameError::BadEscape)
    }
}

//--- PartialEq, Eq, and Hash

impl PartialEq for Dname {
    fn eq(&self, other: &Self) -> bool {
        // Length octets are all below 64 and thus never change case.
        self.as_slice().eq_ignore_ascii_case(other.as_slice())
    }
}

impl Eq for Dname {}

impl hash::Hash for Dname {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        for octet in self.as_slice() {
            state.write_u8(octet.to_ascii_lowercase())
        }
    }
}

//--- PartialOrd and Ord

impl PartialOrd for Dname {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dname {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        let left = self.as_slice().iter().map(u8::to_ascii_lowercase);
        let right = other.as_slice().iter().map(u8::to_ascii_lowercase);
        left.cmp(right)
    }
}

//--- Display and Debug

impl fmt::Display for Dname {
    /// Formats the name without the trailing dot except for the root.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut first = true;
        for label in self.iter_labels() {
            if first {
                first = false;
            } else {
                f.write_str(".")?;
            }
            for &ch in label {
                match ch {
                    b'.' | b'\\' => write!(f, "\\{}", ch as char)?,
                    b'!'..=b'~' => write!(f, "{}", ch as char)?,
                    _ => write!(f, "\\{:03}", ch)?,
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Dname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dname({}.)", self)
    }
}

//------------ DnameBuilder --------------------------------------------------

/// Assembles a name label by label.
#[derive(Clone, Debug)]
struct DnameBuilder {
    /// The wire format of the labels pushed so far.
    buf: Vec<u8>,
}

impl DnameBuilder {
    /// Creates an empty builder.
    fn new() -> Self {
        DnameBuilder {
            buf: Vec::with_capacity(64),
        }
    }

    /// Appends a normal, non-empty label.
    fn push_label(&mut self, label: &[u8]) -> Result<(), DnameError> {
        if label.is_empty() {
            return Err(DnameError::EmptyLabel);
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(DnameError::LongLabel);
        }
        // Leave room for the root label.
        if self.buf.len() + label.len() + 2 > MAX_NAME_LEN {
            return Err(DnameError::LongName);
        }
        self.buf.push(label.len() as u8);
        self.buf.extend_from_slice(label);
        Ok(())
    }

    /// Adds the root label and returns the name.
    fn finish(mut self) -> Dname {
        self.buf.push(0);
        Dname(self.buf.into())
    }
}

//------------ LabelIter -----------------------------------------------------

/// An iterator over the labels of a name.
#[derive(Clone, Debug)]
pub struct LabelIter<'a> {
    /// The remaining wire format octets.
    octets: &'a [u8],
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let (&len, rest) = self.octets.split_first()?;
        let len = usize::from(len);
        if len == 0 || rest.len() < len {
            self.octets = &[];
            return None;
        }
        let (label, rest) = rest.split_at(len);
        self.octets = rest;
        Some(label)
    }
}

//------------ DnameError ----------------------------------------------------

/// A domain name could not be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DnameError {
    /// An empty label was encountered in the middle of a name.
    EmptyLabel,

    /// A label was longer than 63 octets.
    LongLabel,

    /// The name was longer than 255 octets.
    LongName,

    /// An illegal escape sequence was encountered.
    BadEscape,

    /// A character not allowed in presentation format was encountered.
    IllegalCharacter,

    /// The wire format ended before the root label.
    ShortInput,

    /// There was data after the root label.
    TrailingData,
}

impl fmt::Display for DnameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            DnameError::EmptyLabel => "empty label",
            DnameError::LongLabel => "label exceeds 63 octets",
            DnameError::LongName => "domain name exceeds 255 octets",
            DnameError::BadEscape => "illegal escape sequence",
            DnameError::IllegalCharacter => "illegal character",
            DnameError::ShortInput => "unexpected end of input",
            DnameError::TrailingData => "trailing data after root label",
        })
    }
}

impl std::error::Error for DnameError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    #[test]
    fn from_str() {
        let name = Dname::from_str("www.Example.com").unwrap();
        assert_eq!(name.as_slice(), b"\x03www\x07Example\x03com\0");
        assert_eq!(Dname::from_str("www.example.com.").unwrap(), name);
        assert_eq!(Dname::from_str(".").unwrap(), Dname::root());
        assert_eq!(
            Dname::from_str("a\\.b.c").unwrap().as_slice(),
            b"\x03a.b\x01c\0"
        );
        assert_eq!(
            Dname::from_str("\\065.b").unwrap().as_slice(),
            b"\x01A\x01b\0"
        );
        assert_eq!(Dname::from_str("a..b"), Err(DnameError::EmptyLabel));
        assert_eq!(Dname::from_str(""), Err(DnameError::EmptyLabel));
        assert_eq!(
            Dname::from_str(&"a".repeat(64)),
            Err(DnameError::LongLabel)
        );
        let long = ["a".repeat(63).as_str(); 4].join(".");
        assert_eq!(Dname::from_str(&long), Err(DnameError::LongName));
    }

    #[test]
    fn display() {
        let name = Dname::from_str("www.example.com.").unwrap();
        assert_eq!(format!("{}", name), "www.example.com");
        assert_eq!(format!("{}", Dname::root()), ".");
        assert_eq!(
            format!("{}", Dname::from_str("a\\.b.c").unwrap()),
            "a\\.b.c"
        );
    }

    #[test]
    fn case_insensitive() {
        let left = Dname::from_str("EXAMPLE.com").unwrap();
        let right = Dname::from_str("example.COM").unwrap();
        assert_eq!(left, right);
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        left.hash(&mut h1);
        right.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn join_and_ends_with() {
        let host = Dname::from_str("www").unwrap();
        let base = Dname::from_str("example.com").unwrap();
        let joined = host.join(&base).unwrap();
        assert_eq!(joined, Dname::from_str("www.example.com").unwrap());
        assert!(joined.ends_with(&base));
        assert!(joined.ends_with(&Dname::root()));
        assert!(!base.ends_with(&joined));
        assert_eq!(joined.label_count(), 3);
    }

    #[test]
    fn parse_compressed() {
        let msg = b"\x03com\x00\x07example\xc0\x00\x03www\xc0\x05";
        let mut parser = Parser::from_ref(&msg[..]);
        assert_eq!(
            Dname::parse(&mut parser).unwrap(),
            Dname::from_str("com").unwrap()
        );
        assert_eq!(
            Dname::parse(&mut parser).unwrap(),
            Dname::from_str("example.com").unwrap()
        );
        assert_eq!(
            Dname::parse(&mut parser).unwrap(),
            Dname::from_str("www.example.com").unwrap()
        );
        assert_eq!(parser.remaining(), 0);
    }

    #[test]
    fn parse_pointer_loop() {
        let msg = b"\x03www\xc0\x00";
        let mut parser = Parser::from_ref(&msg[..]);
        assert!(Dname::parse(&mut parser).is_err());
    }

    #[test]
    fn parse_short() {
        let msg = b"\x03www\x07exam";
        let mut parser = Parser::from_ref(&msg[..]);
        assert_eq!(Dname::parse(&mut parser), Err(ParseError::ShortInput));
    }

    #[test]
    fn from_octets() {
        assert!(Dname::from_octets(Bytes::from_static(b"\x03www\0")).is_ok());
        assert_eq!(
            Dname::from_octets(Bytes::from_static(b"\x03www")),
            Err(DnameError::ShortInput)
        );
        assert_eq!(
            Dname::from_octets(Bytes::from_static(b"\x03www\0\0")),
            Err(DnameError::TrailingData)
        );
    }
}
