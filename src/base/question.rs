//! A single question in a DNS message.
//!
//! This module defines the type [`Question`] which represents an entry in
//! the question section of a DNS message.

use super::iana::{Class, Rtype};
use super::name::Dname;
use super::wire::{parse_u16, ParseError, Parser};
use core::fmt;

//------------ Question ------------------------------------------------------

/// A question in a DNS message.
///
/// In DNS, a question describes what is requested in a query. It consists
/// of three elements: a domain name, a record type, and a class. This type
/// represents such a question. Two questions are equal if all three
/// elements are equal, with the name compared case-insensitively.
///
/// Questions are defined in section 4.1.2 of [RFC 1035].
///
/// [RFC 1035]: https://tools.ietf.org/html/rfc1035
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    /// The domain name of the question.
    qname: Dname,

    /// The record type of the question.
    qtype: Rtype,

    /// The class of the quesiton.
    qclass: Class,
}

/// # Creation and Conversion
///
impl Question {
    /// Creates a new question from its three componets.
    pub fn new(qname: Dname, qtype: Rtype, qclass: Class) -> Self {
        Question {
            qname,
            qtype,
            qclass,
        }
    }

    /// Creates a new question from a name and record type, assuming class IN.
    pub fn new_in(qname: Dname, qtype: Rtype) -> Self {
        Question::new(qname, qtype, Class::IN)
    }
}

/// # Field Access
///
impl Question {
    /// Returns a reference to the domain nmae in the question,
    pub fn qname(&self) -> &Dname {
        &self.qname
    }

    /// Returns the record type of the question.
    pub fn qtype(&self) -> Rtype {
        self.qtype
    }

    /// Returns the class of the question.
    pub fn qclass(&self) -> Class {
        self.qclass
    }
}

/// # Parsing and Composing
///
impl Question {
    /// Takes a question from the beginning of a parser.
    pub fn parse(parser: &mut Parser<'_, [u8]>) -> Result<Self, ParseError> {
        Ok(Question::new(
            Dname::parse(parser)?,
            Rtype::from_int(parse_u16(parser)?),
            Class::from_int(parse_u16(parser)?),
        ))
    }

    /// Appends the question in wire format.
    pub fn compose(&self, target: &mut Vec<u8>) {
        self.qname.compose(target);
        target.extend_from_slice(&self.qtype.to_int().to_be_bytes());
        target.extend_from_slice(&self.qclass.to_int().to_be_bytes());
    }
}

//--- From

impl From<(Dname, Rtype, Class)> for Question {
    fn from((name, rtype, class): (Dname, Rtype, Class)) -> Self {
        Question::new(name, rtype, class)
    }
}

impl From<(Dname, Rtype)> for Question {
    fn from((name, rtype): (Dname, Rtype)) -> Self {
        Question::new(name, rtype, Class::IN)
    }
}

//--- Display

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.qname.is_root() {
            write!(f, ". {} {}", self.qclass, self.qtype)
        } else {
            write!(f, "{}. {} {}", self.qname, self.qclass, self.qtype)
        }
    }
}

//============ Testing =======================================================
