//! Resource records.
//!
//! This module defines [`Record`], a resource record with its record data
//! already parsed into a [`RecordData`] value for the handful of types a
//! stub resolver interprets. Record data of all other types is kept as raw
//! octets.

use super::iana::{Class, Rtype};
use super::name::Dname;
use super::wire::{compose_len_prefixed, parse_u16, parse_u32, ParseError, Parser};
use bytes::Bytes;
use core::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

//------------ Record --------------------------------------------------------

/// A DNS resource record.
///
/// All information available through the DNS is stored in resource records.
/// They have a three part key of a domain name, resource record type, and
/// class. Data is arranged in a tree which is navigated using the domain
/// name. Each node in the tree carries a label, starting with the root
/// label as the top-most node.
///
/// The record type is implied by the variant of the record data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The owner of the record.
    owner: Dname,

    /// The class of the record.
    class: Class,

    /// The time-to-live value of the record.
    ttl: u32,

    /// The record data.
    data: RecordData,
}

impl Record {
    /// Creates a new record from its parts.
    pub fn new(owner: Dname, class: Class, ttl: u32, data: RecordData) -> Self {
        Record {
            owner,
            class,
            ttl,
            data,
        }
    }

    /// Returns a reference to the owner domain name.
    pub fn owner(&self) -> &Dname {
        &self.owner
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.data.rtype()
    }

    /// Returns the record class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the record’s time-to-live in seconds.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Return a reference to the record data.
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    /// Takes a record from the beginning of a parser.
    ///
    /// The parser must have been created from `octets` which must be the
    /// complete message.
    pub fn parse(
        parser: &mut Parser<'_, [u8]>,
        octets: &Bytes,
    ) -> Result<Self, ParseError> {
        let owner = Dname::parse(parser)?;
        let rtype = Rtype::from_int(parse_u16(parser)?);
        let class = Class::from_int(parse_u16(parser)?);
        let ttl = parse_u32(parser)?;
        let rdlen = usize::from(parse_u16(parser)?);
        let data = RecordData::parse(rtype, parser, rdlen, octets)?;
        Ok(Record::new(owner, class, ttl, data))
    }

    /// Appends the record in uncompressed wire format.
    pub fn compose(&self, target: &mut Vec<u8>) {
        self.owner.compose(target);
        target.extend_from_slice(&self.rtype().to_int().to_be_bytes());
        target.extend_from_slice(&self.class.to_int().to_be_bytes());
        target.extend_from_slice(&self.ttl.to_be_bytes());
        compose_len_prefixed(target, |target| self.data.compose(target));
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}. {} {} {} {}",
            self.owner,
            self.ttl,
            self.class,
            self.rtype(),
            self.data
        )
    }
}

//------------ RecordData ----------------------------------------------------

/// The data of a resource record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordData {
    /// An IPv4 host address.
    A(Ipv4Addr),

    /// An IPv6 host address.
    Aaaa(Ipv6Addr),

    /// The canonical name of an alias.
    Cname(Dname),

    /// An authoritative name server.
    Ns(Dname),

    /// A domain name pointer.
    Ptr(Dname),

    /// A mail exchanger.
    Mx {
        /// The preference of this exchanger, lower is better.
        preference: u16,

        /// The name of the exchanger.
        exchange: Dname,
    },

    /// Data of any other type as raw octets.
    Other {
        /// The record type.
        rtype: Rtype,

        /// The record data in wire format.
        data: Bytes,
    },
}

impl RecordData {
    /// Returns the record type of the data.
    pub fn rtype(&self) -> Rtype {
        match *self {
            RecordData::A(_) => Rtype::A,
            RecordData::Aaaa(_) => Rtype::AAAA,
            RecordData::Cname(_) => Rtype::CNAME,
            RecordData::Ns(_) => Rtype::NS,
            RecordData::Ptr(_) => Rtype::PTR,
            RecordData::Mx { .. } => Rtype::MX,
            RecordData::Other { rtype, .. } => rtype,
        }
    }

    /// Parses record data of the given type and length.
    ///
    /// Names embedded in the data may be compressed which is why the
    /// complete message has to be available via `parser`.
    pub fn parse(
        rtype: Rtype,
        parser: &mut Parser<'_, [u8]>,
        rdlen: usize,
        octets: &Bytes,
    ) -> Result<Self, ParseError> {
        let start = parser.pos();
        if parser.remaining() < rdlen {
            return Err(ParseError::ShortInput);
        }
        let res = match rtype {
            Rtype::A => {
                let mut buf = [0u8; 4];
                parser.parse_buf(&mut buf)?;
                RecordData::A(buf.into())
            }
            Rtype::AAAA => {
                let mut buf = [0u8; 16];
                parser.parse_buf(&mut buf)?;
                RecordData::Aaaa(buf.into())
            }
            Rtype::CNAME => RecordData::Cname(Dname::parse(parser)?),
            Rtype::NS => RecordData::Ns(Dname::parse(parser)?),
            Rtype::PTR => RecordData::Ptr(Dname::parse(parser)?),
            Rtype::MX => RecordData::Mx {
                preference: parse_u16(parser)?,
                exchange: Dname::parse(parser)?,
            },
            _ => {
                parser.advance(rdlen)?;
                RecordData::Other {
                    rtype,
                    data: octets.slice(start..start + rdlen),
                }
            }
        };
        if parser.pos() != start + rdlen {
            return Err(ParseError::form_error("record data length mismatch"));
        }
        Ok(res)
    }

    /// Appends the data in uncompressed wire format.
    pub fn compose(&self, target: &mut Vec<u8>) {
        match *self {
            RecordData::A(addr) => target.extend_from_slice(&addr.octets()),
            RecordData::Aaaa(addr) => {
                target.extend_from_slice(&addr.octets())
            }
            RecordData::Cname(ref name)
            | RecordData::Ns(ref name)
            | RecordData::Ptr(ref name) => name.compose(target),
            RecordData::Mx {
                preference,
                ref exchange,
            } => {
                target.extend_from_slice(&preference.to_be_bytes());
                exchange.compose(target);
            }
            RecordData::Other { ref data, .. } => {
                target.extend_from_slice(data)
            }
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RecordData::A(addr) => addr.fmt(f),
            RecordData::Aaaa(addr) => addr.fmt(f),
            RecordData::Cname(ref name)
            | RecordData::Ns(ref name)
            | RecordData::Ptr(ref name) => write!(f, "{}.", name),
            RecordData::Mx {
                preference,
                ref exchange,
            } => write!(f, "{} {}.", preference, exchange),
            RecordData::Other { ref data, .. } => {
                write!(f, "\\# {}", data.len())?;
                for octet in data.iter() {
                    write!(f, " {:02x}", octet)?;
                }
                Ok(())
            }
        }
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn compose_parse_mx() {
        let record = Record::new(
            Dname::from_str("example.com").unwrap(),
            Class::IN,
            3600,
            RecordData::Mx {
                preference: 10,
                exchange: Dname::from_str("mail.example.com").unwrap(),
            },
        );
        let mut target = Vec::new();
        record.compose(&mut target);
        let octets = Bytes::from(target);
        let mut parser = Parser::from_ref(octets.as_ref());
        assert_eq!(Record::parse(&mut parser, &octets).unwrap(), record);
        assert_eq!(parser.remaining(), 0);
        assert_eq!(
            format!("{}", record),
            "example.com. 3600 IN MX 10 mail.example.com."
        );
    }

    #[test]
    fn parse_bad_length() {
        // An A record claiming five octets of data.
        let octets = Bytes::from_static(
            b"\0\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x05\x01\x02\x03\x04\x05",
        );
        let mut parser = Parser::from_ref(octets.as_ref());
        assert!(Record::parse(&mut parser, &octets).is_err());
    }

    #[test]
    fn other_data() {
        let octets = Bytes::from_static(
            b"\0\x00\x10\x00\x01\x00\x00\x00\x3c\x00\x04\x03abc",
        );
        let mut parser = Parser::from_ref(octets.as_ref());
        let record = Record::parse(&mut parser, &octets).unwrap();
        assert_eq!(record.rtype(), Rtype::TXT);
        assert_eq!(
            record.data(),
            &RecordData::Other {
                rtype: Rtype::TXT,
                data: Bytes::from_static(b"\x03abc")
            }
        );
    }
}
