//! Handling of DNS data.
//!
//! This module provides types for working with DNS data in wire format. A
//! stub resolver only ever needs a small part of DNS: it composes queries
//! with a single question and picks apart the responses it receives. This
//! is what is provided here.
//!
//! The type [`Message`] takes the binary data of a complete DNS message and
//! parses it into its header and four sections. The function
//! [`encode_query`] creates the wire format of a query and a
//! [`MessageBuilder`] can assemble arbitrary messages, which is mostly
//! useful for testing.
//!
//! # Types for DNS Data
//!
//! * [`Dname`] is an absolute domain name,
//! * [`Question`] is an entry of the question section of a message,
//! * [`Record`] is a resource record with its data in a [`RecordData`].
//!
//! Values for the various IANA-assigned numbers such as record types and
//! classes live in the [`iana`] module.

pub use self::header::{Header, HeaderCounts};
pub use self::iana::{Class, Opcode, Rcode, Rtype};
pub use self::message::Message;
pub use self::message_builder::{encode_query, MessageBuilder, PushError};
pub use self::name::{Dname, DnameError};
pub use self::question::Question;
pub use self::record::{Record, RecordData};
pub use self::wire::{FormError, ParseError};

pub mod header;
pub mod iana;
pub mod message;
pub mod message_builder;
pub mod name;
pub mod question;
pub mod record;
pub mod wire;
