//! Accessing existing DNS messages.
//!
//! This module defines the type [`Message`] which holds a complete DNS
//! message that has been parsed eagerly into its four sections. Messages
//! are created from octets received over the wire via
//! [`Message::from_octets`] or assembled with a
//! [`MessageBuilder`][crate::base::message_builder::MessageBuilder].

use super::header::{Header, HeaderCounts};
use super::question::Question;
use super::record::Record;
use super::wire::{ParseError, Parser};
use bytes::Bytes;
use core::fmt;

//------------ Message -------------------------------------------------------

/// A DNS message.
///
/// The message keeps the original octets around so they can be handed on
/// unchanged. All sections are parsed when the message is created, so a
/// value of this type is always a well-formed message.
#[derive(Clone)]
pub struct Message {
    /// The message in wire format.
    octets: Bytes,

    /// The first four octets of the header.
    header: Header,

    /// The section counts from the header.
    counts: HeaderCounts,

    /// The question section.
    question: Vec<Question>,

    /// The answer section.
    answer: Vec<Record>,

    /// The authority section.
    authority: Vec<Record>,

    /// The additional section.
    additional: Vec<Record>,
}

/// # Creation and Conversion
///
impl Message {
    /// Creates a message from octets.
    ///
    /// The function parses the complete message and fails if any part of it
    /// is malformed or if the section counts promise more entries than
    /// there are. Octets following the last record are ignored.
    pub fn from_octets(octets: Bytes) -> Result<Self, ParseError> {
        let mut parser = Parser::from_ref(octets.as_ref());
        let header = Header::parse(&mut parser)?;
        let counts = HeaderCounts::parse(&mut parser)?;
        // The counts are untrusted, so grow as entries are parsed.
        let mut question = Vec::new();
        for _ in 0..counts.qdcount() {
            question.push(Question::parse(&mut parser)?);
        }
        let answer = Self::parse_section(&mut parser, &octets, counts.ancount())?;
        let authority =
            Self::parse_section(&mut parser, &octets, counts.nscount())?;
        let additional =
            Self::parse_section(&mut parser, &octets, counts.arcount())?;
        Ok(Message {
            header,
            counts,
            question,
            answer,
            authority,
            additional,
            octets,
        })
    }

    fn parse_section(
        parser: &mut Parser<'_, [u8]>,
        octets: &Bytes,
        count: u16,
    ) -> Result<Vec<Record>, ParseError> {
        let mut res = Vec::new();
        for _ in 0..count {
            res.push(Record::parse(parser, octets)?);
        }
        Ok(res)
    }

    /// Returns a reference to the underlying octets.
    pub fn as_slice(&self) -> &[u8] {
        self.octets.as_ref()
    }

    /// Returns a reference to the underlying bytes value.
    pub fn as_octets(&self) -> &Bytes {
        &self.octets
    }

    /// Converts the message into the underlying octets.
    pub fn into_octets(self) -> Bytes {
        self.octets
    }
}

/// # Header Section
///
impl Message {
    /// Returns the message header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns the header counts of the message.
    pub fn header_counts(&self) -> HeaderCounts {
        self.counts
    }

    /// Returns whether the message is a response.
    pub fn is_response(&self) -> bool {
        self.header.qr()
    }
}

/// # Sections
///
impl Message {
    /// Returns the question section.
    pub fn question(&self) -> &[Question] {
        &self.question
    }

    /// Returns the first question, if there is any.
    pub fn first_question(&self) -> Option<&Question> {
        self.question.first()
    }

    /// Returns the answer section.
    pub fn answer(&self) -> &[Record] {
        &self.answer
    }

    /// Returns the authority section.
    pub fn authority(&self) -> &[Record] {
        &self.authority
    }

    /// Returns the additional section.
    pub fn additional(&self) -> &[Record] {
        &self.additional
    }
}

/// # Helpers for Resolvers
///
impl Message {
    /// Returns whether this message is an answer to the given question.
    ///
    /// This is the case if the message is a response, carries exactly one
    /// question, and that question equals `question`. Message IDs are not
    /// considered here.
    pub fn is_answer_to(&self, question: &Question) -> bool {
        self.header.qr()
            && self.question.len() == 1
            && self.question[0] == *question
    }

    /// Returns the canonical name of the first question.
    ///
    /// Starting with the question name, this follows any CNAME records in
    /// the answer section and returns the name the chain ends with.
    pub fn canonical_name(&self) -> Option<&super::name::Dname> {
        use super::record::RecordData;

        let mut name = self.first_question()?.qname();
        // A chain can't be longer than the answer section.
        for _ in 0..self.answer.len() {
            let next = self.answer.iter().find_map(|record| {
                match *record.data() {
                    RecordData::Cname(ref target) if record.owner() == name => {
                        Some(target)
                    }
                    _ => None,
                }
            });
            match next {
                Some(target) => name = target,
                None => break,
            }
        }
        Some(name)
    }
}

//--- Debug

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Message")
            .field("header", &self.header)
            .field("question", &self.question)
            .field("answer", &self.answer)
            .field("authority", &self.authority)
            .field("additional", &self.additional)
            .finish()
    }
}

//============ Testing =======================================================
