//! Building a new DNS message.
//!
//! The type [`MessageBuilder`] assembles a message section by section.
//! Sections are kept in separate buffers so entries can be pushed in any
//! order. Names are always written uncompressed.
//!
//! For the common case of a query with a single question, the function
//! [`encode_query`] produces the wire format directly.

use super::header::{Header, HeaderCounts};
use super::message::Message;
use super::question::Question;
use super::record::Record;
use super::wire::ParseError;
use bytes::Bytes;
use core::fmt;

//------------ encode_query --------------------------------------------------

/// Produces the wire format of a query for a single question.
///
/// The query has the given ID and opcode QUERY. The RD bit is set if
/// `recursion_desired` is `true`.
pub fn encode_query(
    question: &Question,
    id: u16,
    recursion_desired: bool,
) -> Vec<u8> {
    let mut header = Header::new();
    header.set_id(id);
    header.set_rd(recursion_desired);
    let mut counts = HeaderCounts::new();
    counts.set_qdcount(1);
    let mut target = Vec::with_capacity(12 + question.qname().len() + 4);
    target.extend_from_slice(header.as_slice());
    counts.compose(&mut target);
    question.compose(&mut target);
    target
}

//------------ MessageBuilder ------------------------------------------------

/// Builds a DNS message.
#[derive(Clone, Debug, Default)]
pub struct MessageBuilder {
    header: Header,
    counts: HeaderCounts,
    question: Vec<u8>,
    answer: Vec<u8>,
    authority: Vec<u8>,
    additional: Vec<u8>,
}

impl MessageBuilder {
    /// Creates a new, empty message builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a response to the given query.
    ///
    /// The response has the query’s ID, opcode and RD bit, the QR bit set,
    /// and a copy of the query’s question section.
    pub fn start_answer(query: &Message) -> Result<Self, PushError> {
        let mut res = Self::new();
        res.header.set_id(query.header().id());
        res.header.set_opcode(query.header().opcode());
        res.header.set_rd(query.header().rd());
        res.header.set_qr(true);
        for question in query.question() {
            res.push_question(question)?;
        }
        Ok(res)
    }

    /// Returns a reference to the header.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns a mutable reference to the header.
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Appends a question to the question section.
    pub fn push_question(
        &mut self,
        question: &Question,
    ) -> Result<(), PushError> {
        let count = Self::inc(self.counts.qdcount())?;
        question.compose(&mut self.question);
        self.counts.set_qdcount(count);
        Ok(())
    }

    /// Appends a record to the answer section.
    pub fn push_answer(&mut self, record: &Record) -> Result<(), PushError> {
        let count = Self::inc(self.counts.ancount())?;
        record.compose(&mut self.answer);
        self.counts.set_ancount(count);
        Ok(())
    }

    /// Appends a record to the authority section.
    pub fn push_authority(
        &mut self,
        record: &Record,
    ) -> Result<(), PushError> {
        let count = Self::inc(self.counts.nscount())?;
        record.compose(&mut self.authority);
        self.counts.set_nscount(count);
        Ok(())
    }

    /// Appends a record to the additional section.
    pub fn push_additional(
        &mut self,
        record: &Record,
    ) -> Result<(), PushError> {
        let count = Self::inc(self.counts.arcount())?;
        record.compose(&mut self.additional);
        self.counts.set_arcount(count);
        Ok(())
    }

    fn inc(count: u16) -> Result<u16, PushError> {
        count.checked_add(1).ok_or(PushError)
    }

    /// Finishes the message and returns its wire format.
    pub fn finish(self) -> Vec<u8> {
        let mut target = Vec::with_capacity(
            12 + self.question.len()
                + self.answer.len()
                + self.authority.len()
                + self.additional.len(),
        );
        target.extend_from_slice(self.header.as_slice());
        self.counts.compose(&mut target);
        target.extend_from_slice(&self.question);
        target.extend_from_slice(&self.answer);
        target.extend_from_slice(&self.authority);
        target.extend_from_slice(&self.additional);
        target
    }

    /// Finishes the message and parses it into a [`Message`].
    pub fn into_message(self) -> Result<Message, ParseError> {
        Message::from_octets(Bytes::from(self.finish()))
    }
}

//------------ PushError -----------------------------------------------------

/// A section is full and cannot take another entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PushError;

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("section count exceeded")
    }
}

impl std::error::Error for PushError {}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::iana::{Opcode, Rtype};
    use crate::base::name::Dname;
    use std::str::FromStr;

    #[test]
    fn encode_query_layout() {
        let question =
            Question::new_in(Dname::from_str("example.com").unwrap(), Rtype::A);
        let query = encode_query(&question, 0xBEEF, true);
        assert_eq!(
            query,
            b"\xbe\xef\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
              \x07example\x03com\0\x00\x01\x00\x01"
        );
        let msg = Message::from_octets(Bytes::from(query)).unwrap();
        assert_eq!(msg.header().id(), 0xBEEF);
        assert_eq!(msg.header().opcode(), Opcode::QUERY);
        assert!(msg.header().rd());
        assert!(!msg.header().qr());
        assert_eq!(msg.question(), &[question]);
    }

    #[test]
    fn start_answer() {
        let question =
            Question::new_in(Dname::from_str("example.com").unwrap(), Rtype::MX);
        let query = Message::from_octets(Bytes::from(encode_query(
            &question, 7, false,
        )))
        .unwrap();
        let answer = MessageBuilder::start_answer(&query)
            .unwrap()
            .into_message()
            .unwrap();
        assert_eq!(answer.header().id(), 7);
        assert!(!answer.header().rd());
        assert!(answer.is_answer_to(&question));
    }
}
