// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of reading and writing of DNS messages.
//!
//! The [`Reader`] and [`Writer`] types work directly on message
//! buffers. On top of them, [`Message`] provides whole-message
//! decoding of queries and encoding of responses of at most 512
//! octets, the limit for DNS over UDP without EDNS.

use arrayvec::ArrayVec;

mod constants;
mod header;
mod opcode;
mod question;
mod rcode;
pub mod reader;
pub mod writer;
pub use constants::MAX_UDP_MESSAGE_SIZE;
pub use header::Header;
pub use opcode::{IntoOpcodeError, Opcode};
pub use question::{Qclass, Qtype, Question};
pub use rcode::{IntoRcodeError, Rcode};
pub use reader::Reader;
pub use writer::Writer;

use crate::name::Name;
use crate::rr::Record;

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A DNS message.
///
/// Decoded queries carry only a header and questions. The record
/// sections are filled in by the [server](crate::server) when it builds
/// a response, and they borrow their records from the zone data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message<'a> {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<MessageRr<'a>>,
    pub authority: Vec<MessageRr<'a>>,
    pub additional: Vec<MessageRr<'a>>,
}

/// A resource record in one of a [`Message`]'s record sections: a
/// stored [`Record`] together with the owner name it is served under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageRr<'a> {
    pub owner: Name,
    pub record: &'a Record,
}

impl<'a> MessageRr<'a> {
    /// Creates a new `MessageRr`.
    pub fn new(owner: Name, record: &'a Record) -> Self {
        Self { owner, record }
    }
}

/// The buffer type returned by [`Message::encode`].
pub type EncodedMessage = ArrayVec<u8, MAX_UDP_MESSAGE_SIZE>;

impl<'a> Message<'a> {
    /// Decodes the header and question section of a message. Exactly
    /// as many questions as the QDCOUNT field announces are read, and
    /// anything after them is ignored.
    pub fn decode(octets: &[u8]) -> Result<Self, reader::Error> {
        let mut reader = Reader::try_from(octets)?;
        let header = reader.header();
        let questions = reader.read_questions()?;
        Ok(Self {
            header,
            questions,
            ..Default::default()
        })
    }

    /// Encodes the message into a buffer of at most 512 octets.
    ///
    /// The header's counts are written from the actual lengths of the
    /// sections, and the Z bits are written as zero. If the message does
    /// not fit, encoding stops at the first question or record that
    /// would cross the limit and the TC bit is set. The counts then
    /// reflect what was actually written, so the result is always a
    /// well-formed message.
    pub fn encode(&self) -> EncodedMessage {
        let mut buf = [0; MAX_UDP_MESSAGE_SIZE];
        let len = self.encode_into(&mut buf, MAX_UDP_MESSAGE_SIZE);
        let mut encoded = EncodedMessage::from(buf);
        encoded.truncate(len);
        encoded
    }

    /// Encodes the message into `buf`, limiting its size to `limit`.
    /// The length of the encoded message is returned. Truncation is
    /// handled as described for [`Message::encode`]. A buffer or limit
    /// too small for the header yields a length of zero.
    pub fn encode_into(&self, buf: &mut [u8], limit: usize) -> usize {
        let mut writer = match Writer::new(buf, limit) {
            Ok(writer) => writer,
            Err(_) => return 0,
        };
        writer.set_id(self.header.id);
        writer.set_qr(self.header.qr);
        writer.set_opcode(self.header.opcode);
        writer.set_aa(self.header.aa);
        writer.set_tc(self.header.tc);
        writer.set_rd(self.header.rd);
        writer.set_ra(self.header.ra);
        writer.set_rcode(self.header.rcode);

        if let Err(writer::Error::Truncation) = self.write_sections(&mut writer) {
            writer.set_tc(true);
        }
        writer.finish()
    }

    /// Writes the questions and records of the message, stopping at the
    /// first failure.
    fn write_sections(&self, writer: &mut Writer) -> writer::Result<()> {
        for question in &self.questions {
            writer.add_question(question)?;
        }
        for rr in &self.answers {
            writer.add_answer(&rr.owner, rr.record)?;
        }
        for rr in &self.authority {
            writer.add_authority(&rr.owner, rr.record)?;
        }
        for rr in &self.additional {
            writer.add_additional(&rr.owner, rr.record)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::class::Class;
    use crate::rr::{RecordData, Ttl, Type};

    fn question(qname: &str) -> Question {
        Question {
            qname: qname.parse().unwrap(),
            qtype: Type::A.into(),
            qclass: Class::IN.into(),
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let message = Message {
            header: Header {
                id: 0xbeef,
                qr: true,
                opcode: Opcode::Status,
                aa: true,
                rd: true,
                ra: true,
                rcode: Rcode::Refused,
                qdcount: 1,
                ..Default::default()
            },
            questions: vec![question("www.example.com.")],
            ..Default::default()
        };
        let encoded = message.encode();
        assert_eq!(Message::decode(&encoded), Ok(message));
    }

    #[test]
    fn counts_and_z_come_from_the_message() {
        let record = Record::new(
            Class::IN,
            Ttl::from(300),
            RecordData::A(Ipv4Addr::new(192, 0, 2, 1)),
        );
        let owner: Name = "www.example.com.".parse().unwrap();
        let message = Message {
            header: Header {
                z: 7,
                qdcount: 9,
                ..Default::default()
            },
            questions: vec![question("www.example.com.")],
            answers: vec![MessageRr::new(owner.clone(), &record)],
            authority: vec![
                MessageRr::new(owner.clone(), &record),
                MessageRr::new(owner, &record),
            ],
            additional: Vec::new(),
        };
        let decoded = Message::decode(&message.encode()).unwrap();
        assert_eq!(decoded.header.z, 0);
        assert_eq!(decoded.header.qdcount, 1);
        assert_eq!(decoded.header.ancount, 1);
        assert_eq!(decoded.header.nscount, 2);
        assert_eq!(decoded.header.arcount, 0);
    }

    #[test]
    fn oversized_question_section_is_truncated() {
        // Each question is 63 + 1 + 1 + 4 = 69 octets, so only seven fit
        // after the header.
        let long = format!("{}.", "a".repeat(63));
        let message = Message {
            questions: vec![question(&long); 10],
            ..Default::default()
        };
        let encoded = message.encode();
        assert!(encoded.len() <= MAX_UDP_MESSAGE_SIZE);
        assert_eq!(encoded.len(), 12 + 7 * 69);

        let decoded = Message::decode(&encoded).unwrap();
        assert!(decoded.header.tc);
        assert_eq!(decoded.header.qdcount, 7);
        assert!(decoded.questions.iter().all(|q| *q == question(&long)));
    }

    #[test]
    fn truncation_in_answers_keeps_earlier_sections() {
        let text = vec![b't'; 200].into_boxed_slice();
        let record = Record::new(Class::IN, Ttl::from(0), RecordData::Txt(text));
        let owner: Name = "example.com.".parse().unwrap();
        let message = Message {
            questions: vec![question("example.com.")],
            answers: vec![MessageRr::new(owner, &record); 3],
            ..Default::default()
        };
        let encoded = message.encode();
        let decoded = Message::decode(&encoded).unwrap();
        assert!(decoded.header.tc);
        assert_eq!(decoded.header.qdcount, 1);
        assert_eq!(decoded.header.ancount, 2);
        assert_eq!(decoded.questions, vec![question("example.com.")]);
    }

    #[test]
    fn short_messages_fail_to_decode() {
        assert_eq!(
            Message::decode(b"\x00\x01\x02"),
            Err(reader::Error::ShortHeader)
        );
    }
}
