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

//! Implementation of the [`Reader`] type to read on-the-wire DNS
//! messages.

use std::fmt;

use super::constants::*;
use super::{Header, Opcode, Question, Rcode};
use crate::name::{self, Name};
use crate::util::read_u16;

////////////////////////////////////////////////////////////////////////
// READER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer containing a DNS message that enables
/// reading the message data.
///
/// A `Reader` is constructed using its [`TryFrom`] implementation. Any
/// underlying buffer for a reader must contain at least a full DNS
/// message header of 12 octets; otherwise the construction will fail.
///
/// Since header information is in a fixed position, it can be read
/// at any time through the appropriate `Reader` methods. Questions are
/// read with [`Reader::read_question`], which uses a cursor that is
/// initially set to the first octet after the header. Only the question
/// section is ever read: the server has no use for the records that a
/// query might carry.
#[derive(Eq, PartialEq)]
pub struct Reader<'a> {
    octets: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Returns the 16-bit ID of the message.
    pub fn id(&self) -> u16 {
        self.read_header_u16(ID_START)
    }

    /// Returns whether the QR (query response) bit is set.
    pub fn qr(&self) -> bool {
        (self.octets[QR_BYTE] & QR_MASK) != 0
    }

    /// Returns the message's opcode.
    pub fn opcode(&self) -> Opcode {
        let raw = (self.octets[OPCODE_BYTE] & OPCODE_MASK) >> OPCODE_SHIFT;
        Opcode::try_from(raw).unwrap_or(Opcode::Reserved(raw))
    }

    /// Returns whether the AA (authoritative answer) bit is set.
    pub fn aa(&self) -> bool {
        (self.octets[AA_BYTE] & AA_MASK) != 0
    }

    /// Returns whether the TC (truncation) bit is set.
    pub fn tc(&self) -> bool {
        (self.octets[TC_BYTE] & TC_MASK) != 0
    }

    /// Returns whether the RD (recursion desired) bit is set.
    pub fn rd(&self) -> bool {
        (self.octets[RD_BYTE] & RD_MASK) != 0
    }

    /// Returns whether the RA (recursion available) bit is set.
    pub fn ra(&self) -> bool {
        (self.octets[RA_BYTE] & RA_MASK) != 0
    }

    /// Returns the three reserved Z bits.
    pub fn z(&self) -> u8 {
        (self.octets[Z_BYTE] & Z_MASK) >> Z_SHIFT
    }

    /// Returns the RCODE of the message.
    pub fn rcode(&self) -> Rcode {
        let raw = self.octets[RCODE_BYTE] & RCODE_MASK;
        Rcode::try_from(raw).unwrap_or(Rcode::Reserved(raw))
    }

    /// Returns the number of questions in the message.
    pub fn qdcount(&self) -> u16 {
        self.read_header_u16(QDCOUNT_START)
    }

    /// Returns the number of answers in the message.
    pub fn ancount(&self) -> u16 {
        self.read_header_u16(ANCOUNT_START)
    }

    /// Returns the number of authority records in the message.
    pub fn nscount(&self) -> u16 {
        self.read_header_u16(NSCOUNT_START)
    }

    /// Returns the number of additional records in the message.
    pub fn arcount(&self) -> u16 {
        self.read_header_u16(ARCOUNT_START)
    }

    /// Returns all header fields at once.
    pub fn header(&self) -> Header {
        Header {
            id: self.id(),
            qr: self.qr(),
            opcode: self.opcode(),
            aa: self.aa(),
            tc: self.tc(),
            rd: self.rd(),
            ra: self.ra(),
            z: self.z(),
            rcode: self.rcode(),
            qdcount: self.qdcount(),
            ancount: self.ancount(),
            nscount: self.nscount(),
            arcount: self.arcount(),
        }
    }

    /// Reads a [`Question`] starting at the current cursor.
    ///
    /// This method is atomic, in that the cursor is not changed on
    /// failure.
    pub fn read_question(&mut self) -> Result<Question, QuestionError> {
        let (qname, qname_len) = read_name(self.octets, self.cursor)?;
        let qname_end = self.cursor + qname_len;
        let qtype = self
            .octets
            .get(qname_end..)
            .and_then(read_u16)
            .ok_or(QuestionError::Truncated)?;
        let qclass = self
            .octets
            .get(qname_end + 2..)
            .and_then(read_u16)
            .ok_or(QuestionError::Truncated)?;
        self.cursor = qname_end + 4;
        Ok(Question {
            qname,
            qtype: qtype.into(),
            qclass: qclass.into(),
        })
    }

    /// Reads exactly [`Reader::qdcount`] questions. The first question
    /// that cannot be read fails the whole section.
    pub fn read_questions(&mut self) -> Result<Vec<Question>, Error> {
        (0..self.qdcount())
            .map(|_| self.read_question().map_err(Error::QuestionSection))
            .collect()
    }

    /// Returns whether the `Reader`'s cursor has reached the end of the
    /// message.
    pub fn at_eom(&self) -> bool {
        self.cursor >= self.octets.len()
    }

    fn read_header_u16(&self, start: usize) -> u16 {
        u16::from_be_bytes([self.octets[start], self.octets[start + 1]])
    }
}

impl<'a> TryFrom<&'a [u8]> for Reader<'a> {
    type Error = Error;

    fn try_from(octets: &'a [u8]) -> Result<Self, Error> {
        if octets.len() >= HEADER_SIZE {
            Ok(Self {
                octets,
                cursor: HEADER_SIZE,
            })
        } else {
            Err(Error::ShortHeader)
        }
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Reader")
            .field("header", &self.header())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Reads an uncompressed domain name starting at `start`, returning it
/// along with the number of octets it occupies in the message.
fn read_name(octets: &[u8], start: usize) -> Result<(Name, usize), QuestionError> {
    let mut labels = Vec::new();
    let mut cursor = start;
    loop {
        let len = *octets.get(cursor).ok_or(QuestionError::Truncated)?;
        if len & LABEL_TYPE_MASK != 0 {
            return Err(QuestionError::UnsupportedLabel);
        } else if len == 0 {
            break;
        }
        let label = octets
            .get(cursor + 1..cursor + 1 + len as usize)
            .ok_or(QuestionError::Truncated)?;
        labels.push(label);
        cursor += 1 + len as usize;
    }

    if labels.is_empty() {
        Err(QuestionError::EmptyName)
    } else {
        let name = Name::from_labels(labels).map_err(QuestionError::InvalidName)?;
        Ok((name, cursor + 1 - start))
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a message could not be decoded.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The message is shorter than the 12-octet header.
    ShortHeader,

    /// One of the questions could not be read.
    QuestionSection(QuestionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::ShortHeader => f.write_str("message is shorter than the header"),
            Self::QuestionSection(err) => write!(f, "invalid question section: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::QuestionSection(err) => Some(err),
            _ => None,
        }
    }
}

/// An error signaling that a single [`Question`] could not be read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QuestionError {
    /// A label length, the QTYPE, or the QCLASS runs past the end of
    /// the message.
    Truncated,

    /// The QNAME has no labels.
    EmptyName,

    /// The QNAME uses a compression pointer or an extended label type.
    UnsupportedLabel,

    /// The QNAME is otherwise invalid (e.g. too long).
    InvalidName(name::Error),
}

impl fmt::Display for QuestionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Truncated => f.write_str("question is truncated"),
            Self::EmptyName => f.write_str("QNAME is empty"),
            Self::UnsupportedLabel => f.write_str("QNAME uses an unsupported label type"),
            Self::InvalidName(err) => write!(f, "invalid QNAME: {}", err),
        }
    }
}

impl std::error::Error for QuestionError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::{Qclass, Qtype};
    use super::*;
    use crate::class::Class;
    use crate::rr::Type;

    /// A query for www.example.com. IN A with RD set, as sent by dig.
    const WWW_EXAMPLE_COM_A_QUERY: &[u8] =
        b"\x5c\x21\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
          \x03www\x07example\x03com\x00\x00\x01\x00\x01";

    #[test]
    fn reader_works() {
        let mut reader = Reader::try_from(WWW_EXAMPLE_COM_A_QUERY).unwrap();

        // Check the header.
        assert_eq!(reader.id(), 0x5c21);
        assert!(!reader.qr());
        assert_eq!(reader.opcode(), Opcode::Query);
        assert!(!reader.aa());
        assert!(!reader.tc());
        assert!(reader.rd());
        assert!(!reader.ra());
        assert_eq!(reader.z(), 0);
        assert_eq!(reader.rcode(), Rcode::NoError);
        assert_eq!(reader.qdcount(), 1);
        assert_eq!(reader.ancount(), 0);
        assert_eq!(reader.nscount(), 0);
        assert_eq!(reader.arcount(), 0);

        // Check the question.
        let question = reader.read_question().unwrap();
        assert_eq!(question.qname, "www.example.com.".parse().unwrap());
        assert_eq!(question.qtype, Qtype::from(Type::A));
        assert_eq!(question.qclass, Qclass::from(Class::IN));

        // And that should be it!
        assert!(reader.at_eom());
    }

    #[test]
    fn header_bits_are_read_from_fixed_offsets() {
        // QR, opcode 2, AA, TC, RD | RA, Z = 5, RCODE 3
        let octets = b"\xff\xfe\x97\xd3\x00\x02\x00\x03\x00\x04\x00\x05";
        let header = Reader::try_from(&octets[..]).unwrap().header();
        assert_eq!(
            header,
            Header {
                id: 0xfffe,
                qr: true,
                opcode: Opcode::Status,
                aa: true,
                tc: true,
                rd: true,
                ra: true,
                z: 5,
                rcode: Rcode::NxDomain,
                qdcount: 2,
                ancount: 3,
                nscount: 4,
                arcount: 5,
            }
        );
    }

    #[test]
    fn reader_constructor_rejects_short_message() {
        for size in 0..HEADER_SIZE {
            let buf = vec![0; size];
            assert_eq!(Reader::try_from(buf.as_slice()), Err(Error::ShortHeader));
        }
    }

    #[test]
    fn label_running_past_end_is_truncated() {
        let octets = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x05ab";
        let mut reader = Reader::try_from(&octets[..]).unwrap();
        assert_eq!(reader.read_question(), Err(QuestionError::Truncated));
        assert_eq!(
            reader.read_questions(),
            Err(Error::QuestionSection(QuestionError::Truncated))
        );
    }

    #[test]
    fn missing_qclass_is_truncated() {
        let octets = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x01a\x00\x00\x01";
        let mut reader = Reader::try_from(&octets[..]).unwrap();
        assert_eq!(reader.read_question(), Err(QuestionError::Truncated));
    }

    #[test]
    fn root_qname_is_empty() {
        let octets = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x00\x00\x02\x00\x01";
        let mut reader = Reader::try_from(&octets[..]).unwrap();
        assert_eq!(reader.read_question(), Err(QuestionError::EmptyName));
    }

    #[test]
    fn compression_pointers_are_unsupported() {
        let octets = b"\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\xc0\x0c\x00\x01\x00\x01";
        let mut reader = Reader::try_from(&octets[..]).unwrap();
        assert_eq!(reader.read_question(), Err(QuestionError::UnsupportedLabel));
    }

    #[test]
    fn exactly_qdcount_questions_are_read() {
        let mut octets = WWW_EXAMPLE_COM_A_QUERY.to_vec();
        octets[5] = 2;
        octets.extend_from_slice(b"\x04mail\x07example\x03com\x00\x00\x0f\x00\x01");
        octets.extend_from_slice(b"trailing garbage");
        let mut reader = Reader::try_from(octets.as_slice()).unwrap();
        let questions = reader.read_questions().unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].qname, "mail.example.com.".parse().unwrap());
        assert_eq!(questions[1].qtype, Qtype::from(Type::MX));
        assert!(!reader.at_eom());
    }
}
