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

//! Implementation of the [`Writer`] type to write on-the-wire DNS
//! messages.

use std::fmt;

use super::constants::*;
use super::{Opcode, Question, Rcode};
use crate::name::Name;
use crate::rr::{Record, RecordData, Soa};
use crate::util::read_u16;

////////////////////////////////////////////////////////////////////////
// WRITER                                                             //
////////////////////////////////////////////////////////////////////////

/// A "frame" around a buffer that serializes a DNS message into it.
///
/// A `Writer` is constructed using [`Writer::new`] (to set a message
/// size limit different from the underlying buffer size) or with its
/// [`TryFrom`] implementation (which sets the message size limit equal
/// to the buffer length). The underlying buffer and message size limit
/// must be long enough to accommodate a full DNS message header of 12
/// octets. The message header is initially zeroed.
///
/// Since header information is in a fixed position, it can be written
/// at any time through the appropriate `Writer` methods. Questions and
/// resource records are written sequentially into the buffer based on a
/// cursor, using [`Writer::add_question`], [`Writer::add_answer`],
/// [`Writer::add_authority`], and [`Writer::add_additional`]. These
/// must be used in that order; to ensure this, the `Writer` keeps track
/// of the section it is currently writing, and out-of-order additions
/// fail with [`Error::OutOfOrder`].
///
/// Every addition is atomic. If a question or record does not fit
/// within the size limit, the addition fails with [`Error::Truncation`]
/// and nothing of it remains in the buffer. Domain names are never
/// compressed.
pub struct Writer<'a> {
    octets: &'a mut [u8],
    cursor: usize,
    limit: usize,
    section: Section,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
}

/// A type for recording which section of a DNS message a [`Writer`] is
/// currently serializing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl<'a> Writer<'a> {
    /// Creates a new `Writer` from the underlying buffer `octets`. The
    /// message size is limited to `limit` or `octets.len()` (whichever
    /// is smaller). If the smaller limit is too small to hold a full
    /// DNS message header of 12 octets, then this will fail.
    pub fn new(octets: &'a mut [u8], limit: usize) -> Result<Self> {
        let limit = limit.min(octets.len());
        if limit < HEADER_SIZE {
            Err(Error::Truncation)
        } else {
            octets[0..HEADER_SIZE].fill(0);
            Ok(Self {
                octets,
                cursor: HEADER_SIZE,
                limit,
                section: Section::Question,
                qdcount: 0,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            })
        }
    }

    /// Returns the current 16-bit ID of the message.
    pub fn id(&self) -> u16 {
        read_u16(&self.octets[ID_START..ID_END]).unwrap_or_default()
    }

    /// Sets the 16-bit ID of the message.
    pub fn set_id(&mut self, id: u16) {
        self.write_u16(ID_START, id);
    }

    /// Returns the current value of the QR (query response) bit.
    pub fn qr(&self) -> bool {
        (self.octets[QR_BYTE] & QR_MASK) != 0
    }

    /// Sets or clears the QR (query response) bit.
    pub fn set_qr(&mut self, qr: bool) {
        self.set_bit(QR_BYTE, QR_MASK, qr);
    }

    /// Returns the message's current opcode.
    pub fn opcode(&self) -> Opcode {
        let raw = (self.octets[OPCODE_BYTE] & OPCODE_MASK) >> OPCODE_SHIFT;
        Opcode::try_from(raw).unwrap_or(Opcode::Reserved(raw))
    }

    /// Sets the message's opcode.
    pub fn set_opcode(&mut self, opcode: Opcode) {
        self.octets[OPCODE_BYTE] &= !OPCODE_MASK;
        self.octets[OPCODE_BYTE] |= (u8::from(opcode) << OPCODE_SHIFT) & OPCODE_MASK;
    }

    /// Returns the current value of the AA (authoritative answer) bit.
    pub fn aa(&self) -> bool {
        (self.octets[AA_BYTE] & AA_MASK) != 0
    }

    /// Sets or clears the AA (authoritative answer) bit.
    pub fn set_aa(&mut self, aa: bool) {
        self.set_bit(AA_BYTE, AA_MASK, aa);
    }

    /// Returns the current value of the TC (truncation) bit.
    pub fn tc(&self) -> bool {
        (self.octets[TC_BYTE] & TC_MASK) != 0
    }

    /// Sets or clears the TC (truncation) bit.
    pub fn set_tc(&mut self, tc: bool) {
        self.set_bit(TC_BYTE, TC_MASK, tc);
    }

    /// Returns the current value of the RD (recursion desired) bit.
    pub fn rd(&self) -> bool {
        (self.octets[RD_BYTE] & RD_MASK) != 0
    }

    /// Sets or clears the RD (recursion desired) bit.
    pub fn set_rd(&mut self, rd: bool) {
        self.set_bit(RD_BYTE, RD_MASK, rd);
    }

    /// Returns the current value of the RA (recursion available) bit.
    pub fn ra(&self) -> bool {
        (self.octets[RA_BYTE] & RA_MASK) != 0
    }

    /// Sets or clears the RA (recursion available) bit.
    pub fn set_ra(&mut self, ra: bool) {
        self.set_bit(RA_BYTE, RA_MASK, ra);
    }

    /// Returns the message's current RCODE.
    pub fn rcode(&self) -> Rcode {
        let raw = self.octets[RCODE_BYTE] & RCODE_MASK;
        Rcode::try_from(raw).unwrap_or(Rcode::Reserved(raw))
    }

    /// Sets the message's RCODE.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.octets[RCODE_BYTE] &= !RCODE_MASK;
        self.octets[RCODE_BYTE] |= u8::from(rcode) & RCODE_MASK;
    }

    /// Returns the current number of questions in the message.
    pub fn qdcount(&self) -> u16 {
        self.qdcount
    }

    /// Returns the current number of answer RRs in the message.
    pub fn ancount(&self) -> u16 {
        self.ancount
    }

    /// Returns the current number of authority RRs in the message.
    pub fn nscount(&self) -> u16 {
        self.nscount
    }

    /// Returns the current number of additional RRs in the message.
    pub fn arcount(&self) -> u16 {
        self.arcount
    }

    /// Adds a question to message. This must be used before any
    /// resource records are added.
    pub fn add_question(&mut self, question: &Question) -> Result<()> {
        if self.section != Section::Question {
            Err(Error::OutOfOrder)
        } else if let Some(new_qdcount) = self.qdcount.checked_add(1) {
            self.with_rollback(|this| {
                this.try_push(question.qname.wire_repr())?;
                this.try_push_u16(question.qtype.into())?;
                this.try_push_u16(question.qclass.into())
            })?;
            self.qdcount = new_qdcount;
            Ok(())
        } else {
            Err(Error::CountOverflow)
        }
    }

    /// Adds a resource record owned by `owner` to the answer section of
    /// the message. This must be used after any questions are added and
    /// before RRs are added to any other section.
    pub fn add_answer(&mut self, owner: &Name, record: &Record) -> Result<()> {
        let new_ancount = self.ancount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.change_section_to(Section::Answer)?;
            this.add_rr(owner, record)
        })?;
        self.ancount = new_ancount;
        Ok(())
    }

    /// Adds a resource record owned by `owner` to the authority section
    /// of the message. This must be used after any questions and answer
    /// RRs are added and before any additional RRs are added.
    pub fn add_authority(&mut self, owner: &Name, record: &Record) -> Result<()> {
        let new_nscount = self.nscount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.change_section_to(Section::Authority)?;
            this.add_rr(owner, record)
        })?;
        self.nscount = new_nscount;
        Ok(())
    }

    /// Adds a resource record owned by `owner` to the additional section
    /// of the message. This must be used after any questions and any RRs
    /// in other sections are added.
    pub fn add_additional(&mut self, owner: &Name, record: &Record) -> Result<()> {
        let new_arcount = self.arcount.checked_add(1).ok_or(Error::CountOverflow)?;
        self.with_rollback(|this| {
            this.change_section_to(Section::Additional)?;
            this.add_rr(owner, record)
        })?;
        self.arcount = new_arcount;
        Ok(())
    }

    /// Changes the current section to `section`, if that does not move
    /// backwards through the message.
    fn change_section_to(&mut self, section: Section) -> Result<()> {
        let rank = |s: Section| match s {
            Section::Question => 0,
            Section::Answer => 1,
            Section::Authority => 2,
            Section::Additional => 3,
        };
        if rank(section) < rank(self.section) {
            Err(Error::OutOfOrder)
        } else {
            self.section = section;
            Ok(())
        }
    }

    /// Writes out an RR at the current cursor. This is for internal
    /// use: the write is not done atomically and may change the cursor
    /// even when an error is returned. This is intended to be used with
    /// [`Writer::with_rollback`].
    fn add_rr(&mut self, owner: &Name, record: &Record) -> Result<()> {
        self.try_push(owner.wire_repr())?;
        self.try_push_u16(record.rr_type().into())?;
        self.try_push_u16(record.class.into())?;
        self.try_push_u32(record.ttl.into())?;

        // Save two octets for the RDLENGTH field, which is known only
        // once the RDATA has been written.
        let rdlength_start = self.cursor;
        self.try_push_u16(0)?;
        self.write_rdata(&record.data)?;
        let rdlength = self.cursor - rdlength_start - 2;
        self.write_u16(rdlength_start, rdlength as u16);
        Ok(())
    }

    /// Writes the RDATA of a record, using the encoder for its type.
    fn write_rdata(&mut self, data: &RecordData) -> Result<()> {
        match data {
            RecordData::A(address) => self.try_push(&address.octets()),
            RecordData::Aaaa(address) => self.try_push(&address.octets()),
            RecordData::Ns(name) | RecordData::Cname(name) => self.try_push(name.wire_repr()),
            RecordData::Mx {
                preference,
                exchange,
            } => {
                self.try_push_u16(*preference)?;
                self.try_push(exchange.wire_repr())
            }
            RecordData::Txt(text) => self.write_character_strings(text),
            RecordData::Soa(soa) => self.write_soa(soa),
        }
    }

    /// Writes `text` as a sequence of <character-string>s of at most
    /// 255 octets each. Empty text is written as a single empty
    /// <character-string>, since TXT RDATA may not be empty.
    fn write_character_strings(&mut self, text: &[u8]) -> Result<()> {
        if text.is_empty() {
            return self.try_push(&[0]);
        }
        for chunk in text.chunks(MAX_CHARACTER_STRING_LEN) {
            self.try_push(&[chunk.len() as u8])?;
            self.try_push(chunk)?;
        }
        Ok(())
    }

    fn write_soa(&mut self, soa: &Soa) -> Result<()> {
        self.try_push(soa.mname.wire_repr())?;
        self.try_push(soa.rname.wire_repr())?;
        for field in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
            self.try_push_u32(field)?;
        }
        Ok(())
    }

    /// Finishes writing the message by filling in the section counts
    /// of the header. The final length of the message is returned.
    pub fn finish(mut self) -> usize {
        self.write_u16(QDCOUNT_START, self.qdcount);
        self.write_u16(ANCOUNT_START, self.ancount);
        self.write_u16(NSCOUNT_START, self.nscount);
        self.write_u16(ARCOUNT_START, self.arcount);
        self.cursor
    }

    /// Executes `f(self)`, returning the result and rolling back the
    /// section and cursor to the current values first if the result is
    /// an error.
    fn with_rollback<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_section = self.section;
        let saved_cursor = self.cursor;
        let result = f(self);
        if result.is_err() {
            self.section = saved_section;
            self.cursor = saved_cursor;
        }
        result
    }

    fn set_bit(&mut self, byte: usize, mask: u8, value: bool) {
        if value {
            self.octets[byte] |= mask;
        } else {
            self.octets[byte] &= !mask;
        }
    }

    /// Tries to write `data` to the underlying buffer at the current
    /// cursor, failing if there is not sufficient space.
    fn try_push(&mut self, data: &[u8]) -> Result<()> {
        if self.limit - self.cursor >= data.len() {
            self.write(self.cursor, data);
            self.cursor += data.len();
            Ok(())
        } else {
            Err(Error::Truncation)
        }
    }

    /// Tries to write `data` in network byte order to the underlying
    /// buffer, failing if there is not sufficient space.
    fn try_push_u16(&mut self, data: u16) -> Result<()> {
        self.try_push(&data.to_be_bytes())
    }

    /// Tries to write `data` in network byte order to the underlying
    /// buffer, failing if there is not sufficient space.
    fn try_push_u32(&mut self, data: u32) -> Result<()> {
        self.try_push(&data.to_be_bytes())
    }

    /// Writes `data` to the underlying buffer at `position`. Note that
    /// this performs no bounds checking.
    fn write(&mut self, position: usize, data: &[u8]) {
        self.octets[position..position + data.len()].copy_from_slice(data);
    }

    /// Writes `data` in network byte order to the underlying buffer at
    /// `position`. Note that this performs no bounds checking.
    fn write_u16(&mut self, position: usize, data: u16) {
        self.write(position, &data.to_be_bytes());
    }
}

impl<'a> TryFrom<&'a mut [u8]> for Writer<'a> {
    type Error = Error;

    fn try_from(octets: &'a mut [u8]) -> Result<Self> {
        let limit = octets.len();
        Self::new(octets, limit)
    }
}

impl fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Writer")
            .field("cursor", &self.cursor)
            .field("limit", &self.limit)
            .field("section", &self.section)
            .field("qdcount", &self.qdcount)
            .field("ancount", &self.ancount)
            .field("nscount", &self.nscount)
            .field("arcount", &self.arcount)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a [`Writer`] operation could not be
/// performed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// Adding the question or resource record would overflow the
    /// corresponding 16-bit counter in the DNS header.
    CountOverflow,

    /// There is not enough room left in the buffer.
    Truncation,

    /// An attempt was made to serialize a question or resource record
    /// in the wrong place in the message (e.g., adding a question after
    /// an answer resource record has already been serialized).
    OutOfOrder,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::CountOverflow => f.write_str("record count would overflow"),
            Self::Truncation => f.write_str("message would be truncated"),
            Self::OutOfOrder => f.write_str("question or record serialized out of order"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible [`Writer`] methods.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use lazy_static::lazy_static;

    use super::*;
    use crate::class::Class;
    use crate::rr::{Ttl, Type};

    lazy_static! {
        static ref NAME: Name = "qdns.test.".parse().unwrap();
        static ref QUESTION: Question = Question {
            qname: NAME.clone(),
            qtype: Type::A.into(),
            qclass: Class::IN.into(),
        };
        static ref RECORD: Record = Record::new(
            Class::IN,
            Ttl::from(3600),
            RecordData::A(Ipv4Addr::new(127, 0, 0, 1)),
        );
    }

    fn record(data: RecordData) -> Record {
        Record::new(Class::IN, Ttl::from(3600), data)
    }

    #[test]
    fn writer_works() {
        let mut buf = vec![0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer.set_id(0x0703);
        writer.set_opcode(Opcode::Query);
        writer.set_qr(true);
        writer.set_aa(true);
        writer.set_rcode(Rcode::NoError);
        writer.add_question(&QUESTION).unwrap();
        writer.add_answer(&NAME, &RECORD).unwrap();
        let len = writer.finish();
        assert_eq!(
            &buf[0..len],
            b"\x07\x03\x84\x00\x00\x01\x00\x01\x00\x00\x00\x00\
              \x04qdns\x04test\x00\x00\x01\x00\x01\
              \x04qdns\x04test\x00\x00\x01\x00\x01\x00\x00\x0e\x10\x00\x04\
              \x7f\x00\x00\x01"
        );
    }

    #[test]
    fn header_setters_touch_only_their_bits() {
        let mut buf = [0xff; 12];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer.set_opcode(Opcode::Status);
        writer.set_rcode(Rcode::NxDomain);
        writer.set_tc(true);
        writer.set_ra(true);
        assert_eq!(writer.opcode(), Opcode::Status);
        assert_eq!(writer.rcode(), Rcode::NxDomain);
        assert!(writer.tc());
        assert!(!writer.aa());
        assert!(!writer.rd());
        writer.set_tc(false);
        assert!(!writer.tc());
        assert!(writer.ra());
        let len = writer.finish();
        assert_eq!(&buf[..len], b"\x00\x00\x10\x83\x00\x00\x00\x00\x00\x00\x00\x00");
    }

    #[test]
    fn writer_detects_qdcount_overflow() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer.qdcount = u16::MAX;
        assert_eq!(writer.add_question(&QUESTION), Err(Error::CountOverflow));
        writer.ancount = u16::MAX;
        assert_eq!(writer.add_answer(&NAME, &RECORD), Err(Error::CountOverflow));
    }

    #[test]
    fn writer_enforces_ordering() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer.add_question(&QUESTION).unwrap();
        writer.add_question(&QUESTION).unwrap();
        writer.add_answer(&NAME, &RECORD).unwrap();
        assert_eq!(writer.add_question(&QUESTION), Err(Error::OutOfOrder));
        writer.add_additional(&NAME, &RECORD).unwrap();
        assert_eq!(writer.add_authority(&NAME, &RECORD), Err(Error::OutOfOrder));
        assert_eq!(writer.add_answer(&NAME, &RECORD), Err(Error::OutOfOrder));
        writer.add_additional(&NAME, &RECORD).unwrap();
        assert_eq!(
            (writer.qdcount(), writer.ancount(), writer.nscount(), writer.arcount()),
            (2, 1, 0, 2)
        );
    }

    #[test]
    fn sections_may_be_skipped() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer.add_question(&QUESTION).unwrap();
        writer.add_authority(&NAME, &RECORD).unwrap();
        writer.add_authority(&NAME, &RECORD).unwrap();
        assert_eq!(writer.nscount(), 2);
    }

    #[test]
    fn writer_constructors_reject_short_buffers() {
        let mut big_buf = [0; 512];
        for size in 0..HEADER_SIZE {
            let mut exact_buf = vec![0; size];
            assert!(matches!(
                Writer::new(big_buf.as_mut_slice(), size),
                Err(Error::Truncation),
            ));
            assert!(matches!(
                Writer::try_from(exact_buf.as_mut_slice()),
                Err(Error::Truncation),
            ));
        }
    }

    #[test]
    fn truncated_additions_are_rolled_back() {
        // Room for the header and the question, plus part of an RR.
        let limit = HEADER_SIZE + 15 + 10;
        let mut buf = [0; 512];
        let mut writer = Writer::new(buf.as_mut_slice(), limit).unwrap();
        writer.add_question(&QUESTION).unwrap();
        assert_eq!(writer.add_question(&QUESTION), Err(Error::Truncation));
        assert_eq!(writer.add_answer(&NAME, &RECORD), Err(Error::Truncation));
        assert_eq!(writer.qdcount(), 1);
        assert_eq!(writer.ancount(), 0);

        // The failed answer did not move the writer out of the question
        // section.
        writer
            .add_question(&Question {
                qname: Name::root(),
                qtype: Type::A.into(),
                qclass: Class::IN.into(),
            })
            .unwrap();
        assert_eq!(writer.finish(), HEADER_SIZE + 15 + 5);
    }

    #[test]
    fn rdata_encoders_work() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        let root = Name::root();
        writer
            .add_answer(
                &root,
                &record(RecordData::Mx {
                    preference: 10,
                    exchange: "mx.test.".parse().unwrap(),
                }),
            )
            .unwrap();
        writer
            .add_answer(&root, &record(RecordData::Aaaa("::1".parse().unwrap())))
            .unwrap();
        let len = writer.finish();
        assert_eq!(
            &buf[HEADER_SIZE..len],
            b"\x00\x00\x0f\x00\x01\x00\x00\x0e\x10\x00\x0b\x00\x0a\x02mx\x04test\x00\
              \x00\x00\x1c\x00\x01\x00\x00\x0e\x10\x00\x10\
              \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x01"
        );
    }

    #[test]
    fn soa_rdata_is_names_then_five_integers() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        let soa = Soa {
            mname: "a.test.".parse().unwrap(),
            rname: "b.test.".parse().unwrap(),
            serial: 1,
            refresh: 2,
            retry: 3,
            expire: 4,
            minimum: 5,
        };
        writer
            .add_authority(&Name::root(), &record(RecordData::Soa(Box::new(soa))))
            .unwrap();
        let len = writer.finish();
        assert_eq!(
            &buf[HEADER_SIZE + 9..len],
            b"\x00\x24\x01a\x04test\x00\x01b\x04test\x00\
              \x00\x00\x00\x01\x00\x00\x00\x02\x00\x00\x00\x03\x00\x00\x00\x04\x00\x00\x00\x05"
        );
    }

    #[test]
    fn long_txt_is_split_into_character_strings() {
        let mut buf = [0; 1024];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        let text = vec![b'x'; 300].into_boxed_slice();
        writer
            .add_answer(&Name::root(), &record(RecordData::Txt(text)))
            .unwrap();
        let len = writer.finish();
        let rdata = &buf[HEADER_SIZE + 11..len];
        assert_eq!(&buf[HEADER_SIZE + 9..HEADER_SIZE + 11], &302u16.to_be_bytes());
        assert_eq!(rdata[0], 255);
        assert_eq!(rdata[256], 45);
        assert_eq!(rdata.len(), 302);
    }

    #[test]
    fn empty_txt_is_one_empty_character_string() {
        let mut buf = [0; 512];
        let mut writer = Writer::try_from(buf.as_mut_slice()).unwrap();
        writer
            .add_answer(&Name::root(), &record(RecordData::Txt(Box::new([]))))
            .unwrap();
        let len = writer.finish();
        assert_eq!(&buf[HEADER_SIZE + 9..len], b"\x00\x01\x00");
    }
}
