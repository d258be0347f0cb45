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

//! The processing logic of an authoritative DNS server.
//!
//! The [`Server`] structure is the heart of this module; see its
//! documentation for details.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use log::debug;

use crate::message::{
    Header, Message, MessageRr, Opcode, Question, Rcode, MAX_UDP_MESSAGE_SIZE,
};
use crate::zone::{Catalog, LookupError, Zone};

////////////////////////////////////////////////////////////////////////
// SERVER PUBLIC API AND CORE MESSAGE-HANDLING LOGIC                  //
////////////////////////////////////////////////////////////////////////

/// An authoritative DNS server, abstracted from any underlying network
/// I/O provider.
///
/// The [`Server`] structure implements the message-processing logic of
/// an authoritative DNS server. It receives, parses, and responds to
/// DNS messages through the [`Server::handle_message`] method. An
/// underlying network I/O provider is responsible for receiving these
/// messages from the network and then sending the responses that the
/// [`Server`] produces.
///
/// Responses are produced from a [`Catalog`] of zones that is built
/// before the server starts and never changes afterward. Since the
/// catalog is only read, any number of threads may handle messages at
/// once without locking.
///
/// Handling a message goes through these stages:
///
/// 1. The message is decoded (see [`Message::decode`]). Undecodable
///    messages are dropped.
/// 2. The header is validated (see [`Rejection`]). Responses, inverse
///    queries, status requests, and queries without a question are
///    dropped.
/// 3. The zone for the question is found in the catalog. If there is
///    none, the response is an NXDOMAIN error.
/// 4. The records for the question are looked up in the zone (see
///    [`Zone::find_resource_record`]).
/// 5. The response is built and encoded, and handed back to the I/O
///    provider to send.
pub struct Server {
    catalog: Arc<Catalog>,
}

impl Server {
    /// Creates a new `Server` that will serve the provided catalog.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Returns the catalog of the server.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Handles a received DNS message. This is the API through which
    /// I/O providers submit messages.
    ///
    /// `received_buf` contains the message received, and `received_info`
    /// provides additional information about it (see [`ReceivedInfo`]).
    /// `response_buf` is a buffer into which a response message may be
    /// serialized. It must be at least 512 octets long, the maximum
    /// size of a UDP response; otherwise this method will panic.
    ///
    /// A [`Response`] is returned, signifying whether a response is to
    /// be sent and, if so, how long the response message written into
    /// `response_buf` is.
    pub fn handle_message(
        &self,
        received_buf: &[u8],
        received_info: ReceivedInfo,
        response_buf: &mut [u8],
    ) -> Response {
        if response_buf.len() < MAX_UDP_MESSAGE_SIZE {
            panic!("the response buffer is not large enough");
        }

        let query = match Message::decode(received_buf) {
            Ok(query) => query,
            Err(e) => {
                debug!("Dropping message from {}: {}", received_info.source, e);
                return Response::None;
            }
        };

        match self.respond(&query) {
            Ok(response) => {
                Response::Single(response.encode_into(response_buf, MAX_UDP_MESSAGE_SIZE))
            }
            Err(rejection) => {
                debug!(
                    "Dropping message {} from {}: {}",
                    query.header.id, received_info.source, rejection,
                );
                Response::None
            }
        }
    }

    /// Builds the response to a decoded query, or returns why no
    /// response should be sent.
    ///
    /// The response copies the query's ID, opcode, questions, and RD
    /// bit. It always has QR and RA set and Z cleared. Queries with a
    /// reserved opcode get a NOTIMP response.
    pub fn respond(&self, query: &Message) -> Result<Message<'_>, Rejection> {
        validate(&query.header, &query.questions)?;

        let mut response = Message {
            header: Header {
                id: query.header.id,
                qr: true,
                opcode: query.header.opcode,
                rd: query.header.rd,
                ra: true,
                ..Default::default()
            },
            questions: query.questions.clone(),
            ..Default::default()
        };

        if query.header.opcode == Opcode::Query {
            self.answer(&query.questions, &mut response);
        } else {
            response.header.rcode = Rcode::NotImp;
        }
        Ok(response)
    }

    /// Fills in the answer to a standard query. Only queries with
    /// exactly one question are answered; others get an empty NOERROR
    /// response.
    fn answer<'a>(&'a self, questions: &[Question], response: &mut Message<'a>) {
        let question = match questions {
            [question] => question,
            _ => return,
        };

        let zone = match self.catalog.find_zone(&question.qname) {
            Ok(zone) => zone,
            Err(_) => {
                response.header.rcode = Rcode::NxDomain;
                return;
            }
        };

        match zone.find_resource_record(question) {
            Ok(result) => {
                response.header.aa = true;
                response.header.rcode = result.rcode;
                response.answers = result.answers;
                response.authority = result.authority;
                response.additional = result.additional;
            }
            Err(LookupError::RecordNotFound) => {
                response.header.aa = true;
                response.header.rcode = Rcode::NxDomain;
                response.authority.extend(soa_rr(zone));
            }
            Err(LookupError::ZoneNotFound | LookupError::OriginMismatch) => {
                response.header.rcode = Rcode::NxDomain;
            }
        }
    }
}

/// Returns the SOA record of `zone`, owned by the zone's origin, for
/// the authority section of negative responses.
fn soa_rr(zone: &Zone) -> Option<MessageRr<'_>> {
    zone.soa()
        .map(|soa| MessageRr::new(zone.origin().clone(), soa))
}

/// Checks whether a query should be answered at all.
fn validate(header: &Header, questions: &[Question]) -> Result<(), Rejection> {
    if header.qr {
        Err(Rejection::IsResponse)
    } else {
        match header.opcode {
            Opcode::Query if questions.is_empty() => Err(Rejection::NoQuestion),
            Opcode::IQuery => Err(Rejection::InverseQuery),
            Opcode::Status => Err(Rejection::StatusRequest),
            _ => Ok(()),
        }
    }
}

/// Provides network-related information about a received DNS message to
/// [`Server::handle_message`].
#[derive(Clone, Copy, Debug)]
pub struct ReceivedInfo {
    source: IpAddr,
}

impl ReceivedInfo {
    /// Creates a new [`ReceivedInfo`]. IPv4-mapped IPv6 addresses of
    /// the kind that dual-stack sockets produce (e.g.
    /// `::ffff:127.0.0.1`) are converted to IPv4 addresses.
    pub fn new(source: IpAddr) -> Self {
        let source = match source {
            IpAddr::V6(ipv6) => ipv6.to_ipv4_mapped().map_or(source, IpAddr::V4),
            IpAddr::V4(_) => source,
        };
        Self { source }
    }

    /// Returns the address the message came from.
    pub fn source(&self) -> IpAddr {
        self.source
    }
}

/// Indicates to the caller of [`Server::handle_message`] what kind of
/// response needs to be sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Response {
    /// A single response is to be sent. The response has been written
    /// into the provided buffer. The length of the response is
    /// included.
    Single(usize),

    /// No response is to be sent.
    None,
}

////////////////////////////////////////////////////////////////////////
// REJECTIONS                                                         //
////////////////////////////////////////////////////////////////////////

/// The reasons a decoded message is dropped without a response.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Rejection {
    /// The message is itself a response.
    IsResponse,

    /// The message is a standard query without a question.
    NoQuestion,

    /// The message is an inverse query (opcode 1).
    InverseQuery,

    /// The message is a server status request (opcode 2).
    StatusRequest,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IsResponse => f.write_str("message is a response"),
            Self::NoQuestion => f.write_str("query has no question"),
            Self::InverseQuery => f.write_str("inverse queries are not supported"),
            Self::StatusRequest => f.write_str("status requests are not supported"),
        }
    }
}

impl std::error::Error for Rejection {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::Ipv6Addr;

    use lazy_static::lazy_static;

    use super::*;
    use crate::class::Class;
    use crate::message::Reader;
    use crate::name::Name;
    use crate::rr::Type;
    use crate::zone_file::Parser;

    const EXAMPLE_ZONE: &str = "\
$ORIGIN example.com.
$TTL 3600
@    IN  SOA ns1.example.com. admin.example.com. ( 1 3600 600 86400 3600 )
@    IN  NS  ns1
ns1  IN  A   192.0.2.53
www  IN  A   93.184.216.34
mail.corp IN A 192.0.2.25
big  IN  TXT aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa
     IN  TXT bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb
     IN  TXT cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc
     IN  TXT dddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddddd
     IN  TXT eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee
";

    lazy_static! {
        static ref SERVER: Server = {
            let mut zone = Zone::new(Name::root());
            Parser::new(Cursor::new(EXAMPLE_ZONE), &mut zone)
                .parse()
                .unwrap();
            let mut catalog = Catalog::new();
            catalog.insert(zone).unwrap();
            Server::new(Arc::new(catalog))
        };
    }

    fn query(qname: &str, rr_type: Type) -> Message<'static> {
        Message {
            header: Header {
                id: 0x1234,
                rd: true,
                ..Default::default()
            },
            questions: vec![Question {
                qname: qname.parse().unwrap(),
                qtype: rr_type.into(),
                qclass: Class::IN.into(),
            }],
            ..Default::default()
        }
    }

    fn handle(query: &Message) -> Option<Vec<u8>> {
        let mut response_buf = [0; MAX_UDP_MESSAGE_SIZE];
        let received_info = ReceivedInfo::new(IpAddr::V6(Ipv6Addr::LOCALHOST));
        match SERVER.handle_message(&query.encode(), received_info, &mut response_buf) {
            Response::Single(len) => Some(response_buf[..len].to_vec()),
            Response::None => None,
        }
    }

    #[test]
    fn query_is_answered_end_to_end() {
        let query = query("www.example.com.", Type::A);
        let response = SERVER.respond(&query).unwrap();
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].record.value(), "93.184.216.34");

        let encoded = handle(&query).unwrap();
        let reader = Reader::try_from(encoded.as_slice()).unwrap();
        assert_eq!(reader.id(), 0x1234);
        assert!(reader.qr());
        assert!(reader.aa());
        assert!(!reader.tc());
        assert!(reader.rd());
        assert!(reader.ra());
        assert_eq!(reader.z(), 0);
        assert_eq!(reader.opcode(), Opcode::Query);
        assert_eq!(reader.rcode(), Rcode::NoError);
        assert_eq!(reader.qdcount(), 1);
        assert_eq!(reader.ancount(), 1);

        let decoded = Message::decode(&encoded).unwrap();
        assert_eq!(decoded.questions, query.questions);
    }

    #[test]
    fn ns_answers_carry_glue() {
        let response = SERVER
            .respond(&query("example.com.", Type::NS))
            .unwrap();
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.additional.len(), 1);
        assert_eq!(response.additional[0].record.value(), "192.0.2.53");
    }

    #[test]
    fn missing_names_get_nxdomain_with_soa() {
        let response = SERVER
            .respond(&query("ftp.example.com.", Type::A))
            .unwrap();
        assert!(response.header.aa);
        assert_eq!(response.header.rcode, Rcode::NxDomain);
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].record.rr_type(), Type::SOA);
        assert_eq!(response.authority[0].owner, "example.com.".parse().unwrap());
    }

    #[test]
    fn empty_non_terminals_get_nodata_with_soa() {
        let response = SERVER
            .respond(&query("corp.example.com.", Type::A))
            .unwrap();
        assert!(response.header.aa);
        assert_eq!(response.header.rcode, Rcode::NoError);
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].record.rr_type(), Type::SOA);
        assert_eq!(response.authority[0].owner, "example.com.".parse().unwrap());
    }

    #[test]
    fn unknown_zones_get_nxdomain() {
        let response = SERVER
            .respond(&query("www.example.org.", Type::A))
            .unwrap();
        assert!(!response.header.aa);
        assert_eq!(response.header.rcode, Rcode::NxDomain);
        assert_eq!(response.questions.len(), 1);
        assert!(response.authority.is_empty());
    }

    #[test]
    fn unsupported_messages_are_dropped() {
        let mut response = query("www.example.com.", Type::A);
        response.header.qr = true;
        assert_eq!(SERVER.respond(&response), Err(Rejection::IsResponse));
        assert_eq!(handle(&response), None);

        let mut no_question = query("www.example.com.", Type::A);
        no_question.questions.clear();
        assert_eq!(SERVER.respond(&no_question), Err(Rejection::NoQuestion));

        let mut inverse = query("www.example.com.", Type::A);
        inverse.header.opcode = Opcode::IQuery;
        assert_eq!(SERVER.respond(&inverse), Err(Rejection::InverseQuery));
        assert_eq!(handle(&inverse), None);

        let mut status = query("www.example.com.", Type::A);
        status.header.opcode = Opcode::Status;
        assert_eq!(SERVER.respond(&status), Err(Rejection::StatusRequest));
    }

    #[test]
    fn undecodable_messages_are_dropped() {
        let mut response_buf = [0; MAX_UDP_MESSAGE_SIZE];
        let received_info = ReceivedInfo::new(IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(
            SERVER.handle_message(b"\x12\x34\x01", received_info, &mut response_buf),
            Response::None
        );

        // QDCOUNT = 1, but the question is cut off.
        let truncated_question = b"\x12\x34\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\x03www";
        assert_eq!(
            SERVER.handle_message(truncated_question, received_info, &mut response_buf),
            Response::None
        );
    }

    #[test]
    fn reserved_opcodes_get_notimp() {
        let mut query = query("www.example.com.", Type::A);
        query.header.opcode = Opcode::Reserved(5);
        let response = SERVER.respond(&query).unwrap();
        assert_eq!(response.header.rcode, Rcode::NotImp);
        assert_eq!(response.header.opcode, Opcode::Reserved(5));
        assert_eq!(response.questions, query.questions);
        assert!(response.answers.is_empty());
    }

    #[test]
    fn multiple_questions_get_empty_response() {
        let mut query = query("www.example.com.", Type::A);
        query.questions.push(query.questions[0].clone());
        let response = SERVER.respond(&query).unwrap();
        assert_eq!(response.header.rcode, Rcode::NoError);
        assert_eq!(response.questions.len(), 2);
        assert!(response.answers.is_empty());
        assert!(response.authority.is_empty());
    }

    #[test]
    fn large_responses_are_truncated() {
        // Each TXT answer takes 128 octets, so only three fit after the
        // 33 octets of header and question.
        let encoded = handle(&query("big.example.com.", Type::TXT)).unwrap();
        assert!(encoded.len() <= MAX_UDP_MESSAGE_SIZE);
        let reader = Reader::try_from(encoded.as_slice()).unwrap();
        assert!(reader.tc());
        assert_eq!(reader.rcode(), Rcode::NoError);
        assert_eq!(reader.ancount(), 3);
    }

    #[test]
    fn mapped_addresses_are_canonicalized() {
        let mapped: IpAddr = "::ffff:192.0.2.1".parse().unwrap();
        assert_eq!(
            ReceivedInfo::new(mapped).source(),
            "192.0.2.1".parse::<IpAddr>().unwrap()
        );
    }
}
