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

//! Implementation of record lookup within a zone.
//!
//! Once the zone for a query has been found in the
//! [`Catalog`](super::Catalog), [`Zone::find_resource_record`] strips
//! the zone's origin from the QNAME and searches the zone's trie with
//! the resulting relative key. Every record stored at that key ends up
//! in the response: the records whose TYPE and CLASS match the QTYPE
//! and QCLASS exactly are answers, and all others are placed in the
//! authority section. Names found in the RDATA of NS and MX answers
//! are then looked up in the zone, and their address records are
//! placed in the additional section.
//!
//! A QNAME that owns no records but is an empty non-terminal of the
//! zone gets an empty NOERROR result with the zone's SOA record in the
//! authority section.

use crate::class::Class;
use crate::message::{MessageRr, Qclass, Qtype, Question, Rcode};
use crate::name::Name;
use crate::rr::{Record, RecordData, Type};

use super::{LookupError, Zone};

/// The records found for a question by [`Zone::find_resource_record`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryResult<'a> {
    pub answers: Vec<MessageRr<'a>>,
    pub authority: Vec<MessageRr<'a>>,
    pub additional: Vec<MessageRr<'a>>,
    pub rcode: Rcode,
}

impl QueryResult<'_> {
    /// Returns the number of answer records.
    pub fn ancount(&self) -> usize {
        self.answers.len()
    }

    /// Returns the number of authority records.
    pub fn nscount(&self) -> usize {
        self.authority.len()
    }

    /// Returns the number of additional records.
    pub fn arcount(&self) -> usize {
        self.additional.len()
    }
}

impl Zone {
    /// Finds the records that answer `question`.
    ///
    /// This fails with [`LookupError::OriginMismatch`] if the QNAME is
    /// not within the zone, and with [`LookupError::RecordNotFound`] if
    /// the QNAME does not exist in the zone (the zone's SOA record is
    /// considered to be stored at the apex).
    pub fn find_resource_record(
        &self,
        question: &Question,
    ) -> Result<QueryResult<'_>, LookupError> {
        let key = question
            .qname
            .relative_to(self.origin())
            .ok_or(LookupError::OriginMismatch)?;

        let soa = self.soa().filter(|_| key.is_empty());
        let stored = self.records_at(&key);
        if stored.is_empty() && soa.is_none() {
            if !self.is_empty_non_terminal(&key) {
                return Err(LookupError::RecordNotFound);
            }
            let authority = self
                .soa()
                .map(|soa| MessageRr::new(self.origin().clone(), soa))
                .into_iter()
                .collect();
            return Ok(QueryResult {
                authority,
                ..Default::default()
            });
        }

        let mut result = QueryResult::default();
        for record in soa.into_iter().chain(stored) {
            let rr = MessageRr::new(question.qname.clone(), record);
            if matches_question(record, question.qtype, question.qclass) {
                result.answers.push(rr);
            } else {
                result.authority.push(rr);
            }
        }
        self.add_additional_addresses(&mut result);
        Ok(result)
    }

    /// Adds the address records of in-zone names that appear in the
    /// RDATA of NS and MX answers to the additional section.
    fn add_additional_addresses<'a>(&'a self, result: &mut QueryResult<'a>) {
        let mut targets: Vec<(&'a Name, Class)> = Vec::new();
        for rr in &result.answers {
            let record: &'a Record = rr.record;
            let target = match &record.data {
                RecordData::Ns(name) => name,
                RecordData::Mx { exchange, .. } => exchange,
                _ => continue,
            };
            if !targets.contains(&(target, record.class)) {
                targets.push((target, record.class));
            }
        }

        for (target, class) in targets {
            let key = match target.relative_to(self.origin()) {
                Some(key) => key,
                None => continue,
            };
            for record in self.records_at(&key) {
                if record.class == class && matches!(record.rr_type(), Type::A | Type::AAAA) {
                    result
                        .additional
                        .push(MessageRr::new(target.clone(), record));
                }
            }
        }
    }
}

/// Returns whether `record` exactly matches the QTYPE and QCLASS.
fn matches_question(record: &Record, qtype: Qtype, qclass: Qclass) -> bool {
    Qtype::from(record.rr_type()) == qtype && Qclass::from(record.class) == qclass
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::super::tests::soa_record;
    use super::*;
    use crate::rr::Ttl;

    fn record(data: RecordData) -> Record {
        Record::new(Class::IN, Ttl::from(300), data)
    }

    fn question(qname: &str, qtype: Type) -> Question {
        Question {
            qname: qname.parse().unwrap(),
            qtype: qtype.into(),
            qclass: Class::IN.into(),
        }
    }

    fn example_zone() -> Zone {
        let mut zone = Zone::new("example.com.".parse().unwrap());
        zone.insert("", soa_record()).unwrap();
        zone.insert("", record(RecordData::Ns("ns1.example.com.".parse().unwrap())))
            .unwrap();
        zone.insert("", record(RecordData::Ns("ns.example.net.".parse().unwrap())))
            .unwrap();
        zone.insert(
            "",
            record(RecordData::Mx {
                preference: 10,
                exchange: "mail.example.com.".parse().unwrap(),
            }),
        )
        .unwrap();
        zone.insert("ns1", record(RecordData::A(Ipv4Addr::new(192, 0, 2, 53))))
            .unwrap();
        zone.insert("mail", record(RecordData::A(Ipv4Addr::new(192, 0, 2, 25))))
            .unwrap();
        zone.insert("mail", record(RecordData::Aaaa(Ipv6Addr::LOCALHOST)))
            .unwrap();
        zone.insert("www", record(RecordData::A(Ipv4Addr::new(93, 184, 216, 34))))
            .unwrap();
        zone.insert("www", record(RecordData::Aaaa(Ipv6Addr::LOCALHOST)))
            .unwrap();
        zone.insert("a.b", record(RecordData::Txt(Box::new(*b"deep"))))
            .unwrap();
        zone
    }

    #[test]
    fn matching_records_are_answers_and_others_authority() {
        let zone = example_zone();
        let result = zone
            .find_resource_record(&question("WWW.example.com.", Type::A))
            .unwrap();
        assert_eq!(result.rcode, Rcode::NoError);
        assert_eq!(result.ancount(), 1);
        assert_eq!(result.answers[0].record.value(), "93.184.216.34");
        assert_eq!(result.answers[0].owner, "www.example.com.".parse().unwrap());
        assert_eq!(result.nscount(), 1);
        assert_eq!(result.authority[0].record.rr_type(), Type::AAAA);
        assert_eq!(result.arcount(), 0);
    }

    #[test]
    fn class_must_match_too() {
        let zone = example_zone();
        let mut question = question("www.example.com.", Type::A);
        question.qclass = Class::CH.into();
        let result = zone.find_resource_record(&question).unwrap();
        assert_eq!(result.ancount(), 0);
        assert_eq!(result.nscount(), 2);
    }

    #[test]
    fn soa_is_found_at_apex() {
        let zone = example_zone();
        let result = zone
            .find_resource_record(&question("example.com.", Type::SOA))
            .unwrap();
        assert_eq!(result.ancount(), 1);
        assert_eq!(result.answers[0].record, &soa_record());
        assert_eq!(result.nscount(), 3);
    }

    #[test]
    fn ns_and_mx_answers_get_in_zone_addresses() {
        let zone = example_zone();
        let ns = zone
            .find_resource_record(&question("example.com.", Type::NS))
            .unwrap();
        assert_eq!(ns.ancount(), 2);
        assert_eq!(ns.arcount(), 1);
        assert_eq!(ns.additional[0].owner, "ns1.example.com.".parse().unwrap());
        assert_eq!(ns.additional[0].record.value(), "192.0.2.53");

        let mx = zone
            .find_resource_record(&question("example.com.", Type::MX))
            .unwrap();
        assert_eq!(mx.ancount(), 1);
        assert_eq!(mx.arcount(), 2);
    }

    #[test]
    fn missing_names_are_not_found() {
        let zone = example_zone();
        for qname in ["ftp.example.com.", "a.example.com.", "x.a.b.example.com."] {
            assert_eq!(
                zone.find_resource_record(&question(qname, Type::A)),
                Err(LookupError::RecordNotFound)
            );
        }
    }

    #[test]
    fn empty_non_terminals_get_empty_answers() {
        let zone = example_zone();
        let result = zone
            .find_resource_record(&question("B.example.com.", Type::A))
            .unwrap();
        assert_eq!(result.rcode, Rcode::NoError);
        assert_eq!(result.ancount(), 0);
        assert_eq!(result.arcount(), 0);
        assert_eq!(result.nscount(), 1);
        assert_eq!(result.authority[0].record, &soa_record());
        assert_eq!(result.authority[0].owner, "example.com.".parse().unwrap());
    }

    #[test]
    fn names_outside_zone_are_rejected() {
        let zone = example_zone();
        assert_eq!(
            zone.find_resource_record(&question("www.example.net.", Type::A)),
            Err(LookupError::OriginMismatch)
        );
    }
}
