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

//! Implementation of the [`Record`] type and its typed RDATA.

use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Ttl, Type};
use crate::class::Class;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RECORDS                                                            //
////////////////////////////////////////////////////////////////////////

/// A resource record as stored in a [`Zone`](crate::zone::Zone).
///
/// The owner is not stored: a record lives in the zone under its owner's
/// relative key, and responses use the QNAME as the owner. The RR type
/// is implied by the [`RecordData`] variant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub class: Class,
    pub ttl: Ttl,
    pub data: RecordData,
}

impl Record {
    /// Creates a new `Record`.
    pub fn new(class: Class, ttl: Ttl, data: RecordData) -> Self {
        Self { class, ttl, data }
    }

    /// Returns the RR type of the record.
    pub fn rr_type(&self) -> Type {
        self.data.rr_type()
    }

    /// Returns the textual form of the record's RDATA value: an address
    /// literal, a domain name, or text. For MX records this is the
    /// exchange (see [`Record::preference`]).
    pub fn value(&self) -> String {
        match &self.data {
            RecordData::A(address) => address.to_string(),
            RecordData::Aaaa(address) => address.to_string(),
            RecordData::Ns(name) | RecordData::Cname(name) => name.to_string(),
            RecordData::Mx { exchange, .. } => exchange.to_string(),
            RecordData::Txt(text) => String::from_utf8_lossy(text).into_owned(),
            RecordData::Soa(soa) => soa.mname.to_string(),
        }
    }

    /// Returns the preference of an MX record, or [`None`] for other
    /// types.
    pub fn preference(&self) -> Option<u16> {
        match self.data {
            RecordData::Mx { preference, .. } => Some(preference),
            _ => None,
        }
    }
}

/// The typed RDATA of a [`Record`].
///
/// This is a closed set: only these RR types can be loaded from zone
/// files and served. The [`Soa`] variant never appears in a zone's
/// record trie; a zone keeps its SOA data separately.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(Name),
    Cname(Name),
    Mx { preference: u16, exchange: Name },
    Txt(Box<[u8]>),
    Soa(Box<Soa>),
}

impl RecordData {
    /// Returns the RR type corresponding to the variant.
    pub fn rr_type(&self) -> Type {
        match self {
            Self::A(_) => Type::A,
            Self::Aaaa(_) => Type::AAAA,
            Self::Ns(_) => Type::NS,
            Self::Cname(_) => Type::CNAME,
            Self::Mx { .. } => Type::MX,
            Self::Txt(_) => Type::TXT,
            Self::Soa(_) => Type::SOA,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// SOA DATA                                                           //
////////////////////////////////////////////////////////////////////////

/// The data of a zone's SOA record ([RFC 1035 § 3.3.13]).
///
/// [RFC 1035 § 3.3.13]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3.13
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Soa {
    pub mname: Name,
    pub rname: Name,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
