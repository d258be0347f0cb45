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

//! Implementation of DNS zone data structures, for keeping DNS zones
//! loaded in memory.

use std::collections::HashSet;

use crate::name::Name;
use crate::rr::{Record, Ttl, Type};
use crate::trie::DomainTrie;

mod catalog;
mod error;
mod lookup;
pub use catalog::Catalog;
pub use error::{Error, LookupError};
pub use lookup::QueryResult;

/// A DNS zone loaded into memory.
///
/// A `Zone` stores its records in a [`DomainTrie`] keyed by owner name
/// *relative to the zone's origin*: records owned by `www.example.com.`
/// in the zone `example.com.` are stored under `www`, and records owned
/// by the origin itself are stored under the empty key. The zone's SOA
/// record is kept apart from the trie.
///
/// The zone also remembers the keys of its empty non-terminals: names
/// that own no records but have descendants that do (`b` once `a.b`
/// holds records). Such names exist in the DNS sense.
///
/// `Zone`s are constructed with [`Zone::new`], which provides an empty
/// structure, and subsequent calls to [`Zone::add`] or
/// [`Zone::insert`], which add resource records to the zone. Queries
/// are answered with [`Zone::find_resource_record`].
#[derive(Debug)]
pub struct Zone {
    origin: Name,
    ttl: Ttl,
    soa: Option<Record>,
    records: DomainTrie<Record>,
    interior: HashSet<String>,
}

impl Zone {
    /// Creates a new, empty `Zone` with the given origin and a default
    /// TTL of zero.
    pub fn new(origin: Name) -> Self {
        Self {
            origin,
            ttl: Ttl::default(),
            soa: None,
            records: DomainTrie::new(),
            interior: HashSet::new(),
        }
    }

    /// Returns the zone's origin (the domain name of its apex).
    pub fn origin(&self) -> &Name {
        &self.origin
    }

    /// Changes the zone's origin. Since stored records are keyed
    /// relative to the origin, this fails once the zone holds any,
    /// unless the new origin equals the current one.
    pub fn set_origin(&mut self, origin: Name) -> Result<(), Error> {
        if self.is_empty() || origin == self.origin {
            self.origin = origin;
            Ok(())
        } else {
            Err(Error::OriginChanged)
        }
    }

    /// Returns the default TTL for records that do not specify one.
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Sets the default TTL for records that do not specify one.
    pub fn set_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl;
    }

    /// Returns the zone's SOA record, if it has one.
    pub fn soa(&self) -> Option<&Record> {
        self.soa.as_ref()
    }

    /// Returns whether the zone holds no records at all (including an
    /// SOA record).
    pub fn is_empty(&self) -> bool {
        self.soa.is_none() && self.records.is_empty()
    }

    /// Adds a record owned by `owner` to the zone.
    ///
    /// This fails if `owner` is not within the zone. See
    /// [`Zone::insert`] for the other failure conditions.
    pub fn add(&mut self, owner: &Name, record: Record) -> Result<(), Error> {
        let key = owner.relative_to(&self.origin).ok_or(Error::NotInZone)?;
        self.insert(&key, record)
    }

    /// Adds a record to the zone under the relative key `key`, which
    /// must be lower-case (see [`Name::relative_to`]).
    ///
    /// An SOA record becomes the zone's SOA record. It must be owned by
    /// the apex (the empty key), and a zone may have only one.
    pub fn insert(&mut self, key: &str, record: Record) -> Result<(), Error> {
        if record.rr_type() == Type::SOA {
            if !key.is_empty() {
                Err(Error::SoaNotAtApex)
            } else if self.soa.is_some() {
                Err(Error::DuplicateSoa)
            } else {
                self.soa = Some(record);
                Ok(())
            }
        } else {
            self.records.put(key, record).map_err(Error::Trie)?;
            for ancestor in ancestor_keys(key) {
                if !self.interior.contains(ancestor) {
                    self.interior.insert(ancestor.to_owned());
                }
            }
            Ok(())
        }
    }

    /// Returns the records stored under the relative key `key`, not
    /// including the SOA record. Keys that are not present yield an
    /// empty slice.
    pub fn records_at(&self, key: &str) -> &[Record] {
        self.records.search(key).unwrap_or_default()
    }

    /// Returns whether the relative key `key` names an empty
    /// non-terminal of the zone.
    pub fn is_empty_non_terminal(&self, key: &str) -> bool {
        self.records_at(key).is_empty() && self.interior.contains(&key.to_ascii_lowercase())
    }
}

/// Returns the keys of the proper ancestors of the relative key `key`
/// below the apex, nearest first. Escaped dots within labels are not
/// separators.
fn ancestor_keys(key: &str) -> impl Iterator<Item = &str> {
    let mut escaped = false;
    key.char_indices().filter_map(move |(i, c)| {
        let separator = c == '.' && !escaped;
        escaped = c == '\\' && !escaped;
        separator.then(|| &key[i + 1..])
    })
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::class::Class;
    use crate::rr::{RecordData, Soa};

    fn a_record(octet: u8) -> Record {
        Record::new(
            Class::IN,
            Ttl::from(300),
            RecordData::A(Ipv4Addr::new(192, 0, 2, octet)),
        )
    }

    pub(super) fn soa_record() -> Record {
        Record::new(
            Class::IN,
            Ttl::from(3600),
            RecordData::Soa(Box::new(Soa {
                mname: "ns1.example.com.".parse().unwrap(),
                rname: "admin.example.com.".parse().unwrap(),
                serial: 1,
                refresh: 3600,
                retry: 600,
                expire: 86400,
                minimum: 3600,
            })),
        )
    }

    #[test]
    fn add_keys_records_relative_to_origin() {
        let mut zone = Zone::new("example.com.".parse().unwrap());
        zone.add(&"WWW.example.com.".parse().unwrap(), a_record(1))
            .unwrap();
        zone.add(&"example.com.".parse().unwrap(), a_record(2))
            .unwrap();
        assert_eq!(zone.records_at("www"), &[a_record(1)]);
        assert_eq!(zone.records_at(""), &[a_record(2)]);
        assert!(zone.records_at("mail").is_empty());
    }

    #[test]
    fn add_rejects_names_outside_zone() {
        let mut zone = Zone::new("example.com.".parse().unwrap());
        assert_eq!(
            zone.add(&"example.net.".parse().unwrap(), a_record(1)),
            Err(Error::NotInZone)
        );
        assert!(zone.is_empty());
    }

    #[test]
    fn soa_is_kept_apart() {
        let mut zone = Zone::new("example.com.".parse().unwrap());
        assert_eq!(zone.insert("www", soa_record()), Err(Error::SoaNotAtApex));
        zone.insert("", soa_record()).unwrap();
        assert!(!zone.is_empty());
        assert!(zone.records_at("").is_empty());
        assert_eq!(zone.soa(), Some(&soa_record()));
        assert_eq!(zone.insert("", soa_record()), Err(Error::DuplicateSoa));
    }

    #[test]
    fn origin_is_fixed_once_records_exist() {
        let mut zone = Zone::new(Name::root());
        zone.set_origin("example.com.".parse().unwrap()).unwrap();
        zone.insert("www", a_record(1)).unwrap();
        assert_eq!(
            zone.set_origin("example.net.".parse().unwrap()),
            Err(Error::OriginChanged)
        );
        assert_eq!(zone.origin(), &"example.com.".parse::<Name>().unwrap());
    }

    #[test]
    fn ancestors_of_owners_are_empty_non_terminals() {
        let mut zone = Zone::new("example.com.".parse().unwrap());
        zone.insert("a.b.c", a_record(1)).unwrap();
        zone.insert("c", a_record(2)).unwrap();
        assert!(zone.is_empty_non_terminal("b.c"));
        assert!(zone.is_empty_non_terminal("B.C"));
        assert!(!zone.is_empty_non_terminal("c"));
        assert!(!zone.is_empty_non_terminal("a.b.c"));
        assert!(!zone.is_empty_non_terminal("b"));
        assert!(!zone.is_empty_non_terminal("x.a.b.c"));
    }

    #[test]
    fn escaped_dots_do_not_split_keys() {
        let keys: Vec<&str> = ancestor_keys(r"a\.b.c").collect();
        assert_eq!(keys, ["c"]);
        let keys: Vec<&str> = ancestor_keys(r"a\\.b").collect();
        assert_eq!(keys, ["b"]);
    }
}
