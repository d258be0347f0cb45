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

//! Implementation of the [`Catalog`] structure.

use super::{Error, LookupError, Zone};
use crate::name::Name;
use crate::trie::{self, DomainTrie};

/// A data structure containing all of the zones served by a server.
///
/// Zones are indexed by the lower-cased textual form of their origins
/// in a [`DomainTrie`]. A `Catalog` is filled during start-up and then
/// shared read-only (typically through an [`Arc`](std::sync::Arc))
/// with everything that answers queries; it has no operations to
/// remove or replace zones.
#[derive(Debug, Default)]
pub struct Catalog {
    zones: DomainTrie<Zone>,
    len: usize,
}

impl Catalog {
    /// Creates a new, initially empty `Catalog`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `zone` to the catalog. Zones without any records, and zones
    /// whose origin is already in the catalog, are rejected.
    pub fn insert(&mut self, zone: Zone) -> Result<(), Error> {
        if zone.is_empty() {
            return Err(Error::EmptyZone);
        }
        let key = zone.origin().to_key();
        match self.zones.search(&key) {
            Ok(existing) if !existing.is_empty() => return Err(Error::DuplicateZone),
            Ok(_) | Err(trie::Error::NotFound) => (),
            Err(err) => return Err(Error::Trie(err)),
        }
        self.zones.put(&key, zone).map_err(Error::Trie)?;
        self.len += 1;
        Ok(())
    }

    /// Looks up the [`Zone`] in the `Catalog` that is the nearest
    /// ancestor to `name` (i.e., the [`Zone`] whose origin matches the
    /// most consecutive labels in `name`, starting from the right).
    /// Candidate origins are tried from `name` itself up to the root.
    pub fn find_zone(&self, name: &Name) -> Result<&Zone, LookupError> {
        (0..=name.len())
            .filter_map(|n| name.superdomain(n))
            .find_map(|candidate| match self.zones.search(&candidate.to_key()) {
                Ok([zone, ..]) => Some(zone),
                _ => None,
            })
            .ok_or(LookupError::ZoneNotFound)
    }

    /// Returns the number of zones in the catalog.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the catalog has no zones.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::tests::soa_record;
    use super::*;

    fn zone(origin: &str) -> Zone {
        let mut zone = Zone::new(origin.parse().unwrap());
        zone.insert("", soa_record()).unwrap();
        zone
    }

    #[test]
    fn find_zone_works() {
        let test: Name = "test.".parse().unwrap();
        let qdns_test: Name = "qdns.test.".parse().unwrap();
        let x_qdns_test: Name = "x.qdns.test.".parse().unwrap();
        let y_x_qdns_test: Name = "Y.X.Qdns.Test.".parse().unwrap();

        let mut catalog = Catalog::new();
        catalog.insert(zone("test.")).unwrap();
        catalog.insert(zone("x.qdns.test.")).unwrap();
        assert_eq!(catalog.len(), 2);

        assert_eq!(
            catalog.find_zone(&Name::root()).map(Zone::origin),
            Err(LookupError::ZoneNotFound)
        );
        assert_eq!(catalog.find_zone(&test).map(Zone::origin), Ok(&test));
        assert_eq!(
            catalog.find_zone(&qdns_test).map(Zone::origin),
            Ok(&test)
        );
        assert_eq!(
            catalog.find_zone(&x_qdns_test).map(Zone::origin),
            Ok(&x_qdns_test)
        );
        assert_eq!(
            catalog.find_zone(&y_x_qdns_test).map(Zone::origin),
            Ok(&x_qdns_test)
        );
    }

    #[test]
    fn empty_catalog_finds_nothing() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());
        assert_eq!(
            catalog
                .find_zone(&"example.com.".parse().unwrap())
                .map(Zone::origin),
            Err(LookupError::ZoneNotFound)
        );
    }

    #[test]
    fn empty_and_duplicate_zones_are_rejected() {
        let mut catalog = Catalog::new();
        assert_eq!(
            catalog.insert(Zone::new("example.com.".parse().unwrap())),
            Err(Error::EmptyZone)
        );
        catalog.insert(zone("example.com.")).unwrap();
        assert_eq!(
            catalog.insert(zone("EXAMPLE.com.")),
            Err(Error::DuplicateZone)
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn root_zone_is_a_fallback() {
        let mut catalog = Catalog::new();
        catalog.insert(zone(".")).unwrap();
        catalog.insert(zone("example.com.")).unwrap();
        assert!(catalog
            .find_zone(&"www.example.org.".parse().unwrap())
            .unwrap()
            .origin()
            .is_root());
        assert!(!catalog
            .find_zone(&"www.example.com.".parse().unwrap())
            .unwrap()
            .origin()
            .is_root());
    }
}
