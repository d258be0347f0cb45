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

//! Implementation of the error types for zone-related errors.

use std::fmt;

use crate::trie;

/// Errors that arise when building a [`Zone`](super::Zone) or a
/// [`Catalog`](super::Catalog).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    NotInZone,
    OriginChanged,
    SoaNotAtApex,
    DuplicateSoa,
    EmptyZone,
    DuplicateZone,
    Trie(trie::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NotInZone => f.write_str("the record's owner is not within the zone"),
            Self::OriginChanged => {
                f.write_str("the origin cannot change once the zone has records")
            }
            Self::SoaNotAtApex => f.write_str("the SOA record is not at the zone's apex"),
            Self::DuplicateSoa => f.write_str("the zone already has an SOA record"),
            Self::EmptyZone => f.write_str("the zone has no records"),
            Self::DuplicateZone => f.write_str("a zone with the same origin already exists"),
            Self::Trie(err) => write!(f, "failed to index the record: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Trie(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors that arise when a query cannot be answered from zone data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LookupError {
    /// No zone in the catalog contains the name.
    ZoneNotFound,

    /// The name is not within the zone that was searched.
    OriginMismatch,

    /// The name does not exist in the zone.
    RecordNotFound,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::ZoneNotFound => f.write_str("no zone contains the name"),
            Self::OriginMismatch => f.write_str("the name is not within the zone's origin"),
            Self::RecordNotFound => f.write_str("the name does not exist in the zone"),
        }
    }
}

impl std::error::Error for LookupError {}
