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

//! Provides the [`Type`] structure for DNS RR types.

use std::fmt;
use std::str::FromStr;

use crate::util::parse_generic_mnemonic;

/// The RR type of a DNS record, as the raw 16-bit value carried on the
/// wire.
///
/// Constants are provided for the types this server loads and serves;
/// see [`Type::is_supported`]. Other values are shown and parsed in the
/// `TYPEnn` form of RFC 3597.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Type(u16);

impl Type {
    // RFC 1035
    pub const A: Type = Type(1);
    pub const NS: Type = Type(2);
    pub const CNAME: Type = Type(5);
    pub const SOA: Type = Type(6);
    pub const MX: Type = Type(15);
    pub const TXT: Type = Type(16);

    // RFC 3596
    pub const AAAA: Type = Type(28);

    /// Returns whether this is one of the RR types that can be loaded
    /// from a zone file and served.
    pub fn is_supported(self) -> bool {
        self.mnemonic().is_some()
    }

    fn mnemonic(self) -> Option<&'static str> {
        SUPPORTED
            .iter()
            .find(|(rr_type, _)| *rr_type == self)
            .map(|(_, mnemonic)| *mnemonic)
    }
}

/// The supported types and their mnemonics.
const SUPPORTED: [(Type, &str); 7] = [
    (Type::A, "A"),
    (Type::NS, "NS"),
    (Type::CNAME, "CNAME"),
    (Type::SOA, "SOA"),
    (Type::MX, "MX"),
    (Type::TXT, "TXT"),
    (Type::AAAA, "AAAA"),
];

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some((rr_type, _)) = SUPPORTED
            .iter()
            .find(|(_, mnemonic)| mnemonic.eq_ignore_ascii_case(text))
        {
            return Ok(*rr_type);
        }
        match parse_generic_mnemonic(text, "TYPE") {
            Some(Ok(value)) => Ok(Self(value)),
            Some(Err(_)) => Err("type value is not a valid unsigned 16-bit integer"),
            None => Err("unknown type"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
