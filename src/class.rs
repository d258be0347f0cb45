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

//! Implementation of the [`Class`] type for DNS classes.

use std::fmt;
use std::str::FromStr;

use crate::util::parse_generic_mnemonic;

/// A DNS class, as the raw 16-bit value carried on the wire.
///
/// The classes of RFC 1035 have constants and mnemonics. Any other
/// value is shown and parsed in the `CLASSnn` form of RFC 3597.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Class(u16);

impl Class {
    pub const IN: Self = Self(1);
    pub const CS: Self = Self(2);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);

    /// Returns whether this is one of the classes defined by RFC 1035.
    pub fn is_known(self) -> bool {
        self.mnemonic().is_some()
    }

    fn mnemonic(self) -> Option<&'static str> {
        MNEMONICS
            .iter()
            .find(|(class, _)| *class == self)
            .map(|(_, mnemonic)| *mnemonic)
    }
}

const MNEMONICS: [(Class, &str); 4] = [
    (Class::IN, "IN"),
    (Class::CS, "CS"),
    (Class::CH, "CH"),
    (Class::HS, "HS"),
];

impl From<u16> for Class {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl FromStr for Class {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some((class, _)) = MNEMONICS
            .iter()
            .find(|(_, mnemonic)| mnemonic.eq_ignore_ascii_case(text))
        {
            return Ok(*class);
        }
        match parse_generic_mnemonic(text, "CLASS") {
            Some(Ok(value)) => Ok(Self(value)),
            Some(Err(_)) => Err("class value is not a valid unsigned 16-bit integer"),
            None => Err("unknown class"),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "CLASS{}", self.0),
        }
    }
}
