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

//! Implementation of types relating to DNS questions.

use std::fmt;

use crate::class::Class;
use crate::name::Name;
use crate::rr::Type;

/// The question of a DNS query ([RFC 1035 § 4.1.2]): a QNAME with the
/// QTYPE and QCLASS of the records wanted.
///
/// A message may carry several questions, but the
/// [server](crate::server) only answers single-question queries.
///
/// [RFC 1035 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.1.2
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Qtype,
    pub qclass: Qclass,
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

/// Generates a QTYPE or QCLASS wrapper over the raw 16-bit wire value,
/// convertible from the matching record-level type.
macro_rules! question_field {
    ($(#[$doc:meta])* $name:ident, $over:ty) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, Hash, PartialEq)]
        pub struct $name(u16);

        impl From<u16> for $name {
            fn from(raw: u16) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<$over> for $name {
            fn from(value: $over) -> Self {
                Self(value.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&<$over>::from(self.0), f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self)
            }
        }
    };
}

question_field!(
    /// The QTYPE of a [question](Question). Records match only when
    /// their [`Type`] has the same value; meta-types such as `*` have
    /// no special meaning here.
    Qtype,
    Type
);

question_field!(
    /// The QCLASS of a [question](Question). Records match only when
    /// their [`Class`] has the same value.
    Qclass,
    Class
);

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
