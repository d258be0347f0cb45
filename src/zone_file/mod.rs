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

//! Parsing of BIND-style zone files ([RFC 1035 § 5]).
//!
//! A [`Parser`] reads a zone file from a stream implementing
//! [`BufRead`] and adds its records to a [`Zone`]. The supported
//! syntax is a subset of the master file format:
//!
//! * `;` starts a comment that runs to the end of the line.
//! * Parentheses extend a record across several lines.
//! * The `$ORIGIN` and `$TTL` directives set the zone's origin and its
//!   default TTL. Their value may be separated from the name with a
//!   blank or with `=`.
//! * Records have the form `[owner] [class] [TTL] TYPE RDATA`, where
//!   the class and TTL may come in either order. An omitted owner is
//!   the owner of the previous record, and `@` is the origin. Only the
//!   A, AAAA, NS, CNAME, MX, TXT, and SOA types are supported.
//!
//! Parsing stops at the first error, which is reported through the
//! [`Error`] type. Records read before the error will already be in
//! the zone, so callers should discard a zone whose file failed to
//! parse.
//!
//! ```
//! use std::io::Cursor;
//! use qdns::name::Name;
//! use qdns::zone::Zone;
//! use qdns::zone_file::Parser;
//!
//! const ZONE_FILE: &[u8] = br#"
//! $ORIGIN example.com.
//! $TTL 3600
//! @   IN SOA ns1 admin (
//!     1       ; SERIAL
//!     3600    ; REFRESH
//!     600     ; RETRY
//!     86400   ; EXPIRE
//!     3600    ; MINIMUM
//! )
//!     IN NS ns1
//! ns1 IN A 192.0.2.53
//! "#;
//!
//! let mut zone = Zone::new(Name::root());
//! let n_records = Parser::new(Cursor::new(ZONE_FILE), &mut zone)
//!     .parse()
//!     .unwrap();
//! assert_eq!(n_records, 3);
//! assert_eq!(zone.records_at("ns1").len(), 1);
//! ```
//!
//! [RFC 1035 § 5]: https://datatracker.ietf.org/doc/html/rfc1035#section-5

use std::io::BufRead;

use crate::name::Name;
use crate::zone::Zone;

mod directive;
pub mod error;
mod name;
mod reader;
mod record;

pub use error::{Error, ErrorKind, Result};
use reader::Reader;

/// A parser for zone files. See the
/// [module-level documentation](`self`) for details and example usage.
pub struct Parser<'z, S> {
    reader: Reader<S>,
    zone: &'z mut Zone,
    current_owner: Option<Name>,
}

impl<'z, S: BufRead> Parser<'z, S> {
    /// Creates a new [`Parser`] that reads a zone file from `stream`
    /// and adds its records to `zone`. The zone's origin and default
    /// TTL serve as the initial origin and TTL for the file.
    pub fn new(stream: S, zone: &'z mut Zone) -> Self {
        Self {
            reader: Reader::new(stream),
            zone,
            current_owner: None,
        }
    }

    /// Parses the whole file, returning the number of records added to
    /// the zone.
    pub fn parse(mut self) -> Result<usize> {
        let mut n_records = 0;
        while let Some(line) = self.reader.next_line()? {
            if line.is_directive() {
                self.parse_directive(&line)?;
            } else {
                self.parse_record(&line)?;
                n_records += 1;
            }
        }
        Ok(n_records)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::rr::RecordData;

    /// A helper used throughout the [`zone_file`](`super`) module's
    /// tests.
    pub(super) fn parse(zone: &mut Zone, data: &str) -> Result<usize> {
        Parser::new(Cursor::new(data), zone).parse()
    }

    /// Parses `data` into a fresh zone, expecting a syntax error. The
    /// line number and kind of the error are returned.
    pub(super) fn syntax_error(data: &str) -> (usize, ErrorKind) {
        let mut zone = Zone::new(Name::root());
        match parse(&mut zone, data) {
            Err(Error::Syntax(details)) => (details.line(), details.kind().clone()),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn example_zone_parses() {
        let data = "$ORIGIN example.com.\n\
                    $TTL 3600\n\
                    @    IN  SOA ns1.example.com. admin.example.com. ( 1 3600 600 86400 3600 )\n\
                    www  IN  A   93.184.216.34\n";
        let mut zone = Zone::new(Name::root());
        assert_eq!(parse(&mut zone, data).unwrap(), 2);
        assert_eq!(zone.origin().to_string(), "example.com.");
        assert_eq!(u32::from(zone.ttl()), 3600);
        assert!(matches!(
            zone.soa().map(|soa| &soa.data),
            Some(RecordData::Soa(soa)) if soa.serial == 1 && soa.minimum == 3600
        ));

        let www = zone.records_at("www");
        assert_eq!(www.len(), 1);
        assert_eq!(www[0].value(), "93.184.216.34");
        assert_eq!(u32::from(www[0].ttl), 3600);
    }

    #[test]
    fn first_error_stops_parsing() {
        let data = "$ORIGIN example.com.\nwww A\nmail A 192.0.2.25\n";
        let mut zone = Zone::new(Name::root());
        match parse(&mut zone, data) {
            Err(Error::Syntax(details)) => {
                assert_eq!(details.line(), 2);
                assert_eq!(details.kind(), &ErrorKind::MissingRdata);
                assert_eq!(details.to_string(), "record has no data at line 2");
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
        assert!(zone.records_at("mail").is_empty());
    }

    #[test]
    fn io_errors_are_reported() {
        let mut zone = Zone::new(Name::root());
        let invalid_utf8: &[u8] = b"www A 192.0.2.1\n\xff\xfe\n";
        assert!(matches!(
            Parser::new(invalid_utf8, &mut zone).parse(),
            Err(Error::Io(_))
        ));
    }
}
