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

//! Parsing of zone file `$`-directives.

use std::io::BufRead;

use super::name::parse_origin;
use super::reader::{is_blank, Line};
use super::{Error, ErrorKind, Parser, Result};
use crate::rr::Ttl;

impl<S: BufRead> Parser<'_, S> {
    /// Parses a zone file directive. Both `$NAME value` and
    /// `$NAME = value` are accepted.
    pub(super) fn parse_directive(&mut self, line: &Line) -> Result<()> {
        let (name, value) =
            split_directive(&line.text[1..]).map_err(|kind| Error::new(line.number, kind))?;
        match name.to_ascii_uppercase().as_str() {
            "ORIGIN" => self.parse_origin_directive(value),
            "TTL" => self.parse_ttl_directive(value),
            _ => Err(ErrorKind::UnknownDirective),
        }
        .map_err(|kind| Error::new(line.number, kind))
    }

    /// Parses an `$ORIGIN` directive.
    fn parse_origin_directive(&mut self, value: &str) -> std::result::Result<(), ErrorKind> {
        let origin = parse_origin(value)?;
        self.zone.set_origin(origin).map_err(ErrorKind::Zone)
    }

    /// Parses a `$TTL` directive.
    fn parse_ttl_directive(&mut self, value: &str) -> std::result::Result<(), ErrorKind> {
        let ttl: Ttl = value.parse().map_err(ErrorKind::InvalidTtl)?;
        self.zone.set_ttl(ttl);
        Ok(())
    }
}

/// Splits the text of a directive (without the `$`) into its name and
/// its single value.
fn split_directive(text: &str) -> std::result::Result<(&str, &str), ErrorKind> {
    let (name, value) = if text.contains('=') {
        let mut parts = text.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) => (name, value),
            _ => return Err(ErrorKind::MultipleEquals),
        }
    } else {
        text.split_once(is_blank).unwrap_or((text, ""))
    };

    let value = value.trim_matches(is_blank);
    if value.is_empty() {
        Err(ErrorKind::MissingDirectiveValue)
    } else if value.contains(is_blank) {
        Err(ErrorKind::TooManyFields)
    } else {
        Ok((name.trim_matches(is_blank), value))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
