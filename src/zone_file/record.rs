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

//! Parsing of resource records.
//!
//! A record line has the form `[owner] [class] [TTL] TYPE RDATA`, where
//! the class and TTL may appear in either order. Since the leading
//! fields are optional, the type is found first: it is the last field
//! among the first four that names a supported type, has RDATA after
//! it, and is preceded only by fields that make up a valid prefix. The
//! prefix is then classified field by field with a small state machine
//! (see [`Prefix::accept`]).

use std::io::BufRead;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::name::parse_domain;
use super::reader::{is_blank, Line};
use super::{Error, ErrorKind, Parser, Result};
use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, RecordData, Soa, Ttl, Type};

/// The most fields that may precede the type (owner, class, and TTL).
const MAX_PREFIX_FIELDS: usize = 3;

/// The number of integer fields in SOA RDATA.
const SOA_INTEGERS: usize = 5;

type KindResult<T> = std::result::Result<T, ErrorKind>;

impl<S: BufRead> Parser<'_, S> {
    /// Parses a resource record and adds it to the zone.
    pub(super) fn parse_record(&mut self, line: &Line) -> Result<()> {
        self.parse_record_fields(line)
            .map_err(|kind| Error::new(line.number, kind))
    }

    fn parse_record_fields(&mut self, line: &Line) -> KindResult<()> {
        let fields = line.fields();
        let (prefix, rr_type, type_index) = split_record(&fields, line.indented)?;

        let owner = match prefix.owner {
            Some(owner) => parse_domain(owner, self.zone.origin())?,
            None => self
                .current_owner
                .clone()
                .ok_or(ErrorKind::NoCurrentOwner)?,
        };
        let rdata = &fields[type_index + 1..];
        let data = match rr_type {
            Type::TXT => RecordData::Txt(parse_txt(skip_fields(&line.text, type_index + 1))?),
            _ => parse_rdata(rr_type, rdata, self.zone.origin())?,
        };
        let record = Record::new(
            prefix.class.unwrap_or(Class::IN),
            prefix.ttl.unwrap_or_else(|| self.zone.ttl()),
            data,
        );

        self.zone.add(&owner, record).map_err(ErrorKind::Zone)?;
        self.current_owner = Some(owner);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// OWNER, CLASS, TTL, AND TYPE                                        //
////////////////////////////////////////////////////////////////////////

/// The fields preceding a record's type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct Prefix<'a> {
    owner: Option<&'a str>,
    class: Option<Class>,
    ttl: Option<Ttl>,
}

impl<'a> Prefix<'a> {
    /// Classifies the fields before the type. An owner may only be the
    /// first field, and only when the line is not indented.
    fn from_fields(fields: &[&'a str], indented: bool) -> KindResult<Self> {
        let mut prefix = Self::default();
        for (i, &field) in fields.iter().enumerate() {
            prefix = prefix.accept(field, i == 0 && !indented)?;
        }
        Ok(prefix)
    }

    /// Moves the state machine forward by one field. Class and TTL
    /// tokens are recognized before owners, so an owner that looks like
    /// a class or an integer cannot be given without its trailing dot.
    fn accept(self, field: &'a str, owner_allowed: bool) -> KindResult<Self> {
        if let Ok(class) = field.parse::<Class>() {
            if self.class.is_some() {
                return Err(ErrorKind::DuplicateClass);
            }
            Ok(Self {
                class: Some(class),
                ..self
            })
        } else if field.bytes().all(|b| b.is_ascii_digit()) {
            if self.ttl.is_some() {
                return Err(ErrorKind::DuplicateTtl);
            }
            let ttl = field.parse().map_err(ErrorKind::InvalidTtl)?;
            Ok(Self {
                ttl: Some(ttl),
                ..self
            })
        } else if owner_allowed {
            Ok(Self {
                owner: Some(field),
                ..self
            })
        } else {
            Err(ErrorKind::ExpectedClassOrTtl)
        }
    }
}

/// Finds the type of the record on a line. This returns the classified
/// prefix, the type, and the index of the type field.
fn split_record<'a>(fields: &[&'a str], indented: bool) -> KindResult<(Prefix<'a>, Type, usize)> {
    let last = match fields.len() {
        0 | 1 => return Err(ErrorKind::SingleField),
        len => len - 1,
    };

    let mut prefix_error = None;
    for i in (0..last.min(MAX_PREFIX_FIELDS + 1)).rev() {
        let rr_type = match parse_type(fields[i]) {
            Some(rr_type) => rr_type,
            None => continue,
        };
        match Prefix::from_fields(&fields[..i], indented) {
            Ok(prefix) => return Ok((prefix, rr_type, i)),
            Err(kind) => {
                prefix_error.get_or_insert(kind);
            }
        }
    }

    if let Some(kind) = prefix_error {
        Err(kind)
    } else if last <= MAX_PREFIX_FIELDS && parse_type(fields[last]).is_some() {
        Err(ErrorKind::MissingRdata)
    } else {
        Err(ErrorKind::MissingType)
    }
}

/// Parses a type mnemonic, accepting only supported types.
fn parse_type(field: &str) -> Option<Type> {
    field
        .parse::<Type>()
        .ok()
        .filter(|rr_type| rr_type.is_supported())
}

////////////////////////////////////////////////////////////////////////
// RDATA                                                              //
////////////////////////////////////////////////////////////////////////

/// Parses the RDATA of all types but TXT.
fn parse_rdata(rr_type: Type, fields: &[&str], origin: &Name) -> KindResult<RecordData> {
    match rr_type {
        Type::A => single(fields)?
            .parse::<Ipv4Addr>()
            .map(RecordData::A)
            .map_err(ErrorKind::InvalidIpv4),
        Type::AAAA => single(fields)?
            .parse::<Ipv6Addr>()
            .map(RecordData::Aaaa)
            .map_err(ErrorKind::InvalidIpv6),
        Type::NS => parse_domain(single(fields)?, origin).map(RecordData::Ns),
        Type::CNAME => parse_domain(single(fields)?, origin).map(RecordData::Cname),
        Type::MX => {
            let (preference, exchange) = match *fields {
                [exchange] => (0, exchange),
                [preference, exchange] => (
                    preference.parse::<u16>().map_err(ErrorKind::InvalidInt)?,
                    exchange,
                ),
                [] => return Err(ErrorKind::MissingRdata),
                _ => return Err(ErrorKind::TooManyFields),
            };
            Ok(RecordData::Mx {
                preference,
                exchange: parse_domain(exchange, origin)?,
            })
        }
        Type::SOA => parse_soa(fields, origin).map(|soa| RecordData::Soa(Box::new(soa))),
        _ => Err(ErrorKind::MissingType),
    }
}

/// Returns the only field of the RDATA.
fn single<'a>(fields: &[&'a str]) -> KindResult<&'a str> {
    match *fields {
        [field] => Ok(field),
        [] => Err(ErrorKind::MissingRdata),
        _ => Err(ErrorKind::TooManyFields),
    }
}

/// Parses SOA RDATA. The MNAME and RNAME are required; the serial,
/// refresh, retry, expire, and minimum values may be left off from the
/// end and are then zero.
fn parse_soa(fields: &[&str], origin: &Name) -> KindResult<Soa> {
    let (mname, rname, integers) = match *fields {
        [mname, rname, ref integers @ ..] => (mname, rname, integers),
        _ => return Err(ErrorKind::MissingRdata),
    };
    if integers.len() > SOA_INTEGERS {
        return Err(ErrorKind::TooManyFields);
    }
    let mut values = [0u32; SOA_INTEGERS];
    for (value, field) in values.iter_mut().zip(integers) {
        *value = field.parse().map_err(ErrorKind::InvalidInt)?;
    }
    let [serial, refresh, retry, expire, minimum] = values;
    Ok(Soa {
        mname: parse_domain(mname, origin)?,
        rname: parse_domain(rname, origin)?,
        serial,
        refresh,
        retry,
        expire,
        minimum,
    })
}

/// Parses TXT RDATA. Unquoted text is taken verbatim. Otherwise it must
/// be a sequence of double-quoted strings, which are concatenated; a
/// backslash inside quotes escapes the next character.
fn parse_txt(text: &str) -> KindResult<Box<[u8]>> {
    if !text.starts_with('"') {
        return Ok(text.as_bytes().into());
    }

    let mut data = String::new();
    let mut rest = text;
    while let Some(quoted) = rest.strip_prefix('"') {
        let mut chars = quoted.char_indices();
        let end = loop {
            match chars.next() {
                Some((i, '"')) => break i,
                Some((_, '\\')) => match chars.next() {
                    Some((_, c)) => data.push(c),
                    None => return Err(ErrorKind::UnterminatedQuote),
                },
                Some((_, c)) => data.push(c),
                None => return Err(ErrorKind::UnterminatedQuote),
            }
        };
        rest = quoted[end + 1..].trim_start_matches(is_blank);
    }

    if rest.is_empty() {
        Ok(data.into_bytes().into_boxed_slice())
    } else {
        Err(ErrorKind::TooManyFields)
    }
}

/// Returns the text of a line after its first `n` fields.
fn skip_fields(mut text: &str, n: usize) -> &str {
    for _ in 0..n {
        text = text.trim_start_matches(is_blank);
        let end = text.find(is_blank).unwrap_or(text.len());
        text = &text[end..];
    }
    text.trim_matches(is_blank)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
