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

//! Parsing of domain names.

use super::ErrorKind;
use crate::name::Name;

/// Parses a domain name appearing in a record, where `@` stands for
/// `origin` and names without a trailing dot are relative to `origin`.
pub(super) fn parse_domain(text: &str, origin: &Name) -> Result<Name, ErrorKind> {
    if text == "@" {
        Ok(origin.clone())
    } else if let Some(absolute) = text.strip_suffix('.') {
        parse_absolute(absolute)
    } else {
        check_characters(text)?;
        Name::from_labels(
            text.split('.')
                .map(str::as_bytes)
                .chain(origin.labels()),
        )
        .map_err(ErrorKind::InvalidDomain)
    }
}

/// Parses the value of an `$ORIGIN` directive. The name is always
/// fully qualified, whether or not it ends with a dot.
pub(super) fn parse_origin(text: &str) -> Result<Name, ErrorKind> {
    parse_absolute(text.strip_suffix('.').unwrap_or(text))
}

/// Parses a fully qualified name whose trailing dot has already been
/// removed. The empty string is the root.
fn parse_absolute(text: &str) -> Result<Name, ErrorKind> {
    if text.is_empty() {
        return Ok(Name::root());
    }
    check_characters(text)?;
    Name::from_labels(text.split('.')).map_err(ErrorKind::InvalidDomain)
}

/// Checks that a name consists only of letters, digits, hyphens,
/// underscores, and dots.
fn check_characters(text: &str) -> Result<(), ErrorKind> {
    match text
        .chars()
        .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        Some(c) => Err(ErrorKind::InvalidDomainCharacter(c)),
        None => Ok(()),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
