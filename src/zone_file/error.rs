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

//! Error types for zone file parsing.
//!
//! All syntax errors are recorded with an [`ErrorKind`] value, from
//! which calling code can get an appropriate error message, and the
//! number of the line on which the offending record or directive
//! starts.

use std::fmt;
use std::io;
use std::net::AddrParseError;
use std::num::ParseIntError;

use crate::name;
use crate::rr::ParseTtlError;
use crate::zone;

////////////////////////////////////////////////////////////////////////
// ERROR STRUCTURE                                                    //
////////////////////////////////////////////////////////////////////////

/// Represents errors that may occur during zone file parsing.
#[derive(Debug)]
pub enum Error {
    /// I/O errors encountered while reading a zone file.
    Io(io::Error),

    /// Syntax errors.
    Syntax(ErrorDetails),
}

impl Error {
    /// Constructs a new [`Error`] of the [`Syntax`](`Error::Syntax`)
    /// variant with provided information.
    pub(super) fn new(line: usize, kind: ErrorKind) -> Self {
        Self::Syntax(ErrorDetails { line, kind })
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Self::Io(io_error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(io_error) => write!(f, "I/O error: {}", io_error),
            Self::Syntax(details) => details.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(io_error) => Some(io_error),
            Self::Syntax(_) => None,
        }
    }
}

/// A result type for zone file parsing.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// SYNTAX ERROR DETAILS                                               //
////////////////////////////////////////////////////////////////////////

/// Provides information about the position and kind of zone file syntax
/// errors.
#[derive(Debug, Eq, PartialEq)]
pub struct ErrorDetails {
    pub(super) line: usize,
    pub(super) kind: ErrorKind,
}

impl ErrorDetails {
    /// Returns the line in the file at which the offending record or
    /// directive starts.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the kind of syntax error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}

////////////////////////////////////////////////////////////////////////
// SYNTAX ERROR KINDS                                                 //
////////////////////////////////////////////////////////////////////////

/// Kinds of zone file syntax errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    DuplicateClass,
    DuplicateTtl,
    EofBeforeCloseParen,
    ExpectedClassOrTtl,
    InvalidDomain(name::Error),
    InvalidDomainCharacter(char),
    InvalidInt(ParseIntError),
    InvalidIpv4(AddrParseError),
    InvalidIpv6(AddrParseError),
    InvalidTtl(ParseTtlError),
    MissingDirectiveValue,
    MissingRdata,
    MissingType,
    MultipleEquals,
    NoCurrentOwner,
    SingleField,
    TooManyFields,
    UnknownDirective,
    UnmatchedCloseParen,
    UnterminatedQuote,
    Zone(zone::Error),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateClass => f.write_str("class given more than once"),
            Self::DuplicateTtl => f.write_str("TTL given more than once"),
            Self::EofBeforeCloseParen => f.write_str("end of file before closing parenthesis"),
            Self::ExpectedClassOrTtl => f.write_str("expected class or TTL"),
            Self::InvalidDomain(err) => write!(f, "invalid domain name: {}", err),
            Self::InvalidDomainCharacter(c) => {
                write!(f, "invalid character {:?} in domain name", c)
            }
            Self::InvalidInt(err) => write!(f, "invalid integer: {}", err),
            Self::InvalidIpv4(err) => write!(f, "invalid IPv4 address: {}", err),
            Self::InvalidIpv6(err) => write!(f, "invalid IPv6 address: {}", err),
            Self::InvalidTtl(err) => err.fmt(f),
            Self::MissingDirectiveValue => f.write_str("directive has no value"),
            Self::MissingRdata => f.write_str("record has no data"),
            Self::MissingType => f.write_str("no record type found"),
            Self::MultipleEquals => f.write_str("directive has more than one '='"),
            Self::NoCurrentOwner => f.write_str("owner omitted but no previous owner"),
            Self::SingleField => f.write_str("record has only one field"),
            Self::TooManyFields => f.write_str("too many fields"),
            Self::UnknownDirective => f.write_str("unknown directive"),
            Self::UnmatchedCloseParen => f.write_str("closing parenthesis without opening"),
            Self::UnterminatedQuote => f.write_str("unterminated quoted string"),
            Self::Zone(err) => err.fmt(f),
        }
    }
}
