// Copyright 2021 Matthew Ingwersen.
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

//! Implementation of the [`Name`] type for domain names.

use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::str::FromStr;

use crate::util::is_printable_label_octet;

mod error;
pub use error::Error;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
pub const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
pub const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A fully qualified domain name.
///
/// A `Name` is an ordered sequence of labels, each one to 63 octets
/// long. The terminating null label of the root is implicit: it is not
/// counted by [`Name::len`] or yielded by [`Name::labels`], although it
/// is part of the on-the-wire representation returned by
/// [`Name::wire_repr`], which is what the `Name` stores internally.
///
/// Comparison and hashing are ASCII-case-insensitive, as required by
/// [RFC 1035 § 2.3.3].
///
/// [RFC 1035 § 2.3.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.3
#[derive(Clone)]
pub struct Name {
    wire: Box<[u8]>,
    n_labels: u8,
}

impl Name {
    /// Returns the root name.
    pub fn root() -> Self {
        Self {
            wire: Box::new([0]),
            n_labels: 0,
        }
    }

    /// Constructs a `Name` from its labels, given from the leftmost
    /// (most specific) label to the rightmost. The null label must not
    /// be included.
    pub fn from_labels<I>(labels: I) -> Result<Self, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut wire = Vec::new();
        let mut n_labels = 0u8;
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            } else if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong);
            } else if wire.len() + label.len() + 2 > MAX_WIRE_LEN {
                return Err(Error::NameTooLong);
            }
            wire.push(label.len() as u8);
            wire.extend_from_slice(label);
            n_labels += 1;
        }
        wire.push(0);
        Ok(Self {
            wire: wire.into_boxed_slice(),
            n_labels,
        })
    }

    /// Returns the uncompressed on-the-wire representation of the name,
    /// including the terminating null label.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the number of labels in the name, not counting the null
    /// label.
    pub fn len(&self) -> usize {
        self.n_labels as usize
    }

    /// Returns whether this is the root name.
    pub fn is_root(&self) -> bool {
        self.n_labels == 0
    }

    /// Returns an iterator over the name's labels, from left to right.
    pub fn labels(&self) -> Labels<'_> {
        Labels {
            wire: &self.wire,
            cursor: 0,
        }
    }

    /// Returns the superdomain of this name obtained by removing the
    /// leftmost `n` labels, or [`None`] if the name has fewer than `n`
    /// labels.
    pub fn superdomain(&self, n: usize) -> Option<Self> {
        if n > self.len() {
            None
        } else {
            Some(Self {
                wire: self.wire[self.label_offset(n)..].into(),
                n_labels: self.n_labels - n as u8,
            })
        }
    }

    /// Returns whether this name is equal to or a subdomain of `other`.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        self.len() >= other.len()
            && self.wire[self.label_offset(self.len() - other.len())..]
                .eq_ignore_ascii_case(&other.wire)
    }

    /// Computes the key under which records owned by this name are
    /// stored in a zone with apex `origin`. This is the textual form of
    /// the labels that precede `origin`, lower-cased and joined with
    /// dots, and without a trailing dot. The apex itself has the empty
    /// key. Returns [`None`] if this name is not within `origin`.
    pub fn relative_to(&self, origin: &Name) -> Option<String> {
        if !self.is_subdomain_of(origin) {
            return None;
        }
        let mut key = String::new();
        for (i, label) in self.labels().take(self.len() - origin.len()).enumerate() {
            if i > 0 {
                key.push('.');
            }
            write_label(&mut key, label).ok()?;
        }
        key.make_ascii_lowercase();
        Some(key)
    }

    /// Returns the lower-cased textual form of the name, which is used
    /// to key zones in the [`Catalog`](crate::zone::Catalog).
    pub fn to_key(&self) -> String {
        let mut key = self.to_string();
        key.make_ascii_lowercase();
        key
    }

    /// Returns the offset in the wire representation of label `n`.
    fn label_offset(&self, n: usize) -> usize {
        let mut offset = 0;
        for _ in 0..n {
            offset += self.wire[offset] as usize + 1;
        }
        offset
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        // Length octets are at most 63 and so never ASCII letters.
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for octet in self.wire.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a name in its textual form. The trailing dot is optional:
    /// the result is always fully qualified. Escape sequences are not
    /// supported.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            Err(Error::StrEmpty)
        } else if !text.is_ascii() {
            Err(Error::StrNotAscii)
        } else if text == "." {
            Ok(Self::root())
        } else {
            let text = text.strip_suffix('.').unwrap_or(text);
            Self::from_labels(text.split('.'))
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_char('.');
        }
        for label in self.labels() {
            write_label(f, label)?;
            f.write_char('.')?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Writes the textual form of a label, escaping octets that are not
/// printable with the `\DDD` notation of RFC 1035 § 5.1.
fn write_label(w: &mut impl Write, label: &[u8]) -> fmt::Result {
    for &octet in label {
        if is_printable_label_octet(octet) {
            w.write_char(octet as char)?;
        } else {
            write!(w, "\\{:03}", octet)?;
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////
// LABEL ITERATOR                                                     //
////////////////////////////////////////////////////////////////////////

/// An iterator over the labels of a [`Name`], returned by
/// [`Name::labels`].
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    wire: &'a [u8],
    cursor: usize,
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.wire[self.cursor] as usize;
        if len == 0 {
            None
        } else {
            let label = &self.wire[self.cursor + 1..self.cursor + 1 + len];
            self.cursor += len + 1;
            Some(label)
        }
    }
}

impl FusedIterator for Labels<'_> {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_and_display_work() {
        let name: Name = "www.Example.com.".parse().unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.wire_repr(), b"\x03www\x07Example\x03com\x00");
        assert_eq!(name.to_string(), "www.Example.com.");
        assert_eq!(name.to_key(), "www.example.com.");
    }

    #[test]
    fn from_str_treats_names_as_fully_qualified() {
        let relative: Name = "example.com".parse().unwrap();
        let absolute: Name = "example.com.".parse().unwrap();
        assert_eq!(relative, absolute);
    }

    #[test]
    fn root_is_handled() {
        let root: Name = ".".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root, Name::root());
        assert_eq!(root.to_string(), ".");
        assert_eq!(root.labels().count(), 0);
    }

    #[test]
    fn from_str_rejects_invalid_names() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("a..b".parse::<Name>(), Err(Error::EmptyLabel));
        assert_eq!("ex\u{e4}mple.com".parse::<Name>(), Err(Error::StrNotAscii));
        let long_label = "a".repeat(64);
        assert_eq!(long_label.parse::<Name>(), Err(Error::LabelTooLong));
        let long_name = ["a".repeat(63).as_str(); 4].join(".");
        assert_eq!(long_name.parse::<Name>(), Err(Error::NameTooLong));
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let lower: Name = "qdns.test.".parse().unwrap();
        let upper: Name = "QDNS.TEST.".parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn superdomain_works() {
        let name: Name = "a.b.c.".parse().unwrap();
        assert_eq!(name.superdomain(1).unwrap().to_string(), "b.c.");
        assert!(name.superdomain(3).unwrap().is_root());
        assert!(name.superdomain(4).is_none());
    }

    #[test]
    fn relative_to_respects_label_boundaries() {
        let origin: Name = "example.com.".parse().unwrap();
        let www: Name = "WWW.a.Example.COM.".parse().unwrap();
        let apex: Name = "example.com.".parse().unwrap();
        let lookalike: Name = "notexample.com.".parse().unwrap();
        assert_eq!(www.relative_to(&origin).as_deref(), Some("www.a"));
        assert_eq!(apex.relative_to(&origin).as_deref(), Some(""));
        assert_eq!(lookalike.relative_to(&origin), None);
        assert_eq!(origin.relative_to(&www), None);
    }

    #[test]
    fn unprintable_octets_are_escaped() {
        let name = Name::from_labels([&b"a.b"[..], &b"\x00c"[..]]).unwrap();
        assert_eq!(name.to_string(), "a\\046b.\\000c.");
    }
}
