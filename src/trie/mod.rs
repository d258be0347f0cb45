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

//! Prefix tries keyed by domain-name text.
//!
//! [`BitmapTrie`] is a general-purpose trie over 7-bit characters that
//! knows nothing about the DNS. [`DomainTrie`] layers the policy used
//! for domain names on top of it: keys are compared without regard to
//! ASCII case, and they may be no longer than a configured limit. The
//! [`Zone`](crate::zone::Zone) and [`Catalog`](crate::zone::Catalog)
//! structures both index their contents with a [`DomainTrie`].

use std::borrow::Cow;
use std::fmt;

mod bitmap;
pub use bitmap::BitmapTrie;

/// The default maximum key length of a [`DomainTrie`]: the longest
/// textual form of a domain name that the rest of the crate produces.
pub const DEFAULT_KEY_LIMIT: usize = 255;

////////////////////////////////////////////////////////////////////////
// DOMAIN TRIE                                                        //
////////////////////////////////////////////////////////////////////////

/// A [`BitmapTrie`] keyed by domain-name text.
///
/// Each character of the key is one step in the trie. Keys are
/// lower-cased before use, so `WWW` and `www` are the same key. Keys
/// longer than the key limit are rejected with
/// [`Error::KeyLimitExceeded`] by every operation, and a rejected
/// operation leaves the trie unchanged.
#[derive(Debug)]
pub struct DomainTrie<T> {
    trie: BitmapTrie<T>,
    key_limit: usize,
}

impl<T> DomainTrie<T> {
    /// Creates a new, empty `DomainTrie` with the
    /// [default key limit](DEFAULT_KEY_LIMIT).
    pub fn new() -> Self {
        Self::with_key_limit(DEFAULT_KEY_LIMIT)
    }

    /// Creates a new, empty `DomainTrie` that accepts keys of at most
    /// `key_limit` characters.
    pub fn with_key_limit(key_limit: usize) -> Self {
        Self {
            trie: BitmapTrie::new(),
            key_limit,
        }
    }

    /// Returns the maximum key length.
    pub fn key_limit(&self) -> usize {
        self.key_limit
    }

    /// Adds `value` to the values stored under `key`.
    pub fn put(&mut self, key: &str, value: T) -> Result<()> {
        let key = self.compose_key(key)?;
        self.trie.put(&key, value)
    }

    /// Replaces the values stored under `key` with `value`. The key
    /// must already be present.
    pub fn update(&mut self, key: &str, value: T) -> Result<Vec<T>> {
        let key = self.compose_key(key)?;
        self.trie.update(&key, value)
    }

    /// Removes `key`, returning the values stored under it.
    pub fn delete(&mut self, key: &str) -> Result<Vec<T>> {
        let key = self.compose_key(key)?;
        self.trie.delete(&key)
    }

    /// Returns the values stored under `key`. See
    /// [`BitmapTrie::search`].
    pub fn search(&self, key: &str) -> Result<&[T]> {
        let key = self.compose_key(key)?;
        self.trie.search(&key)
    }

    /// Returns whether the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Turns a domain-name key into the character sequence used in the
    /// underlying [`BitmapTrie`].
    fn compose_key<'a>(&self, key: &'a str) -> Result<Cow<'a, [u8]>> {
        if key.len() > self.key_limit {
            Err(Error::KeyLimitExceeded)
        } else if key.bytes().any(|c| c.is_ascii_uppercase()) {
            Ok(Cow::Owned(key.to_ascii_lowercase().into_bytes()))
        } else {
            Ok(Cow::Borrowed(key.as_bytes()))
        }
    }
}

impl<T> Default for DomainTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a trie operation failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The key is not present in the trie.
    NotFound,

    /// The key contains a character outside of the trie's alphabet
    /// (zero, or a value of 128 or more).
    InvalidCharacter(u8),

    /// The key is longer than the trie's key limit.
    KeyLimitExceeded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NotFound => f.write_str("key not found"),
            Self::InvalidCharacter(c) => write!(f, "invalid character {:#04x} in key", c),
            Self::KeyLimitExceeded => f.write_str("key is longer than the key limit"),
        }
    }
}

impl std::error::Error for Error {}

/// The type returned by fallible trie operations.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let mut trie = DomainTrie::new();
        trie.put("WWW", 1).unwrap();
        trie.put("www", 2).unwrap();
        assert_eq!(trie.search("wWw"), Ok(&[1, 2][..]));
    }

    #[test]
    fn key_limit_is_enforced_without_modification() {
        let mut trie = DomainTrie::with_key_limit(5);
        assert_eq!(trie.put("abcdef", 1), Err(Error::KeyLimitExceeded));
        assert!(trie.is_empty());
        trie.put("abcde", 1).unwrap();
        assert_eq!(trie.search("abcdef"), Err(Error::KeyLimitExceeded));
        assert_eq!(trie.delete("abcdef"), Err(Error::KeyLimitExceeded));
        assert_eq!(trie.update("abcdef", 2), Err(Error::KeyLimitExceeded));
        assert_eq!(trie.search("abcde"), Ok(&[1][..]));
    }

    #[test]
    fn default_key_limit_fits_longest_name() {
        let trie: DomainTrie<()> = DomainTrie::default();
        assert_eq!(trie.key_limit(), DEFAULT_KEY_LIMIT);
    }

    #[test]
    fn non_ascii_keys_are_rejected() {
        let mut trie = DomainTrie::new();
        assert!(matches!(
            trie.put("b\u{fc}cher", 1),
            Err(Error::InvalidCharacter(_))
        ));
        assert!(trie.is_empty());
    }

    #[test]
    fn is_empty_tracks_puts_and_deletes() {
        let mut trie = DomainTrie::new();
        assert!(trie.is_empty());
        trie.put("a.b", 1).unwrap();
        trie.put("a", 2).unwrap();
        assert!(!trie.is_empty());
        trie.delete("a.b").unwrap();
        assert!(!trie.is_empty());
        trie.delete("A").unwrap();
        assert!(trie.is_empty());
    }
}
