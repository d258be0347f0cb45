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

//! Crate-private utilities.

use std::num::ParseIntError;

/// Reads a network-byte-order `u16` from the beginning of `octets`,
/// returning [`None`] if there are fewer than two octets.
pub fn read_u16(octets: &[u8]) -> Option<u16> {
    match *octets {
        [high, low, ..] => Some(u16::from_be_bytes([high, low])),
        _ => None,
    }
}

/// Returns whether `octet` may appear unescaped in the textual form of
/// a label.
pub fn is_printable_label_octet(octet: u8) -> bool {
    octet.is_ascii_graphic() && octet != b'.' && octet != b'\\'
}

/// Parses the generic `CLASSnn`/`TYPEnn` form of [RFC 3597 § 5], where
/// `prefix` is `CLASS` or `TYPE` (matched case-insensitively). Returns
/// [`None`] if `text` does not start with `prefix`.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
pub fn parse_generic_mnemonic(text: &str, prefix: &str) -> Option<Result<u16, ParseIntError>> {
    let value = text
        .get(..prefix.len())
        .filter(|start| start.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])?;
    Some(value.parse())
}
