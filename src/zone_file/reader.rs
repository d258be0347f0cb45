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

//! The [`Reader`] structure.

use std::io::BufRead;

use super::{Error, ErrorKind, Result};

/// Performs low-level reading of DNS zone files.
///
/// The [`Reader`] turns physical lines into logical lines. Comments are
/// removed, and a line containing an opening parenthesis is joined with
/// the following lines up to the matching closing parenthesis. The
/// parentheses themselves become blanks. Semicolons and parentheses
/// inside double-quoted strings are left alone.
pub(super) struct Reader<S> {
    stream: S,
    line_number: usize,
    buf: String,
}

/// A logical line read by a [`Reader`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Line {
    /// The number of the physical line on which the logical line starts.
    pub number: usize,

    /// Whether the line starts with a blank.
    pub indented: bool,

    /// The text of the line, without comments or parentheses.
    pub text: String,
}

impl Line {
    /// Returns the blank-separated fields of the line.
    pub fn fields(&self) -> Vec<&str> {
        self.text.split(is_blank).filter(|f| !f.is_empty()).collect()
    }

    /// Returns whether the line is a directive (starts with `$`).
    pub fn is_directive(&self) -> bool {
        self.text.starts_with('$')
    }
}

impl<S: BufRead> Reader<S> {
    /// Constructs a new [`Reader`] from the given stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            line_number: 0,
            buf: String::new(),
        }
    }

    /// Reads the next logical line that is not blank. Returns [`None`]
    /// at the end of the stream.
    pub fn next_line(&mut self) -> Result<Option<Line>> {
        loop {
            if !self.read_physical_line()? {
                return Ok(None);
            }
            let number = self.line_number;
            let mut text = String::new();
            let mut depth = 0;
            append_stripped(&self.buf, &mut text, &mut depth)
                .map_err(|kind| Error::new(number, kind))?;
            while depth > 0 {
                if !self.read_physical_line()? {
                    return Err(Error::new(number, ErrorKind::EofBeforeCloseParen));
                }
                text.push(' ');
                append_stripped(&self.buf, &mut text, &mut depth)
                    .map_err(|kind| Error::new(number, kind))?;
            }

            if !text.trim_matches(is_blank).is_empty() {
                return Ok(Some(Line {
                    number,
                    indented: text.starts_with(is_blank),
                    text: text.trim_end_matches(is_blank).to_owned(),
                }));
            }
        }
    }

    /// Reads a physical line into the buffer, without its line ending.
    /// Returns `false` at the end of the stream.
    fn read_physical_line(&mut self) -> Result<bool> {
        self.buf.clear();
        if self.stream.read_line(&mut self.buf)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        let len = self.buf.trim_end_matches(['\r', '\n']).len();
        self.buf.truncate(len);
        Ok(true)
    }
}

/// Appends `line` to `text`, removing its comment and replacing
/// parentheses with blanks. `depth` tracks the parenthesis nesting
/// across calls.
fn append_stripped(
    line: &str,
    text: &mut String,
    depth: &mut usize,
) -> std::result::Result<(), ErrorKind> {
    let mut quoted = false;
    let mut escaped = false;
    for c in line.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        } else if !quoted {
            match c {
                ';' => break,
                '(' => {
                    *depth += 1;
                    text.push(' ');
                    continue;
                }
                ')' => {
                    *depth = depth.checked_sub(1).ok_or(ErrorKind::UnmatchedCloseParen)?;
                    text.push(' ');
                    continue;
                }
                _ => (),
            }
        }
        text.push(c);
    }
    Ok(())
}

/// Returns whether `c` separates fields.
pub(super) fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
