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

//! Implementation of the [`BitmapTrie`] structure.

use std::mem;

use super::{Error, Result};

/// The number of characters in the trie's alphabet. Characters are
/// 7-bit values, and zero is reserved.
const ALPHABET_SIZE: usize = 128;

////////////////////////////////////////////////////////////////////////
// BITMAP TRIE                                                        //
////////////////////////////////////////////////////////////////////////

/// A prefix trie keyed by sequences of 7-bit characters, with any
/// number of values stored per key.
///
/// Each node records which child characters exist in a 128-bit
/// presence bitmap, so that testing whether an edge exists does not
/// require scanning the node's child list. The child list itself is
/// kept in insertion order and is only scanned once the bitmap says
/// the child is there.
///
/// A key is present in the trie if and only if the node it leads to
/// holds at least one value. Nodes that exist only as branch points
/// hold no values. The empty key refers to the root node.
///
/// All operations validate the entire key before touching the trie, so
/// a failed operation never leaves it modified.
#[derive(Debug)]
pub struct BitmapTrie<T> {
    root: Node<T>,
}

#[derive(Debug)]
struct Node<T> {
    bit: u8,
    bitmap: [u8; ALPHABET_SIZE / 8],
    children: Vec<Node<T>>,
    values: Vec<T>,
}

impl<T> BitmapTrie<T> {
    /// Creates a new, empty `BitmapTrie`.
    pub fn new() -> Self {
        Self { root: Node::new(0) }
    }

    /// Appends `value` to the values stored under `key`, creating nodes
    /// along the way as necessary.
    pub fn put(&mut self, key: &[u8], value: T) -> Result<()> {
        check_key(key)?;
        let mut node = &mut self.root;
        for &c in key {
            node = node.child_or_insert(c);
        }
        node.values.push(value);
        Ok(())
    }

    /// Replaces the values stored under `key` with `value`, returning
    /// the values that were replaced. The key must already be present.
    pub fn update(&mut self, key: &[u8], value: T) -> Result<Vec<T>> {
        check_key(key)?;
        let mut node = &mut self.root;
        for &c in key {
            node = node.child_mut(c).ok_or(Error::NotFound)?;
        }
        if node.values.is_empty() {
            Err(Error::NotFound)
        } else {
            Ok(mem::replace(&mut node.values, vec![value]))
        }
    }

    /// Removes `key` and returns the values that were stored under it.
    ///
    /// Keys that extend `key` are not affected. Nodes left holding
    /// neither values nor children are pruned, and their characters are
    /// cleared from their parents' bitmaps.
    pub fn delete(&mut self, key: &[u8]) -> Result<Vec<T>> {
        check_key(key)?;
        delete_from(&mut self.root, key)
    }

    /// Returns the values stored under `key`.
    ///
    /// If `key` leads to a node that exists only as a branch point, the
    /// result is an empty slice. If the path cannot be followed at all,
    /// this fails with [`Error::NotFound`].
    pub fn search(&self, key: &[u8]) -> Result<&[T]> {
        check_key(key)?;
        let mut node = &self.root;
        for &c in key {
            node = node.child(c).ok_or(Error::NotFound)?;
        }
        Ok(&node.values)
    }

    /// Returns whether the trie holds no keys at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_vacant()
    }
}

impl<T> Default for BitmapTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Node<T> {
    fn new(bit: u8) -> Self {
        Self {
            bit,
            bitmap: [0; ALPHABET_SIZE / 8],
            children: Vec::new(),
            values: Vec::new(),
        }
    }

    fn has_child(&self, c: u8) -> bool {
        self.bitmap[c as usize / 8] & (1 << (c % 8)) != 0
    }

    fn child_position(&self, c: u8) -> Option<usize> {
        if self.has_child(c) {
            self.children.iter().position(|child| child.bit == c)
        } else {
            None
        }
    }

    fn child(&self, c: u8) -> Option<&Self> {
        self.child_position(c).map(|i| &self.children[i])
    }

    fn child_mut(&mut self, c: u8) -> Option<&mut Self> {
        self.child_position(c).map(move |i| &mut self.children[i])
    }

    fn child_or_insert(&mut self, c: u8) -> &mut Self {
        let index = match self.child_position(c) {
            Some(i) => i,
            None => {
                self.bitmap[c as usize / 8] |= 1 << (c % 8);
                self.children.push(Self::new(c));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn remove_child(&mut self, c: u8) {
        if let Some(i) = self.child_position(c) {
            self.children.remove(i);
            self.bitmap[c as usize / 8] &= !(1 << (c % 8));
        }
    }

    fn is_vacant(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }
}

/// The recursive implementation of [`BitmapTrie::delete`].
fn delete_from<T>(node: &mut Node<T>, key: &[u8]) -> Result<Vec<T>> {
    match key.split_first() {
        None => {
            if node.values.is_empty() {
                Err(Error::NotFound)
            } else {
                Ok(mem::take(&mut node.values))
            }
        }
        Some((&c, rest)) => {
            let child = node.child_mut(c).ok_or(Error::NotFound)?;
            let removed = delete_from(child, rest)?;
            if child.is_vacant() {
                node.remove_child(c);
            }
            Ok(removed)
        }
    }
}

/// Checks that every character of `key` is within the trie's alphabet.
fn check_key(key: &[u8]) -> Result<()> {
    match key.iter().find(|&&c| c == 0 || c as usize >= ALPHABET_SIZE) {
        Some(&c) => Err(Error::InvalidCharacter(c)),
        None => Ok(()),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
