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

//! A small authoritative-only DNS server.
//!
//! Zone data is read from BIND-style zone files (see [`zone_file`])
//! into [`Zone`](zone::Zone)s, which index their records by relative
//! domain name in a bitmap-indexed prefix trie (see [`trie`]). The
//! zones are gathered into a write-once [`Catalog`](zone::Catalog)
//! during start-up. The [`Server`](server::Server) then decodes UDP
//! queries (see [`message`]), answers them from the catalog, and
//! encodes responses of at most 512 octets, signaling truncation
//! in-band with the TC bit.
//!
//! Network I/O is kept separate from the processing logic. The Tokio
//! I/O provider in [`io`] (enabled with the `tokio` feature) binds the
//! UDP sockets and runs the server.

pub mod class;
#[cfg(feature = "tokio")]
pub mod io;
pub mod message;
pub mod name;
pub mod rr;
pub mod server;
pub mod trie;
mod util;
pub mod zone;
pub mod zone_file;
