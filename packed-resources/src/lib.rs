// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Packed Resources

This crate defines and implements a data format for storing a set of files
in a single contiguous blob. We call this data format *packed resources*.

The idea is that a producer collects files at build time, assigns each of
them an integer identifier, and serializes everything into one buffer: a
fixed-size global header, a table of fixed-size entry headers, then the
concatenated file payloads.

Later, typically at run time and against a buffer embedded in a binary, the
buffer is consulted to resolve an identifier to the bytes of the file it
describes. Resolution never copies: callers get a slice borrowing from the
container.

```
use packed_resources::{compile, lookup, ResourceEntry};

let container = compile(&[
    ResourceEntry::new(1, b"AB".to_vec()),
    ResourceEntry::new(2, b"XYZ".to_vec()),
])
.unwrap();

assert_eq!(lookup(&container, 2).unwrap(), b"XYZ");
```

All multi-byte fields are encoded little-endian, field by field, so
containers produced on one host can be read on any other.
*/

mod error;
mod parser;
mod resource;
mod serialization;
mod writer;

pub use crate::{
    error::{PackedResourcesError, Result},
    parser::{lookup, PackedResources, ResourceParserIterator},
    resource::{Resource, ResourceData, ResourceEntry},
    serialization::{EntryHeader, GlobalHeader, ENTRY_HEADER_SIZE, GLOBAL_HEADER_SIZE},
    writer::{compile, write_packed_resources},
};
