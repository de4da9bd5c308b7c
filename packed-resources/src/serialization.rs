// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Declares the foundational data primitives inside packed resources data.

A container is laid out as:

```text
offset 0                   GlobalHeader
offset GLOBAL_HEADER_SIZE  EntryHeader * file_count
offset data_region_offset  payload bytes, concatenated in entry order
```

Every field is encoded little-endian with no padding between fields.
*/

use {
    byteorder::{ByteOrder, LittleEndian, WriteBytesExt},
    std::io::Write,
};

/// Encoded size of [GlobalHeader] in bytes.
pub const GLOBAL_HEADER_SIZE: usize = 8 + 8;

/// Encoded size of [EntryHeader] in bytes.
pub const ENTRY_HEADER_SIZE: usize = 4 + 8 + 8;

/// The header at the very start of a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalHeader {
    /// Number of entry headers following this header.
    pub file_count: u64,

    /// Offset from the start of the container to the first payload byte.
    pub data_region_offset: u64,
}

impl GlobalHeader {
    /// Decode a header from the start of `data`.
    ///
    /// Returns `None` if `data` is too short to hold a header.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..GLOBAL_HEADER_SIZE)?;

        Some(Self {
            file_count: LittleEndian::read_u64(&data[0..8]),
            data_region_offset: LittleEndian::read_u64(&data[8..16]),
        })
    }

    pub fn write<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_u64::<LittleEndian>(self.file_count)?;
        dest.write_u64::<LittleEndian>(self.data_region_offset)?;

        Ok(())
    }
}

/// Describes the location of a single resource's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryHeader {
    /// Identifier of the resource.
    pub id: i32,

    /// Offset of the payload relative to the start of the data region.
    pub payload_offset: u64,

    /// Length of the payload in bytes.
    pub payload_size: u64,
}

impl EntryHeader {
    /// Decode an entry header from the start of `data`.
    ///
    /// Returns `None` if `data` is too short to hold an entry header.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..ENTRY_HEADER_SIZE)?;

        Some(Self {
            id: LittleEndian::read_i32(&data[0..4]),
            payload_offset: LittleEndian::read_u64(&data[4..12]),
            payload_size: LittleEndian::read_u64(&data[12..20]),
        })
    }

    pub fn write<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        dest.write_i32::<LittleEndian>(self.id)?;
        dest.write_u64::<LittleEndian>(self.payload_offset)?;
        dest.write_u64::<LittleEndian>(self.payload_size)?;

        Ok(())
    }
}
