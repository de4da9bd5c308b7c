// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Parsing of packed resources data blobs.

Nothing in this module allocates (except [PackedResources::index]) or copies
payload data. Every offset read from the container is bounds checked against
the container length before use, so arbitrary input never causes an
out-of-bounds access.
*/

use {
    crate::{
        error::{PackedResourcesError, Result},
        resource::Resource,
        serialization::{EntryHeader, GlobalHeader, ENTRY_HEADER_SIZE, GLOBAL_HEADER_SIZE},
    },
    std::collections::HashMap,
};

/// Resolve the payload of resource `id` in a packed resources container.
///
/// Entries are scanned in table order and the first entry with a matching
/// id wins. The returned slice borrows from `data`.
pub fn lookup(data: &[u8], id: i32) -> Result<&[u8]> {
    PackedResources::parse(data)?.get(id)
}

/// A packed resources container whose global header has been validated.
#[derive(Clone, Copy, Debug)]
pub struct PackedResources<'a> {
    data: &'a [u8],
    file_count: usize,
    data_region_offset: u64,
}

impl<'a> PackedResources<'a> {
    /// Validate the global header of a container.
    ///
    /// Entry headers are not read until they are needed.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = GlobalHeader::from_bytes(data).ok_or(
            PackedResourcesError::MalformedContainer("container shorter than global header"),
        )?;

        if header.file_count == 0 {
            return Err(PackedResourcesError::MalformedContainer(
                "container declares no files",
            ));
        }

        let file_count = usize::try_from(header.file_count).map_err(|_| {
            PackedResourcesError::MalformedContainer("file count exceeds address space")
        })?;

        Ok(Self {
            data,
            file_count,
            data_region_offset: header.data_region_offset,
        })
    }

    /// The number of entries the container claims to hold.
    pub fn len(&self) -> usize {
        self.file_count
    }

    /// Always false: a container holding no entries fails to parse.
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Offset of the payload region, as stored in the global header.
    pub fn data_region_offset(&self) -> u64 {
        self.data_region_offset
    }

    /// Read the entry header at `index` in the entry table.
    pub fn entry_header(&self, index: usize) -> Result<EntryHeader> {
        let offset = index
            .checked_mul(ENTRY_HEADER_SIZE)
            .and_then(|v| v.checked_add(GLOBAL_HEADER_SIZE))
            .ok_or(PackedResourcesError::MalformedContainer(
                "entry index exceeds address space",
            ))?;

        self.data
            .get(offset..)
            .and_then(EntryHeader::from_bytes)
            .ok_or(PackedResourcesError::TruncatedEntry { index, offset })
    }

    /// Obtain the payload slice described by an entry header.
    pub fn resolve(&self, entry: &EntryHeader) -> Result<&'a [u8]> {
        let out_of_range = || PackedResourcesError::PayloadOutOfRange {
            id: entry.id,
            offset: entry.payload_offset,
            size: entry.payload_size,
            container_len: self.data.len(),
        };

        let start = self
            .data_region_offset
            .checked_add(entry.payload_offset)
            .ok_or_else(out_of_range)?;
        let end = start
            .checked_add(entry.payload_size)
            .ok_or_else(out_of_range)?;

        if end > self.data.len() as u64 {
            return Err(out_of_range());
        }

        // Both bounds are <= data.len() and so fit in usize.
        Ok(&self.data[start as usize..end as usize])
    }

    /// Resolve the payload of resource `id`.
    ///
    /// This is a linear scan over the entry table. The scan stops at the
    /// first matching entry, so entries after it are never validated.
    pub fn get(&self, id: i32) -> Result<&'a [u8]> {
        for index in 0..self.file_count {
            let entry = self.entry_header(index)?;

            if entry.id == id {
                return self.resolve(&entry);
            }
        }

        Err(PackedResourcesError::NotFound(id))
    }

    /// Iterate over every entry in the container, in table order.
    pub fn iter(&self) -> ResourceParserIterator<'a> {
        ResourceParserIterator {
            resources: *self,
            index: 0,
            done: false,
        }
    }

    /// Build a map of id to payload for every entry.
    ///
    /// When ids repeat, the first entry is kept, matching [Self::get]. Unlike
    /// [Self::get], every entry is validated.
    pub fn index(&self) -> Result<HashMap<i32, &'a [u8]>> {
        let mut index = HashMap::with_capacity(self.file_count);

        for resource in self.iter() {
            let resource = resource?;
            index.entry(resource.id).or_insert(resource.data);
        }

        Ok(index)
    }
}

/// An iterator over the entries of a packed resources container.
///
/// The iterator emits [Resource] instances. Each entry is read and
/// validated when the iterator reaches it. The first error ends iteration.
pub struct ResourceParserIterator<'a> {
    resources: PackedResources<'a>,
    index: usize,
    done: bool,
}

impl<'a> ResourceParserIterator<'a> {
    /// The number of resources the container claims to hold.
    pub fn expected_resources_count(&self) -> usize {
        self.resources.len()
    }
}

impl<'a> Iterator for ResourceParserIterator<'a> {
    type Item = Result<Resource<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.resources.len() {
            return None;
        }

        let index = self.index;
        self.index += 1;

        let res = self.resources.entry_header(index).and_then(|entry| {
            Ok(Resource {
                id: entry.id,
                data: self.resources.resolve(&entry)?,
            })
        });

        if res.is_err() {
            self.done = true;
        }

        Some(res)
    }
}
