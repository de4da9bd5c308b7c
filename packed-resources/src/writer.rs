// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Serialization of packed resources data blobs. */

use {
    crate::{
        error::{PackedResourcesError, Result},
        resource::ResourceEntry,
        serialization::{EntryHeader, GlobalHeader, ENTRY_HEADER_SIZE, GLOBAL_HEADER_SIZE},
    },
    std::{borrow::Cow, io::Write},
};

/// A container whose sources have all been resolved.
///
/// `index` holds the encoded global header and entry table. `payloads` holds
/// the entry data in input order.
struct PreparedContainer<'a> {
    index: Vec<u8>,
    payloads: Vec<Cow<'a, [u8]>>,
}

impl<'a> PreparedContainer<'a> {
    fn prepare(entries: &'a [ResourceEntry]) -> Result<Self> {
        if entries.is_empty() {
            return Err(PackedResourcesError::EmptyInput);
        }

        // Every source must be readable before anything is laid out.
        let payloads = entries
            .iter()
            .map(|entry| entry.data.resolve())
            .collect::<Result<Vec<_>>>()?;

        let index_length = GLOBAL_HEADER_SIZE + entries.len() * ENTRY_HEADER_SIZE;
        let mut index = Vec::with_capacity(index_length);

        GlobalHeader {
            file_count: entries.len() as u64,
            data_region_offset: index_length as u64,
        }
        .write(&mut index)?;

        let mut payload_offset = 0u64;

        for (entry, payload) in entries.iter().zip(&payloads) {
            let payload_size = payload.len() as u64;

            EntryHeader {
                id: entry.id,
                payload_offset,
                payload_size,
            }
            .write(&mut index)?;

            payload_offset += payload_size;
        }

        Ok(Self { index, payloads })
    }

    fn total_length(&self) -> usize {
        self.index.len() + self.payloads.iter().map(|p| p.len()).sum::<usize>()
    }

    fn write<W: Write>(&self, dest: &mut W) -> Result<()> {
        dest.write_all(&self.index)?;

        for payload in &self.payloads {
            dest.write_all(payload)?;
        }

        Ok(())
    }
}

/// Write a packed resources container to a writer.
///
/// Entries are written in the order given. Entries sharing an id are all
/// written; readers resolve such an id to the first of them.
///
/// All entry sources are resolved before `dest` is written to, so a failure
/// to read any source leaves `dest` untouched.
pub fn write_packed_resources<W: Write>(entries: &[ResourceEntry], dest: &mut W) -> Result<()> {
    PreparedContainer::prepare(entries)?.write(dest)
}

/// Compile entries into an in-memory packed resources container.
pub fn compile(entries: &[ResourceEntry]) -> Result<Vec<u8>> {
    let prepared = PreparedContainer::prepare(entries)?;

    let mut data = Vec::with_capacity(prepared.total_length());
    prepared.write(&mut data)?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        byteorder::{LittleEndian, WriteBytesExt},
        std::path::PathBuf,
    };

    #[test]
    fn test_write_empty() {
        let mut data = Vec::new();

        assert!(matches!(
            write_packed_resources(&[], &mut data),
            Err(PackedResourcesError::EmptyInput)
        ));
        assert!(data.is_empty());

        assert!(matches!(compile(&[]), Err(PackedResourcesError::EmptyInput)));
    }

    #[test]
    fn test_write_single() -> anyhow::Result<()> {
        let data = compile(&[ResourceEntry::new(7, b"foo".to_vec())])?;

        let mut expected: Vec<u8> = Vec::new();
        // Number of files.
        expected.write_u64::<LittleEndian>(1)?;
        // Start of data region.
        expected.write_u64::<LittleEndian>((GLOBAL_HEADER_SIZE + ENTRY_HEADER_SIZE) as u64)?;
        // Entry id, payload offset, payload size.
        expected.write_i32::<LittleEndian>(7)?;
        expected.write_u64::<LittleEndian>(0)?;
        expected.write_u64::<LittleEndian>(3)?;
        expected.write_all(b"foo")?;

        assert_eq!(data, expected);

        Ok(())
    }

    #[test]
    fn test_write_layout() -> anyhow::Result<()> {
        let data = compile(&[
            ResourceEntry::new(1, b"AB".to_vec()),
            ResourceEntry::new(2, b"XYZ".to_vec()),
        ])?;

        let data_region_offset = GLOBAL_HEADER_SIZE + 2 * ENTRY_HEADER_SIZE;
        assert_eq!(data.len(), data_region_offset + 5);

        assert_eq!(
            GlobalHeader::from_bytes(&data),
            Some(GlobalHeader {
                file_count: 2,
                data_region_offset: data_region_offset as u64,
            })
        );
        assert_eq!(
            EntryHeader::from_bytes(&data[GLOBAL_HEADER_SIZE..]),
            Some(EntryHeader {
                id: 1,
                payload_offset: 0,
                payload_size: 2,
            })
        );
        assert_eq!(
            EntryHeader::from_bytes(&data[GLOBAL_HEADER_SIZE + ENTRY_HEADER_SIZE..]),
            Some(EntryHeader {
                id: 2,
                payload_offset: 2,
                payload_size: 3,
            })
        );
        assert_eq!(&data[data_region_offset..], b"ABXYZ");

        Ok(())
    }

    #[test]
    fn test_write_duplicate_ids_preserved() -> anyhow::Result<()> {
        let data = compile(&[
            ResourceEntry::new(3, b"first".to_vec()),
            ResourceEntry::new(3, b"second".to_vec()),
        ])?;

        let header = GlobalHeader::from_bytes(&data).unwrap();
        assert_eq!(header.file_count, 2);
        assert_eq!(
            EntryHeader::from_bytes(&data[GLOBAL_HEADER_SIZE + ENTRY_HEADER_SIZE..])
                .unwrap()
                .id,
            3
        );

        Ok(())
    }

    #[test]
    fn test_write_empty_payload() -> anyhow::Result<()> {
        let data = compile(&[
            ResourceEntry::new(0, Vec::new()),
            ResourceEntry::new(1, b"x".to_vec()),
        ])?;

        let second =
            EntryHeader::from_bytes(&data[GLOBAL_HEADER_SIZE + ENTRY_HEADER_SIZE..]).unwrap();
        assert_eq!(second.payload_offset, 0);
        assert_eq!(second.payload_size, 1);

        Ok(())
    }

    #[test]
    fn test_write_from_path() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("payload.txt");
        std::fs::write(&path, b"from disk")?;

        let data = compile(&[ResourceEntry::new(1, path)])?;
        assert!(data.ends_with(b"from disk"));

        Ok(())
    }

    #[test]
    fn test_unreadable_source_writes_nothing() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let missing = temp_dir.path().join("missing.bin");

        let entries = vec![
            ResourceEntry::new(1, b"fine".to_vec()),
            ResourceEntry::new(2, missing.clone()),
            ResourceEntry::new(3, PathBuf::from("/also/never/read")),
        ];

        let mut data = Vec::new();
        match write_packed_resources(&entries, &mut data) {
            Err(PackedResourcesError::SourceReadFailure { path, .. }) => {
                assert_eq!(path, missing);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(data.is_empty());

        Ok(())
    }
}
