// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::error::{PackedResourcesError, Result},
    std::{
        borrow::Cow,
        path::{Path, PathBuf},
    },
};

/// The source of a resource's data.
///
/// Data can live in memory or be backed by a file that is read when the
/// container is compiled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceData {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl ResourceData {
    /// Resolve the data for this instance.
    ///
    /// If backed by a file, the file will be read.
    pub fn resolve(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => {
                let data =
                    std::fs::read(path).map_err(|source| PackedResourcesError::SourceReadFailure {
                        path: path.clone(),
                        source,
                    })?;

                Ok(Cow::Owned(data))
            }
            Self::Memory(data) => Ok(Cow::Borrowed(data)),
        }
    }
}

impl From<&Path> for ResourceData {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ResourceData {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for ResourceData {
    fn from(data: Vec<u8>) -> Self {
        Self::Memory(data)
    }
}

impl From<&[u8]> for ResourceData {
    fn from(data: &[u8]) -> Self {
        Self::Memory(data.into())
    }
}

/// A resource to be written into a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Identifier the resource is resolved by.
    pub id: i32,

    /// Where the resource's bytes come from.
    pub data: ResourceData,
}

impl ResourceEntry {
    pub fn new(id: i32, data: impl Into<ResourceData>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }
}

/// A resource read back out of a container.
///
/// `data` borrows from the container buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resource<'a> {
    pub id: i32,
    pub data: &'a [u8],
}
