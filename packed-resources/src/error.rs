// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Errors raised when producing or consuming packed resources.
#[derive(Debug, Error)]
pub enum PackedResourcesError {
    #[error("malformed container: {0}")]
    MalformedContainer(&'static str),

    #[error("entry {index} at offset {offset} extends past the end of the container")]
    TruncatedEntry { index: usize, offset: usize },

    #[error(
        "payload of resource {id} ({size} bytes at offset {offset}) exceeds container of {container_len} bytes"
    )]
    PayloadOutOfRange {
        id: i32,
        offset: u64,
        size: u64,
        container_len: usize,
    },

    #[error("resource {0} not found")]
    NotFound(i32),

    #[error("no files to compile")]
    EmptyInput,

    #[error("failed to read {}: {source}", .path.display())]
    SourceReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, PackedResourcesError>;
