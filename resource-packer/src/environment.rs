// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolve settings from the execution environment.

use {
    anyhow::{anyhow, Result},
    std::{
        env,
        path::{Path, PathBuf},
    },
};

pub const RESOURCE_PACKER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Manifest file name used when nothing else is specified.
pub const DEFAULT_MANIFEST_FILENAME: &str = "files.json";

/// Environment variable overriding the default manifest path.
pub const MANIFEST_ENV: &str = "RESOURCE_PACKER_MANIFEST";

/// Environment variable overriding the default output directory.
pub const OUT_DIR_ENV: &str = "RESOURCE_PACKER_OUT_DIR";

/// Environment variable Cargo sets for build scripts.
pub const CARGO_OUT_DIR_ENV: &str = "OUT_DIR";

/// Resolve the manifest path.
///
/// An explicit value wins, then `RESOURCE_PACKER_MANIFEST`, then
/// `files.json` in the current directory.
pub fn resolve_manifest_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        path.to_path_buf()
    } else if let Some(path) = env::var_os(MANIFEST_ENV) {
        PathBuf::from(path)
    } else {
        PathBuf::from(DEFAULT_MANIFEST_FILENAME)
    }
}

/// Resolve the directory generated artifacts are written to.
///
/// An explicit value wins, then `RESOURCE_PACKER_OUT_DIR`, then the current
/// directory.
pub fn resolve_out_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        path.to_path_buf()
    } else if let Some(path) = env::var_os(OUT_DIR_ENV) {
        PathBuf::from(path)
    } else {
        PathBuf::from(".")
    }
}

/// The output directory Cargo assigned to the running build script.
pub fn build_script_out_dir() -> Result<PathBuf> {
    env::var_os(CARGO_OUT_DIR_ENV)
        .map(PathBuf::from)
        .ok_or_else(|| {
            anyhow!(
                "{} is not set; is this running from a build script?",
                CARGO_OUT_DIR_ENV
            )
        })
}

pub fn canonicalize_path(path: &Path) -> Result<PathBuf, std::io::Error> {
    let mut p = path.canonicalize()?;

    // Strip \\?\ prefix on Windows and replace \ with /, which is valid.
    if cfg!(windows) {
        let mut s = p.display().to_string().replace('\\', "/");
        if s.starts_with("//?/") {
            s = s[4..].to_string();
        }

        p = PathBuf::from(s);
    }

    Ok(p)
}
