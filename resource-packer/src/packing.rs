// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compile manifests into containers and generated artifacts.

use {
    crate::{
        codegen::{
            render_artifacts, render_build_script_module, write_generated_files, GeneratedFile,
            OutputFormat, BIN_FILENAME, RUST_FILENAME,
        },
        environment::canonicalize_path,
        manifest::{Manifest, ResourceSymbol},
    },
    anyhow::{Context, Result},
    log::{debug, info, warn},
    packed_resources::{compile, EntryHeader, PackedResources},
    std::{
        io::Write,
        path::{Path, PathBuf},
    },
};

/// Settings for compiling a manifest into source artifacts.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Directory artifacts are written to.
    pub out_dir: PathBuf,

    /// Artifact kinds to produce.
    pub formats: Vec<OutputFormat>,

    /// Name of the byte array in generated code.
    pub symbol: Option<String>,
}

/// A compiled container and the symbolic names of its entries.
#[derive(Clone, Debug)]
pub struct CompiledResources {
    pub container: Vec<u8>,
    pub symbols: Vec<ResourceSymbol>,
    /// Resolved path of every source file, in manifest order.
    pub sources: Vec<PathBuf>,
}

/// Read a manifest and every file it references, producing a container.
///
/// Any unreadable file aborts the whole compilation.
pub fn compile_manifest(manifest_path: &Path) -> Result<CompiledResources> {
    let manifest = Manifest::load(manifest_path)?;
    let symbols = manifest.symbols()?;
    let sources = manifest.source_paths(manifest_path);
    let entries = manifest.resolve_entries(manifest_path);

    debug!(
        "compiling {} resources from {}",
        entries.len(),
        manifest_path.display()
    );

    let container = compile(&entries)?;

    Ok(CompiledResources {
        container,
        symbols,
        sources,
    })
}

/// Compile a manifest and write the requested artifacts.
///
/// All artifacts are rendered in memory before anything is written, so a
/// failure leaves the output directory untouched. Returns the paths written.
pub fn compile_to_directory(
    manifest_path: &Path,
    options: &CompileOptions,
) -> Result<Vec<PathBuf>> {
    let compiled = compile_manifest(manifest_path)?;

    let mut formats = options.formats.clone();
    formats.sort();
    formats.dedup();

    if formats.is_empty() {
        warn!("no output formats requested; nothing will be written");
    }

    let mut files = Vec::new();
    for format in formats {
        files.extend(render_artifacts(
            format,
            &compiled.container,
            &compiled.symbols,
            options.symbol.as_deref(),
        )?);
    }

    let paths = write_generated_files(&options.out_dir, &files)?;
    for path in &paths {
        info!("writing {}", path.display());
    }

    info!(
        "successfully compiled {} resources ({} bytes)",
        compiled.symbols.len(),
        compiled.container.len()
    );

    Ok(paths)
}

/// Perform the work of a Cargo build script.
///
/// Writes the raw container and a Rust module including it into `out_dir`,
/// then emits `cargo:` lines to `dest` so the build is re-run when the
/// manifest or any packed file changes.
pub fn run_build_script<W: Write>(
    manifest_path: &Path,
    out_dir: &Path,
    symbol: Option<&str>,
    dest: &mut W,
) -> Result<()> {
    let compiled = compile_manifest(manifest_path)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;
    let container_path = canonicalize_path(out_dir)?.join(BIN_FILENAME);

    let module = render_build_script_module(&container_path, &compiled.symbols, symbol)?;

    write_generated_files(
        out_dir,
        &[
            GeneratedFile {
                filename: BIN_FILENAME,
                data: compiled.container,
            },
            GeneratedFile {
                filename: RUST_FILENAME,
                data: module.into_bytes(),
            },
        ],
    )?;

    writeln!(dest, "cargo:rerun-if-changed={}", manifest_path.display())?;
    for source in &compiled.sources {
        writeln!(dest, "cargo:rerun-if-changed={}", source.display())?;
    }

    Ok(())
}

/// Describe every entry of a compiled container.
///
/// Each entry is validated, including its payload bounds.
pub fn inspect_container(data: &[u8]) -> Result<Vec<EntryHeader>> {
    let resources = PackedResources::parse(data)?;

    (0..resources.len())
        .map(|index| -> Result<EntryHeader> {
            let entry = resources.entry_header(index)?;
            resources.resolve(&entry)?;

            Ok(entry)
        })
        .collect()
}
