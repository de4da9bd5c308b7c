// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        codegen::OutputFormat,
        environment::{
            build_script_out_dir, resolve_manifest_path, resolve_out_dir,
            RESOURCE_PACKER_VERSION,
        },
        logging,
        manifest::Manifest,
        packing::{self, CompileOptions},
    },
    anyhow::{Context, Result},
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    log::info,
    std::{
        path::{Path, PathBuf},
        str::FromStr,
    },
};

const ADD_ABOUT: &str = "\
Add files to the resources manifest.

Each FILE must exist. Files receive consecutive integer ids starting one
past the largest id already in the manifest, or 0 for a new manifest.

The manifest is created if it does not exist. A manifest that exists but
cannot be parsed is left alone and the command fails.
";

const COMPILE_ABOUT: &str = "\
Compile the files in the manifest into a packed resources container.

Every file named by the manifest is read and the container is rendered into
each requested output format. Nothing is written unless every file could be
read and every output rendered.

Formats:

rust  resources.rs holding the container as a static byte array
cpp   resources.h and resources.cpp holding the same
bin   resources.bin holding the raw container

Each generated source file also declares a constant per resource, mapping its
symbolic name to its id. Names must be usable identifiers in the target
language. Keywords, standard C++ macros such as NULL or EOF, and the name of
the byte array itself are rejected.
";

const INSPECT_ABOUT: &str = "\
Print the entries of a compiled container.

One line is printed per entry, in table order, with the entry's id and the
offset and size of its payload within the data region.
";

const RUN_BUILD_SCRIPT_ABOUT: &str = "\
Run functionality that a Rust build script would perform.

The container is written to resources.bin in the directory named by the
OUT_DIR environment variable, along with a resources.rs module embedding it
via include_bytes!. Lines telling Cargo to re-run the build script when the
manifest or any packed file changes are printed to stdout.
";

fn command() -> Command {
    Command::new("resource-packer")
        .version(RESOURCE_PACKER_VERSION)
        .about("Pack files into a container and generate code embedding it")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the resources manifest [default: files.json]"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase logging verbosity. Can be specified multiple times"),
        )
        .subcommand(
            Command::new("add")
                .about("Add files to the resources manifest")
                .long_about(ADD_ABOUT)
                .arg(
                    Arg::new("files")
                        .value_name("FILE")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Files to add"),
                ),
        )
        .subcommand(
            Command::new("compile")
                .about("Compile manifest files into a container and source code")
                .long_about(COMPILE_ABOUT)
                .arg(
                    Arg::new("out_dir")
                        .long("out-dir")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory to write generated files to"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .action(ArgAction::Append)
                        .value_parser(OutputFormat::NAMES)
                        .default_value("rust")
                        .help("Output format to generate"),
                )
                .arg(
                    Arg::new("symbol")
                        .long("symbol")
                        .value_name("NAME")
                        .help("Name of the generated byte array"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the entries of a compiled container")
                .long_about(INSPECT_ABOUT)
                .arg(
                    Arg::new("container")
                        .value_name("CONTAINER")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to a compiled container"),
                ),
        )
        .subcommand(
            Command::new("run-build-script")
                .about("Run functionality that a build script would perform")
                .long_about(RUN_BUILD_SCRIPT_ABOUT)
                .arg(
                    Arg::new("symbol")
                        .long("symbol")
                        .value_name("NAME")
                        .help("Name of the generated byte array"),
                ),
        )
}

fn command_add(manifest_path: &Path, args: &ArgMatches) -> Result<()> {
    let files = args
        .get_many::<PathBuf>("files")
        .into_iter()
        .flatten()
        .cloned()
        .collect::<Vec<_>>();

    let mut manifest = Manifest::load_or_default(manifest_path)?;
    let ids = manifest.add_files(manifest_path, &files)?;
    manifest.write(manifest_path)?;

    for (path, id) in files.iter().zip(ids) {
        info!("added {} as resource {}", path.display(), id);
    }

    Ok(())
}

fn command_compile(manifest_path: &Path, args: &ArgMatches) -> Result<()> {
    let formats = args
        .get_many::<String>("format")
        .into_iter()
        .flatten()
        .map(|name| OutputFormat::from_str(name))
        .collect::<Result<Vec<_>>>()?;

    let options = CompileOptions {
        out_dir: resolve_out_dir(args.get_one::<PathBuf>("out_dir").map(PathBuf::as_path)),
        formats,
        symbol: args.get_one::<String>("symbol").cloned(),
    };

    packing::compile_to_directory(manifest_path, &options)?;

    Ok(())
}

fn command_inspect(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("container")
        .expect("container argument is required");

    let data = std::fs::read(path)
        .with_context(|| format!("failed to open '{}' for read", path.display()))?;

    let entries = packing::inspect_container(&data)
        .with_context(|| format!("inspecting '{}'", path.display()))?;

    info!("{} contains {} resources", path.display(), entries.len());
    for entry in entries {
        println!(
            "id={} offset={} size={}",
            entry.id, entry.payload_offset, entry.payload_size
        );
    }

    Ok(())
}

fn command_run_build_script(manifest_path: &Path, args: &ArgMatches) -> Result<()> {
    let out_dir = build_script_out_dir()?;

    packing::run_build_script(
        manifest_path,
        &out_dir,
        args.get_one::<String>("symbol").map(|s| s.as_str()),
        &mut std::io::stdout(),
    )
}

pub fn run_cli() -> Result<()> {
    let matches = command().get_matches();

    let (name, args) = matches
        .subcommand()
        .expect("subcommand is required");

    logging::init_logger(args.get_count("verbose"));

    let manifest_path =
        resolve_manifest_path(args.get_one::<PathBuf>("manifest").map(|p| p.as_path()));

    match name {
        "add" => command_add(&manifest_path, args),
        "compile" => command_compile(&manifest_path, args),
        "inspect" => command_inspect(args),
        "run-build-script" => command_run_build_script(&manifest_path, args),
        _ => unreachable!("unhandled subcommand: {}", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn test_global_arguments_after_subcommand() {
        let matches = command()
            .try_get_matches_from([
                "resource-packer",
                "compile",
                "-vv",
                "--manifest",
                "r.json",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();

        assert_eq!(name, "compile");
        assert_eq!(args.get_count("verbose"), 2);
        assert_eq!(
            args.get_one::<PathBuf>("manifest"),
            Some(&PathBuf::from("r.json"))
        );
        assert_eq!(
            args.get_many::<String>("format")
                .unwrap()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["rust"]
        );
    }

    #[test]
    fn test_compile_formats() {
        let matches = command()
            .try_get_matches_from([
                "resource-packer",
                "compile",
                "--format",
                "cpp",
                "--format",
                "bin",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();

        assert_eq!(
            args.get_many::<String>("format")
                .unwrap()
                .map(|s| s.as_str())
                .collect::<Vec<_>>(),
            vec!["cpp", "bin"]
        );

        assert!(command()
            .try_get_matches_from(["resource-packer", "compile", "--format", "java"])
            .is_err());
    }

    #[test]
    fn test_add_requires_files() {
        assert!(command()
            .try_get_matches_from(["resource-packer", "add"])
            .is_err());
    }
}
