// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render packed resources containers into embeddable source files.

use {
    crate::{environment::RESOURCE_PACKER_VERSION, manifest::ResourceSymbol},
    anyhow::{anyhow, Context, Result},
    handlebars::Handlebars,
    once_cell::sync::Lazy,
    serde::Serialize,
    std::{
        io::Write,
        path::{Path, PathBuf},
        str::FromStr,
    },
    tempfile::NamedTempFile,
};

pub const RUST_FILENAME: &str = "resources.rs";
pub const CPP_HEADER_FILENAME: &str = "resources.h";
pub const CPP_SOURCE_FILENAME: &str = "resources.cpp";
pub const BIN_FILENAME: &str = "resources.bin";

/// Number of byte literals emitted per line of an array literal.
const BYTES_PER_LINE: usize = 16;

/// Words that can't name an item in generated Rust.
const RUST_RESERVED: &[&str] = &[
    "_", "Self", "abstract", "as", "async", "await", "become", "box", "break", "const",
    "continue", "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for",
    "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override",
    "priv", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try",
    "type", "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// C++ keywords plus macros from the standard headers that would replace a
/// declared name.
const CPP_RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
    "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq", "assert", "errno",
    "BUFSIZ", "CHAR_BIT", "CHAR_MAX", "CHAR_MIN", "EDOM", "EILSEQ", "EOF", "ERANGE",
    "EXIT_FAILURE", "EXIT_SUCCESS", "FILENAME_MAX", "INT_MAX", "INT_MIN", "LONG_MAX",
    "LONG_MIN", "MB_LEN_MAX", "NDEBUG", "NULL", "RAND_MAX", "SCHAR_MAX", "SCHAR_MIN",
    "SEEK_CUR", "SEEK_END", "SEEK_SET", "SHRT_MAX", "SHRT_MIN", "SIZE_MAX", "TMP_MAX",
    "UCHAR_MAX", "UINT_MAX", "ULONG_MAX", "USHRT_MAX",
];

static HANDLEBARS: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("resources.rs", include_str!("templates/resources.rs"))
        .unwrap();
    handlebars
        .register_template_string(
            "build-script-resources.rs",
            include_str!("templates/build-script-resources.rs"),
        )
        .unwrap();
    handlebars
        .register_template_string("resources.h", include_str!("templates/resources.h"))
        .unwrap();
    handlebars
        .register_template_string("resources.cpp", include_str!("templates/resources.cpp"))
        .unwrap();

    handlebars
});

/// Kinds of artifacts that can be generated from a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutputFormat {
    /// A Rust module holding the container as a byte array.
    Rust,
    /// A C++ header and source file pair.
    Cpp,
    /// The raw container bytes.
    Bin,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 3] = ["rust", "cpp", "bin"];

    /// Name of the byte array symbol when none is specified.
    pub fn default_symbol(&self) -> &'static str {
        match self {
            Self::Rust => "RESOURCES",
            Self::Cpp => "g_resources",
            Self::Bin => "",
        }
    }

    /// Whether `name` can be declared in code of this format.
    pub fn is_usable_identifier(&self, name: &str) -> bool {
        let reserved: &[&str] = match self {
            Self::Rust => RUST_RESERVED,
            Self::Cpp => CPP_RESERVED,
            Self::Bin => &[],
        };

        is_valid_identifier(name) && !reserved.iter().any(|word| *word == name)
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rust" => Ok(Self::Rust),
            "cpp" => Ok(Self::Cpp),
            "bin" => Ok(Self::Bin),
            _ => Err(anyhow!("unknown output format: {}", s)),
        }
    }
}

/// A file produced by code generation, not yet written anywhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    /// File name, relative to the output directory.
    pub filename: &'static str,
    pub data: Vec<u8>,
}

#[derive(Serialize)]
struct TemplateData<'a> {
    version: &'static str,
    symbol: &'a str,
    length: usize,
    bytes: String,
    resources: &'a [ResourceSymbol],
    header_filename: &'static str,
    container_path: String,
}

impl<'a> TemplateData<'a> {
    fn new(symbol: &'a str, resources: &'a [ResourceSymbol]) -> Self {
        Self {
            version: RESOURCE_PACKER_VERSION,
            symbol,
            length: 0,
            bytes: String::new(),
            resources,
            header_filename: CPP_HEADER_FILENAME,
            container_path: String::new(),
        }
    }
}

/// Whether a string can be used as an identifier in generated code.
pub fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Render bytes as the body of an array literal.
///
/// Each byte becomes `0xNN` with upper-case hex digits. Bytes are separated
/// by `, ` with a line break every 16 bytes.
pub fn hex_array(data: &[u8]) -> String {
    data.chunks(BYTES_PER_LINE)
        .map(|line| {
            line.iter()
                .map(|b| format!("0x{:02X}", b))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect::<Vec<_>>()
        .join(",\n    ")
}

/// Resolve the name of the byte array and check every declared name.
///
/// Resource constants share a namespace with the byte array, so a resource
/// named like the array is rejected.
fn resolve_symbol<'a>(
    format: OutputFormat,
    symbol: Option<&'a str>,
    resources: &[ResourceSymbol],
) -> Result<&'a str> {
    let symbol = symbol.unwrap_or_else(|| format.default_symbol());

    if !format.is_usable_identifier(symbol) {
        return Err(anyhow!("'{}' is not a valid symbol name", symbol));
    }

    for resource in resources {
        if !format.is_usable_identifier(&resource.name) {
            return Err(anyhow!(
                "resource {} has unusable name {}; set an explicit name",
                resource.id,
                resource.name
            ));
        }

        if resource.name == symbol {
            return Err(anyhow!(
                "resource {} is named {}, which is also the byte array symbol; \
                 set an explicit name or pass a different symbol",
                resource.id,
                symbol
            ));
        }
    }

    Ok(symbol)
}

/// Render the artifacts for one output format.
///
/// Nothing is written to disk.
pub fn render_artifacts(
    format: OutputFormat,
    container: &[u8],
    resources: &[ResourceSymbol],
    symbol: Option<&str>,
) -> Result<Vec<GeneratedFile>> {
    if format == OutputFormat::Bin {
        return Ok(vec![GeneratedFile {
            filename: BIN_FILENAME,
            data: container.to_vec(),
        }]);
    }

    let symbol = resolve_symbol(format, symbol, resources)?;

    let mut data = TemplateData::new(symbol, resources);
    data.length = container.len();
    data.bytes = hex_array(container);

    let templates: &[(&str, &'static str)] = match format {
        OutputFormat::Rust => &[("resources.rs", RUST_FILENAME)],
        OutputFormat::Cpp => &[
            ("resources.h", CPP_HEADER_FILENAME),
            ("resources.cpp", CPP_SOURCE_FILENAME),
        ],
        OutputFormat::Bin => &[],
    };

    templates
        .iter()
        .map(|(template, filename)| -> Result<GeneratedFile> {
            let rendered = HANDLEBARS
                .render(template, &data)
                .with_context(|| format!("rendering {}", filename))?;

            Ok(GeneratedFile {
                filename: *filename,
                data: rendered.into_bytes(),
            })
        })
        .collect()
}

/// Render a Rust module that pulls a container file in with `include_bytes!`.
pub fn render_build_script_module(
    container_path: &Path,
    resources: &[ResourceSymbol],
    symbol: Option<&str>,
) -> Result<String> {
    let symbol = resolve_symbol(OutputFormat::Rust, symbol, resources)?;

    let mut data = TemplateData::new(symbol, resources);
    data.container_path = container_path.display().to_string();

    HANDLEBARS
        .render("build-script-resources.rs", &data)
        .context("rendering build script resources module")
}

/// Write generated files into a directory, creating it if needed.
///
/// Every file is first written to a temporary file in `out_dir`. Only once
/// all of them are complete are they renamed into place, so a failed write
/// leaves no partial output behind. Renames are not atomic as a group.
pub fn write_generated_files(out_dir: &Path, files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory '{}'", out_dir.display()))?;

    let staged = files
        .iter()
        .map(|file| -> Result<(NamedTempFile, PathBuf)> {
            let path = out_dir.join(file.filename);

            let mut temp = NamedTempFile::new_in(out_dir)
                .with_context(|| format!("creating temporary file in '{}'", out_dir.display()))?;
            temp.write_all(&file.data)
                .with_context(|| format!("failed to write to output file '{}'", path.display()))?;

            // Temporary files are created owner-only.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                temp.as_file()
                    .set_permissions(std::fs::Permissions::from_mode(0o644))?;
            }

            Ok((temp, path))
        })
        .collect::<Result<Vec<_>>>()?;

    staged
        .into_iter()
        .map(|(temp, path)| -> Result<PathBuf> {
            temp.persist(&path)
                .map_err(|e| e.error)
                .with_context(|| format!("failed to write to output file '{}'", path.display()))?;

            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<ResourceSymbol> {
        vec![
            ResourceSymbol {
                name: "LOGO".to_string(),
                id: 0,
            },
            ResourceSymbol {
                name: "SHADER".to_string(),
                id: -3,
            },
        ]
    }

    #[test]
    fn test_hex_array() {
        assert_eq!(hex_array(&[0x00, 0xab, 0x0f]), "0x00, 0xAB, 0x0F");

        let data = (0u8..18).collect::<Vec<_>>();
        let rendered = hex_array(&data);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0x00, 0x01"));
        assert!(lines[0].ends_with("0x0F,"));
        assert_eq!(lines[1], "    0x10, 0x11");
    }

    #[test]
    fn test_output_format_from_str() -> Result<()> {
        assert_eq!(OutputFormat::from_str("rust")?, OutputFormat::Rust);
        assert_eq!(OutputFormat::from_str("cpp")?, OutputFormat::Cpp);
        assert_eq!(OutputFormat::from_str("bin")?, OutputFormat::Bin);
        assert!(OutputFormat::from_str("java").is_err());

        for name in OutputFormat::NAMES {
            OutputFormat::from_str(name)?;
        }

        Ok(())
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("RESOURCES"));
        assert!(is_valid_identifier("g_resources"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a-b"));
    }

    #[test]
    fn test_render_rust() -> Result<()> {
        let files = render_artifacts(OutputFormat::Rust, &[1, 2, 255], &symbols(), None)?;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, RUST_FILENAME);

        let source = String::from_utf8(files[0].data.clone())?;
        assert!(source.contains("pub static RESOURCES: [u8; 3] = ["));
        assert!(source.contains("0x01, 0x02, 0xFF"));
        assert!(source.contains("pub const LOGO: i32 = 0;"));
        assert!(source.contains("pub const SHADER: i32 = -3;"));

        Ok(())
    }

    #[test]
    fn test_render_cpp() -> Result<()> {
        let files = render_artifacts(
            OutputFormat::Cpp,
            &[0x10, 0x20],
            &symbols(),
            Some("g_assets"),
        )?;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, CPP_HEADER_FILENAME);
        assert_eq!(files[1].filename, CPP_SOURCE_FILENAME);

        let header = String::from_utf8(files[0].data.clone())?;
        assert!(header.contains("#pragma once"));
        assert!(header.contains("extern const std::uint8_t g_assets[2];"));
        assert!(header.contains("constexpr int SHADER = -3;"));

        let source = String::from_utf8(files[1].data.clone())?;
        assert!(source.contains("#include \"resources.h\""));
        assert!(source.contains("const std::uint8_t g_assets[2] = {"));
        assert!(source.contains("0x10, 0x20"));

        Ok(())
    }

    #[test]
    fn test_render_bin() -> Result<()> {
        let files = render_artifacts(OutputFormat::Bin, b"raw", &[], Some("ignored-name"))?;
        assert_eq!(
            files,
            vec![GeneratedFile {
                filename: BIN_FILENAME,
                data: b"raw".to_vec(),
            }]
        );

        Ok(())
    }

    #[test]
    fn test_render_invalid_symbol() {
        assert!(render_artifacts(OutputFormat::Rust, b"raw", &[], Some("not valid")).is_err());
    }

    #[test]
    fn test_reserved_words() {
        assert!(!OutputFormat::Rust.is_usable_identifier("type"));
        assert!(!OutputFormat::Rust.is_usable_identifier("fn"));
        assert!(!OutputFormat::Rust.is_usable_identifier("_"));
        assert!(OutputFormat::Rust.is_usable_identifier("NULL"));

        assert!(!OutputFormat::Cpp.is_usable_identifier("class"));
        assert!(!OutputFormat::Cpp.is_usable_identifier("NULL"));
        assert!(!OutputFormat::Cpp.is_usable_identifier("EOF"));
        assert!(OutputFormat::Cpp.is_usable_identifier("type"));

        assert!(render_artifacts(OutputFormat::Rust, b"raw", &[], Some("type")).is_err());
        assert!(render_artifacts(OutputFormat::Cpp, b"raw", &[], Some("NULL")).is_err());
    }

    #[test]
    fn test_resource_name_reserved_in_cpp() -> Result<()> {
        let resources = vec![ResourceSymbol {
            name: "EOF".to_string(),
            id: 7,
        }];

        let err = render_artifacts(OutputFormat::Cpp, b"raw", &resources, None).unwrap_err();
        assert!(err.to_string().contains("resource 7 has unusable name EOF"));

        render_artifacts(OutputFormat::Rust, b"raw", &resources, None)?;

        Ok(())
    }

    #[test]
    fn test_resource_named_like_array() -> Result<()> {
        let resources = vec![ResourceSymbol {
            name: "RESOURCES".to_string(),
            id: 0,
        }];

        let err = render_artifacts(OutputFormat::Rust, b"raw", &resources, None).unwrap_err();
        assert!(err.to_string().contains("also the byte array symbol"));
        assert!(render_build_script_module(Path::new("resources.bin"), &resources, None).is_err());

        let files = render_artifacts(OutputFormat::Rust, b"raw", &resources, Some("ASSETS"))?;
        let source = String::from_utf8(files[0].data.clone())?;
        assert!(source.contains("pub static ASSETS: [u8; 3]"));
        assert!(source.contains("pub const RESOURCES: i32 = 0;"));

        render_artifacts(OutputFormat::Cpp, b"raw", &resources, None)?;

        Ok(())
    }

    #[test]
    fn test_render_build_script_module() -> Result<()> {
        let source = render_build_script_module(
            Path::new("/tmp/out/resources.bin"),
            &symbols(),
            None,
        )?;

        assert!(source.contains(
            "pub static RESOURCES: &[u8] = include_bytes!(r#\"/tmp/out/resources.bin\"#);"
        ));
        assert!(source.contains("pub const LOGO: i32 = 0;"));

        Ok(())
    }

    #[test]
    fn test_write_generated_files() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let out_dir = temp_dir.path().join("nested").join("out");

        let paths = write_generated_files(
            &out_dir,
            &[GeneratedFile {
                filename: BIN_FILENAME,
                data: b"abc".to_vec(),
            }],
        )?;

        assert_eq!(paths, vec![out_dir.join(BIN_FILENAME)]);
        assert_eq!(std::fs::read(&paths[0])?, b"abc");

        Ok(())
    }

    #[test]
    fn test_write_generated_files_failure_leaves_nothing() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let out_dir = temp_dir.path();
        // A directory in the way of the first file makes its rename fail.
        std::fs::create_dir(out_dir.join(CPP_HEADER_FILENAME))?;

        let res = write_generated_files(
            out_dir,
            &[
                GeneratedFile {
                    filename: CPP_HEADER_FILENAME,
                    data: b"h".to_vec(),
                },
                GeneratedFile {
                    filename: CPP_SOURCE_FILENAME,
                    data: b"cpp".to_vec(),
                },
            ],
        );
        assert!(res.is_err());

        let names = std::fs::read_dir(out_dir)?
            .map(|entry| Ok(entry?.file_name()))
            .collect::<std::io::Result<Vec<_>>>()?;
        assert_eq!(names, vec![std::ffi::OsString::from(CPP_HEADER_FILENAME)]);
        assert!(out_dir.join(CPP_HEADER_FILENAME).is_dir());

        Ok(())
    }
}
