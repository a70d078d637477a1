//! External dependency requirements and resolved metadata
//!
//! The option-to-requirement mapping is declarative data consulted by the
//! resolver, so the table can be audited and tested in isolation. Metadata
//! for already-resolved dependencies (install prefix, include dirs, link
//! libs) is what the tcltk/uuid/openssl argument synthesis consumes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::options::BuildOption;

/// A declared external dependency requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Requirement name (e.g. "bzip2")
    pub name: String,
    /// Full requirement reference including version and channel
    pub reference: String,
}

impl DependencySpec {
    pub fn new(name: &str, reference: &str) -> Self {
        Self {
            name: name.to_string(),
            reference: reference.to_string(),
        }
    }
}

impl std::fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// The unconditional secure-sockets requirement
pub const OPENSSL_REQUIREMENT: (&str, &str) = ("openssl", "OpenSSL/1.1.1@conan/stable");

/// Option-to-requirement table, in feature-declaration order.
///
/// Emission order follows this table, never alphabetical order, because
/// downstream consumers resolve requirement conflicts first-declared-wins.
/// `tcltk` is the only option pulling in two requirements.
pub const OPTION_REQUIREMENTS: &[(BuildOption, &[(&str, &str)])] = &[
    (BuildOption::Bz2, &[("bzip2", "bzip2/1.0.6@conan/stable")]),
    (BuildOption::Ctypes, &[("libffi", "libffi/3.3-rc0@maarten/testing")]),
    (BuildOption::Dbm, &[("libdb", "libdb/5.3.28@maarten/testing")]),
    (BuildOption::Decimal, &[("mpdecimal", "mpdecimal/2.4.2@maarten/testing")]),
    (BuildOption::Expat, &[("expat", "expat/2.2.5@bincrafters/stable")]),
    (BuildOption::Gdbm, &[("gdbm", "gdbm/1.18.1@maarten/testing")]),
    (BuildOption::Lzma, &[("lzma", "lzma/5.2.3@bincrafters/stable")]),
    (BuildOption::Nis, &[("libnsl", "libnsl/1.2.0@maarten/testing")]),
    (BuildOption::Sqlite3, &[("sqlite3", "sqlite3/3.25.3@bincrafters/stable")]),
    (
        BuildOption::Tcltk,
        &[
            ("tcl", "tcl/8.6.8@bincrafters/stable"),
            ("tk", "tk/8.6.8@maarten/testing"),
        ],
    ),
    (BuildOption::Uuid, &[("libuuid", "libuuid/1.0.3@bincrafters/stable")]),
];

/// Resolved facts about one dependency, as reported by whatever fetched it
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyMetadata {
    /// Install prefix of the dependency
    pub rootpath: PathBuf,
    /// Header search directories
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Link library names (without `lib` prefix or extension)
    #[serde(default)]
    pub libs: Vec<String>,
}

impl DependencyMetadata {
    pub fn new(rootpath: impl Into<PathBuf>) -> Self {
        Self {
            rootpath: rootpath.into(),
            include_dirs: Vec::new(),
            libs: Vec::new(),
        }
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn with_lib(mut self, lib: &str) -> Self {
        self.libs.push(lib.to_string());
        self
    }
}

/// Insertion-ordered registry of dependency metadata.
///
/// First-declared-wins: a second declaration for the same name is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSet {
    entries: IndexMap<String, DependencyMetadata>,
}

impl MetadataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare metadata for a dependency. Returns false if the name was
    /// already declared (the earlier declaration wins).
    pub fn declare(&mut self, name: &str, metadata: DependencyMetadata) -> bool {
        if self.entries.contains_key(name) {
            tracing::debug!("Ignoring re-declaration of dependency metadata: {}", name);
            return false;
        }
        self.entries.insert(name.to_string(), metadata);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DependencyMetadata> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Conventional metadata for dependencies installed under /usr, used
    /// when no resolved metadata is supplied.
    pub fn system_defaults() -> Self {
        let mut set = Self::new();
        set.declare(
            "openssl",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include")
                .with_lib("ssl")
                .with_lib("crypto"),
        );
        set.declare(
            "tcl",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include/tcl8.6")
                .with_lib("tcl8.6"),
        );
        set.declare(
            "tk",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include/tk8.6")
                .with_lib("tk8.6"),
        );
        set.declare(
            "zlib",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include")
                .with_lib("z"),
        );
        set.declare(
            "libuuid",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include")
                .with_lib("uuid"),
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_one_to_one() {
        // Every option other than tcltk maps to exactly one requirement
        for (option, reqs) in OPTION_REQUIREMENTS {
            if *option == BuildOption::Tcltk {
                assert_eq!(reqs.len(), 2);
            } else {
                assert_eq!(reqs.len(), 1, "{} must map to one requirement", option);
            }
        }
    }

    #[test]
    fn test_table_covers_library_options() {
        let mapped: Vec<BuildOption> = OPTION_REQUIREMENTS.iter().map(|(o, _)| *o).collect();

        for option in BuildOption::all() {
            let is_mode_toggle = matches!(
                option,
                BuildOption::Shared
                    | BuildOption::Fpic
                    | BuildOption::Optimizations
                    | BuildOption::Lto
                    | BuildOption::Ipv6
            );
            assert_eq!(
                mapped.contains(&option),
                !is_mode_toggle,
                "table coverage mismatch for {}",
                option
            );
        }
    }

    #[test]
    fn test_metadata_deserializes_with_rootpath_only() {
        let metadata: DependencyMetadata = toml::from_str(r#"rootpath = "/opt/openssl""#).unwrap();

        assert_eq!(metadata.rootpath, PathBuf::from("/opt/openssl"));
        assert!(metadata.include_dirs.is_empty());
        assert!(metadata.libs.is_empty());
    }

    #[test]
    fn test_first_declared_wins() {
        let mut set = MetadataSet::new();
        assert!(set.declare("tcl", DependencyMetadata::new("/opt/tcl")));
        assert!(!set.declare("tcl", DependencyMetadata::new("/usr")));

        assert_eq!(set.get("tcl").unwrap().rootpath, PathBuf::from("/opt/tcl"));
    }

    #[test]
    fn test_metadata_order_is_declaration_order() {
        let mut set = MetadataSet::new();
        set.declare("zlib", DependencyMetadata::new("/usr"));
        set.declare("tcl", DependencyMetadata::new("/usr"));
        set.declare("tk", DependencyMetadata::new("/usr"));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["zlib", "tcl", "tk"]);
    }
}
