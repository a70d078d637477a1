//! Build option toggles for the interpreter recipe
//!
//! Each toggle either switches an optional stdlib extension (and with it an
//! external library requirement) or controls the build mode itself. The set
//! of toggles mirrors the upstream configure script's optional surface.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// All available build option toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildOption {
    // Build mode toggles
    /// Build the interpreter as a shared library
    Shared,
    /// Compile position-independent code (static builds only)
    Fpic,
    /// Enable profile-guided optimizations
    Optimizations,
    /// Enable link-time optimization
    Lto,

    // Optional extension modules
    /// bz2 compression module
    Bz2,
    /// ctypes foreign function interface
    Ctypes,
    /// dbm database module
    Dbm,
    /// decimal module backed by a system libmpdec
    Decimal,
    /// XML parsing via a system expat
    Expat,
    /// gdbm database module
    Gdbm,
    /// lzma compression module
    Lzma,
    /// NIS/YP support (POSIX-only)
    Nis,
    /// sqlite3 database module
    Sqlite3,
    /// tkinter GUI toolkit bindings
    Tcltk,
    /// uuid module backed by libuuid
    Uuid,
    /// IPv6 socket support
    Ipv6,
}

impl BuildOption {
    /// Get all available options, in declaration order
    pub fn all() -> Vec<BuildOption> {
        vec![
            BuildOption::Shared,
            BuildOption::Fpic,
            BuildOption::Optimizations,
            BuildOption::Lto,
            BuildOption::Bz2,
            BuildOption::Ctypes,
            BuildOption::Dbm,
            BuildOption::Decimal,
            BuildOption::Expat,
            BuildOption::Gdbm,
            BuildOption::Lzma,
            BuildOption::Nis,
            BuildOption::Sqlite3,
            BuildOption::Tcltk,
            BuildOption::Uuid,
            BuildOption::Ipv6,
        ]
    }

    /// Get the string name of the option
    pub fn name(&self) -> &'static str {
        match self {
            BuildOption::Shared => "shared",
            BuildOption::Fpic => "fPIC",
            BuildOption::Optimizations => "optimizations",
            BuildOption::Lto => "lto",
            BuildOption::Bz2 => "bz2",
            BuildOption::Ctypes => "ctypes",
            BuildOption::Dbm => "dbm",
            BuildOption::Decimal => "decimal",
            BuildOption::Expat => "expat",
            BuildOption::Gdbm => "gdbm",
            BuildOption::Lzma => "lzma",
            BuildOption::Nis => "nis",
            BuildOption::Sqlite3 => "sqlite3",
            BuildOption::Tcltk => "tcltk",
            BuildOption::Uuid => "uuid",
            BuildOption::Ipv6 => "ipv6",
        }
    }

    /// Get description of the option
    pub fn description(&self) -> &'static str {
        match self {
            BuildOption::Shared => "Build the interpreter as a shared library",
            BuildOption::Fpic => "Compile position-independent code (static builds only)",
            BuildOption::Optimizations => "Enable profile-guided optimizations",
            BuildOption::Lto => "Enable link-time optimization",
            BuildOption::Bz2 => "Build the bz2 compression module (requires bzip2)",
            BuildOption::Ctypes => "Build the ctypes FFI module (requires libffi)",
            BuildOption::Dbm => "Build the dbm module (requires libdb)",
            BuildOption::Decimal => "Use a system libmpdec for the decimal module",
            BuildOption::Expat => "Use a system expat for XML parsing",
            BuildOption::Gdbm => "Build the gdbm module (requires gdbm)",
            BuildOption::Lzma => "Build the lzma module (requires xz)",
            BuildOption::Nis => "Build NIS/YP support (requires libnsl, POSIX only)",
            BuildOption::Sqlite3 => "Build the sqlite3 module (requires sqlite3)",
            BuildOption::Tcltk => "Build tkinter (requires tcl and tk)",
            BuildOption::Uuid => "Build the uuid module (requires libuuid)",
            BuildOption::Ipv6 => "Enable IPv6 socket support",
        }
    }

    /// Parse an option name string to BuildOption
    pub fn parse(s: &str) -> Option<BuildOption> {
        match s.to_lowercase().as_str() {
            "shared" => Some(BuildOption::Shared),
            "fpic" => Some(BuildOption::Fpic),
            "optimizations" => Some(BuildOption::Optimizations),
            "lto" => Some(BuildOption::Lto),
            "bz2" => Some(BuildOption::Bz2),
            "ctypes" => Some(BuildOption::Ctypes),
            "dbm" => Some(BuildOption::Dbm),
            "decimal" => Some(BuildOption::Decimal),
            "expat" => Some(BuildOption::Expat),
            "gdbm" => Some(BuildOption::Gdbm),
            "lzma" => Some(BuildOption::Lzma),
            "nis" => Some(BuildOption::Nis),
            "sqlite3" => Some(BuildOption::Sqlite3),
            "tcltk" => Some(BuildOption::Tcltk),
            "uuid" => Some(BuildOption::Uuid),
            "ipv6" => Some(BuildOption::Ipv6),
            _ => None,
        }
    }

    /// Whether this option is enabled in the default configuration
    pub fn default_enabled(&self) -> bool {
        !matches!(
            self,
            BuildOption::Shared | BuildOption::Optimizations | BuildOption::Lto
        )
    }
}

impl std::fmt::Display for BuildOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How to treat option tokens that are not recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValidationMode {
    /// Unknown options are an error
    #[default]
    Strict,
    /// Unknown options are logged and skipped
    Lenient,
}

/// A set of enabled/disabled build options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    /// Enabled options
    enabled: HashSet<BuildOption>,
    /// Explicitly disabled options (prefixed with -)
    disabled: HashSet<BuildOption>,
}

impl Default for OptionSet {
    fn default() -> Self {
        let enabled = BuildOption::all()
            .into_iter()
            .filter(|o| o.default_enabled())
            .collect();

        Self {
            enabled,
            disabled: HashSet::new(),
        }
    }
}

impl OptionSet {
    /// Create a new empty option set
    pub fn new() -> Self {
        Self {
            enabled: HashSet::new(),
            disabled: HashSet::new(),
        }
    }

    /// Parse an options string like "shared lto -nis -tcltk" on top of the
    /// defaults. A leading `-` disables the option.
    pub fn parse_options_string(s: &str, mode: ValidationMode) -> Result<Self> {
        let mut set = Self::default();
        set.apply_options_string(s, mode)?;
        Ok(set)
    }

    /// Apply an options string on top of the current set
    pub fn apply_options_string(&mut self, s: &str, mode: ValidationMode) -> Result<()> {
        for token in s.split_whitespace() {
            if let Some(stripped) = token.strip_prefix('-') {
                match BuildOption::parse(stripped) {
                    Some(option) => self.disable(option),
                    None => self.unknown(stripped, mode)?,
                }
            } else {
                match BuildOption::parse(token) {
                    Some(option) => self.enable(option),
                    None => self.unknown(token, mode)?,
                }
            }
        }
        Ok(())
    }

    fn unknown(&self, token: &str, mode: ValidationMode) -> Result<()> {
        match mode {
            ValidationMode::Strict => Err(Error::UnknownOption(token.to_string())),
            ValidationMode::Lenient => {
                tracing::warn!("Unknown build option: {}", token);
                Ok(())
            }
        }
    }

    /// Check if an option is enabled
    pub fn is_enabled(&self, option: BuildOption) -> bool {
        self.enabled.contains(&option) && !self.disabled.contains(&option)
    }

    /// Enable an option
    pub fn enable(&mut self, option: BuildOption) {
        self.disabled.remove(&option);
        self.enabled.insert(option);
    }

    /// Disable an option
    pub fn disable(&mut self, option: BuildOption) {
        self.enabled.remove(&option);
        self.disabled.insert(option);
    }

    /// Get all enabled options, in declaration order
    pub fn get_enabled(&self) -> Vec<BuildOption> {
        BuildOption::all()
            .into_iter()
            .filter(|o| self.is_enabled(*o))
            .collect()
    }

    /// Convert to an options string
    pub fn to_options_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        for option in BuildOption::all() {
            if self.enabled.contains(&option) {
                parts.push(option.name().to_string());
            } else if self.disabled.contains(&option) {
                parts.push(format!("-{}", option.name()));
            }
        }

        parts.join(" ")
    }
}
