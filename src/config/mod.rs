//! Validated build configuration
//!
//! A [`BuildConfiguration`] is the immutable snapshot of option toggles,
//! platform facts and upstream version that drives one build. Invalid
//! combinations are rejected at construction and the value never mutates
//! afterwards.

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::deps::{DependencyMetadata, MetadataSet};
use crate::options::{BuildOption, OptionSet, ValidationMode};
use crate::platform::Platform;
use crate::{Error, Result};

/// The resolved, validated snapshot of toggles and platform facts for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfiguration {
    options: OptionSet,
    platform: Platform,
    version: Version,
}

impl BuildConfiguration {
    /// Create a validated configuration. Fails fast on invalid combinations:
    ///
    /// - `fPIC` must not be set together with `shared`
    /// - `nis` must not be set on Windows or macOS targets
    pub fn new(options: OptionSet, platform: Platform, version: Version) -> Result<Self> {
        if options.is_enabled(BuildOption::Shared) && options.is_enabled(BuildOption::Fpic) {
            return Err(Error::Validation(
                "fPIC has no meaning for a shared build; disable fPIC or shared".to_string(),
            ));
        }

        if options.is_enabled(BuildOption::Nis) && !platform.supports_nis() {
            return Err(Error::Validation(format!(
                "nis is not supported on {}",
                platform.os
            )));
        }

        Ok(Self {
            options,
            platform,
            version,
        })
    }

    /// Create a configuration from raw user toggles, normalizing the
    /// combinations a caller cannot reasonably pre-strip: `fPIC` is dropped
    /// when `shared` is requested, and `nis` is dropped on platforms that
    /// cannot build it. Hand-built configurations go through [`Self::new`],
    /// which rejects both outright.
    pub fn from_raw_options(
        mut options: OptionSet,
        platform: Platform,
        version: Version,
    ) -> Result<Self> {
        if options.is_enabled(BuildOption::Shared) && options.is_enabled(BuildOption::Fpic) {
            tracing::debug!("Dropping fPIC: meaningless for a shared build");
            options.disable(BuildOption::Fpic);
        }

        if options.is_enabled(BuildOption::Nis) && !platform.supports_nis() {
            tracing::debug!("Dropping nis: not supported on {}", platform.os);
            options.disable(BuildOption::Nis);
        }

        Self::new(options, platform, version)
    }

    /// Check if an option is enabled
    pub fn is_enabled(&self, option: BuildOption) -> bool {
        self.options.is_enabled(option)
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether this is a debug build
    pub fn is_debug(&self) -> bool {
        self.platform.is_debug()
    }

    /// The X.Y version family, used for install layout
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.version.major, self.version.minor)
    }
}

/// On-disk recipe file, TOML
///
/// ```toml
/// version = "3.7.1"
/// options = "shared -nis"
///
/// [platform]
/// os = "linux"
/// compiler = "gcc"
/// arch = "x86_64"
/// build_type = "Release"
///
/// [metadata.tcl]
/// rootpath = "/usr"
/// include_dirs = ["/usr/include/tcl8.6"]
/// libs = ["tcl8.6"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFile {
    /// Upstream version to build
    pub version: Option<String>,
    /// Options string applied on top of the defaults
    pub options: Option<String>,
    /// Platform overrides (host facts are used where absent)
    #[serde(default)]
    pub platform: PlatformOverrides,
    /// Resolved dependency metadata, keyed by requirement name, in file
    /// declaration order
    #[serde(default)]
    pub metadata: IndexMap<String, DependencyMetadata>,
}

/// Partial platform facts from a recipe file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformOverrides {
    pub os: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub arch: Option<String>,
    pub build_type: Option<String>,
}

impl RecipeFile {
    /// Load a recipe file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::RecipeFile(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply the platform overrides on top of a base platform
    pub fn platform(&self, base: Platform) -> Result<Platform> {
        let mut platform = base;

        if let Some(ref os) = self.platform.os {
            platform.os = crate::platform::Os::parse(os)?;
        }
        if let Some(ref compiler) = self.platform.compiler {
            platform.compiler = crate::platform::Compiler::parse(compiler)?;
        }
        if let Some(ref version) = self.platform.compiler_version {
            platform.compiler_version = Some(version.clone());
        }
        if let Some(ref arch) = self.platform.arch {
            platform.arch = crate::platform::Arch::parse(arch)?;
        }
        if let Some(ref build_type) = self.platform.build_type {
            platform.build_type = crate::platform::BuildType::parse(build_type)?;
        }

        Ok(platform)
    }

    /// Build the option set from the defaults plus the recipe's options string
    pub fn option_set(&self, mode: ValidationMode) -> Result<OptionSet> {
        match self.options {
            Some(ref s) => OptionSet::parse_options_string(s, mode),
            None => Ok(OptionSet::default()),
        }
    }

    /// Build the metadata set, in file declaration order
    pub fn metadata_set(&self) -> MetadataSet {
        let mut set = MetadataSet::new();
        for (name, metadata) in &self.metadata {
            set.declare(name, metadata.clone());
        }
        set
    }
}
