//! CPython build recipe
//!
//! Automates the decision half of building the CPython interpreter from its
//! official source tarball: a matrix of feature toggles and platform facts is
//! compiled into the external dependency requirements to declare and the
//! arguments and environment for the platform-native build step.
//!
//! # Architecture
//!
//! - **Options**: the feature/build-mode toggle matrix with its defaults
//! - **Platform**: operating system, compiler, architecture, build type
//! - **Config**: the immutable, validated per-build snapshot
//! - **Deps**: the declarative option-to-requirement table and resolved
//!   dependency metadata
//! - **Resolver**: the pure option-to-build-argument compiler
//! - **Source**: upstream tarball URL/checksum derivation and declared patches
//! - **Toolchain**: the command/environment plan handed to the invocation layer
//!
//! Downloading, patching and toolchain execution are external collaborators;
//! this crate only computes what they should do.

pub mod config;
pub mod deps;
pub mod error;
pub mod options;
pub mod platform;
pub mod resolver;
pub mod source;
pub mod toolchain;

pub use config::{BuildConfiguration, RecipeFile};
pub use deps::{DependencyMetadata, DependencySpec, MetadataSet};
pub use error::{Error, Result};
pub use options::{BuildOption, OptionSet, ValidationMode};
pub use platform::{Arch, BuildType, Compiler, Os, Platform};
pub use resolver::{resolve, Resolution};
pub use source::UpstreamSource;
pub use toolchain::{BuildPaths, BuildPlan};

use semver::Version;
use tracing::info;

/// One build recipe: a validated configuration plus the dependency metadata
/// the argument synthesis consumes
#[derive(Debug, Clone)]
pub struct Recipe {
    config: BuildConfiguration,
    metadata: MetadataSet,
}

impl Recipe {
    /// Create a recipe from an already-validated configuration
    pub fn new(config: BuildConfiguration, metadata: MetadataSet) -> Self {
        let metadata = if metadata.is_empty() {
            MetadataSet::system_defaults()
        } else {
            metadata
        };

        Self { config, metadata }
    }

    /// Create a recipe from raw user toggles, normalizing what the original
    /// option layer would strip (fPIC under shared)
    pub fn from_options(
        options: OptionSet,
        platform: Platform,
        version: Version,
        metadata: MetadataSet,
    ) -> Result<Self> {
        let config = BuildConfiguration::from_raw_options(options, platform, version)?;
        Ok(Self::new(config, metadata))
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataSet {
        &self.metadata
    }

    /// Resolve the configuration into requirements and configure arguments
    pub fn resolve(&self) -> Result<Resolution> {
        info!(
            version = %self.config.version(),
            platform = %self.config.platform(),
            "Resolving build configuration"
        );
        resolver::resolve(&self.config, &self.metadata)
    }

    /// The upstream source artifact this recipe builds
    pub fn source(&self) -> UpstreamSource {
        UpstreamSource::new(self.config.version().clone())
    }

    /// Assemble the full plan for the invocation layer
    pub fn plan(&self, paths: &BuildPaths) -> Result<BuildPlan> {
        let resolution = self.resolve()?;
        Ok(BuildPlan::assemble(&self.config, &resolution, paths))
    }
}
