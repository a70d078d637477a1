//! Error types for the build recipe

use thiserror::Error;

/// Result type alias for recipe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Build recipe errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("Unknown build option: {0}")]
    UnknownOption(String),

    #[error("Unknown operating system: {0}")]
    UnknownOs(String),

    #[error("Unknown compiler: {0}")]
    UnknownCompiler(String),

    #[error("Unknown architecture: {0}")]
    UnknownArch(String),

    #[error("Unknown build type: {0}")]
    UnknownBuildType(String),

    #[error("Missing dependency metadata: {0}")]
    MissingMetadata(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Recipe file error: {0}")]
    RecipeFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
