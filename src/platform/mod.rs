//! Target platform facts
//!
//! Captures the operating system, compiler, architecture and build type a
//! recipe is resolved for. Host detection covers the platforms the recipe can
//! realistically build on; everything else is supplied explicitly.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    Linux,
    Macos,
    Windows,
    FreeBsd,
}

impl Os {
    pub fn name(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
            Os::FreeBsd => "freebsd",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" => Ok(Os::Macos),
            "windows" => Ok(Os::Windows),
            "freebsd" => Ok(Os::FreeBsd),
            _ => Err(Error::UnknownOs(s.to_string())),
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiler family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
}

impl Compiler {
    pub fn name(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::AppleClang => "apple-clang",
            Compiler::Msvc => "msvc",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "apple-clang" | "appleclang" => Ok(Compiler::AppleClang),
            "msvc" | "visual studio" => Ok(Compiler::Msvc),
            _ => Err(Error::UnknownCompiler(s.to_string())),
        }
    }
}

impl std::fmt::Display for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    X86,
    X86_64,
    Aarch64,
    Armv7,
}

impl Arch {
    pub fn name(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Armv7 => "armv7",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "x86" | "i686" | "i386" => Ok(Arch::X86),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "armv7" | "arm" => Ok(Arch::Armv7),
            _ => Err(Error::UnknownArch(s.to_string())),
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    pub fn name(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            _ => Err(Error::UnknownBuildType(s.to_string())),
        }
    }
}

impl std::fmt::Display for BuildType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Target platform facts for one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Target operating system
    pub os: Os,
    /// Compiler family
    pub compiler: Compiler,
    /// Compiler version family (e.g. "9" for gcc 9.x), if known
    pub compiler_version: Option<String>,
    /// Target architecture
    pub arch: Arch,
    /// Build type
    pub build_type: BuildType,
}

impl Platform {
    pub fn new(os: Os, compiler: Compiler, arch: Arch, build_type: BuildType) -> Self {
        Self {
            os,
            compiler,
            compiler_version: None,
            arch,
            build_type,
        }
    }

    /// Detect the host platform from compile-time facts
    pub fn host() -> Self {
        let os = if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Macos
        } else if cfg!(target_os = "freebsd") {
            Os::FreeBsd
        } else {
            Os::Linux
        };

        let compiler = match os {
            Os::Windows => Compiler::Msvc,
            Os::Macos => Compiler::AppleClang,
            _ => Compiler::Gcc,
        };

        let arch = if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else if cfg!(target_arch = "arm") {
            Arch::Armv7
        } else {
            Arch::X86_64
        };

        Self::new(os, compiler, arch, BuildType::Release)
    }

    /// Whether this is a MinGW target (gcc on Windows)
    pub fn is_mingw(&self) -> bool {
        self.os == Os::Windows && self.compiler == Compiler::Gcc
    }

    /// Whether NIS/YP support can be built for this target
    pub fn supports_nis(&self) -> bool {
        !matches!(self.os, Os::Windows | Os::Macos)
    }

    /// Whether this build is a debug build
    pub fn is_debug(&self) -> bool {
        self.build_type == BuildType::Debug
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{} ({})",
            self.os, self.arch, self.compiler, self.build_type
        )
    }
}
