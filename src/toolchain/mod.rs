//! Build plan assembly for the toolchain invocation layer
//!
//! Turns a [`Resolution`] into the concrete command sequence and environment
//! the (external) invocation layer runs: `configure && make && make install`
//! on POSIX-like targets, the vendored `PCBuild/build.bat` on MSVC. The plan
//! is plain data; nothing here spawns a process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::BuildConfiguration;
use crate::options::BuildOption;
use crate::platform::{Arch, Compiler};
use crate::resolver::Resolution;

/// One external command the invocation layer runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
}

impl CommandSpec {
    fn new(program: impl Into<PathBuf>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.into(),
        }
    }
}

/// Filesystem locations and helper tools the plan needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPaths {
    /// Extracted upstream source tree
    pub source_dir: PathBuf,
    /// Out-of-tree build directory
    pub build_dir: PathBuf,
    /// pkg-config executable the configure step should use
    pub pkg_config: PathBuf,
    /// Existing interpreter for source regeneration, if any
    pub python_for_regen: Option<PathBuf>,
}

impl BuildPaths {
    pub fn new(source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            pkg_config: PathBuf::from("pkg-config"),
            python_for_regen: None,
        }
    }
}

/// Full description of what the invocation layer should run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    /// Environment variables to inject for every step
    pub env: BTreeMap<String, String>,
    /// Commands, in execution order
    pub steps: Vec<CommandSpec>,
    /// Where build outputs land
    pub layout: InstallLayout,
}

impl BuildPlan {
    /// Assemble the plan for a configuration and its resolution
    pub fn assemble(
        config: &BuildConfiguration,
        resolution: &Resolution,
        paths: &BuildPaths,
    ) -> Self {
        if config.platform().compiler == Compiler::Msvc {
            Self::msvc(config, paths)
        } else {
            Self::autotools(config, resolution, paths)
        }
    }

    fn autotools(
        config: &BuildConfiguration,
        resolution: &Resolution,
        paths: &BuildPaths,
    ) -> Self {
        let mut env = BTreeMap::new();
        env.insert(
            "PKG_CONFIG".to_string(),
            paths.pkg_config.display().to_string(),
        );
        if let Some(ref regen) = paths.python_for_regen {
            env.insert("PYTHON_FOR_REGEN".to_string(), regen.display().to_string());
        }

        let mut cppflags = Vec::new();
        // A 32-bit target on gcc or clang needs -m32 so configure derives
        // the right PLATFORM_TRIPLET for extension modules. Apple's clang
        // selects the target architecture differently and never gets it.
        let wants_m32 = matches!(
            config.platform().compiler,
            Compiler::Gcc | Compiler::Clang
        );
        if wants_m32 && config.platform().arch == Arch::X86 {
            cppflags.push("-m32".to_string());
        }
        for path in &resolution.extra_include_paths {
            cppflags.push(format!("-I{}", path.display()));
        }
        if !cppflags.is_empty() {
            env.insert("CPPFLAGS".to_string(), cppflags.join(" "));
        }

        let configure = paths.source_dir.join("configure");
        let steps = vec![
            CommandSpec::new(configure, resolution.configure_args.clone(), &paths.build_dir),
            CommandSpec::new("make", vec![], &paths.build_dir),
            // Parallel install races on directory creation in the upstream
            // Makefile, so install is single-job
            CommandSpec::new(
                "make",
                vec!["install".to_string(), "-j1".to_string()],
                &paths.build_dir,
            ),
        ];

        Self {
            env,
            steps,
            layout: InstallLayout::posix(&config.major_minor(), config.is_enabled(BuildOption::Shared)),
        }
    }

    fn msvc(config: &BuildConfiguration, paths: &BuildPaths) -> Self {
        let pcbuild = paths.source_dir.join("PCBuild");
        let arch = match config.platform().arch {
            Arch::X86_64 => "x64",
            _ => "Win32",
        };

        let steps = vec![CommandSpec::new(
            "build.bat",
            vec![
                "-c".to_string(),
                config.platform().build_type.to_string(),
                "-p".to_string(),
                arch.to_string(),
            ],
            &pcbuild,
        )];

        Self {
            env: BTreeMap::new(),
            steps,
            layout: InstallLayout::pcbuild(&pcbuild, config.platform().arch),
        }
    }
}

/// Where build outputs land relative to the install prefix (POSIX) or the
/// source tree (PCBuild)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLayout {
    /// Directory containing the interpreter binary
    pub bin_dir: PathBuf,
    /// Standard library directory
    pub lib_dir: PathBuf,
    /// Header directory
    pub include_dir: PathBuf,
    /// Shared/import library directory, when the build produces one
    pub shared_lib_dir: Option<PathBuf>,
}

impl InstallLayout {
    /// Conventional `make install` layout for version family X.Y
    pub fn posix(major_minor: &str, shared: bool) -> Self {
        Self {
            bin_dir: PathBuf::from("bin"),
            lib_dir: PathBuf::from(format!("lib/python{}", major_minor)),
            include_dir: PathBuf::from(format!("include/python{}", major_minor)),
            shared_lib_dir: shared.then(|| PathBuf::from("lib")),
        }
    }

    /// In-tree PCBuild layout: binaries land next to the vendored solution
    pub fn pcbuild(pcbuild_dir: &Path, arch: Arch) -> Self {
        let out = match arch {
            Arch::X86_64 => pcbuild_dir.join("amd64"),
            _ => pcbuild_dir.join("win32"),
        };

        Self {
            bin_dir: out.clone(),
            lib_dir: pcbuild_dir.parent().unwrap_or(pcbuild_dir).join("Lib"),
            include_dir: pcbuild_dir.parent().unwrap_or(pcbuild_dir).join("Include"),
            shared_lib_dir: Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::MetadataSet;
    use crate::options::OptionSet;
    use crate::platform::{BuildType, Os, Platform};
    use crate::resolver::resolve;
    use semver::Version;

    fn plan_for(platform: Platform, options: OptionSet) -> BuildPlan {
        let config =
            BuildConfiguration::new(options, platform, Version::new(3, 7, 1)).unwrap();
        let resolution = resolve(&config, &MetadataSet::system_defaults()).unwrap();
        let paths = BuildPaths::new("/work/sources", "/work/build");
        BuildPlan::assemble(&config, &resolution, &paths)
    }

    #[test]
    fn test_autotools_step_order() {
        let platform = Platform::new(Os::Linux, Compiler::Gcc, Arch::X86_64, BuildType::Release);
        let plan = plan_for(platform, OptionSet::default());

        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[0].program, PathBuf::from("/work/sources/configure"));
        assert_eq!(plan.steps[1].args, Vec::<String>::new());
        assert_eq!(plan.steps[2].args, vec!["install", "-j1"]);
    }

    #[test]
    fn test_x86_gets_m32() {
        let platform = Platform::new(Os::Linux, Compiler::Gcc, Arch::X86, BuildType::Release);
        let mut options = OptionSet::default();
        options.disable(BuildOption::Uuid);
        let plan = plan_for(platform, options);

        assert_eq!(plan.env.get("CPPFLAGS").map(String::as_str), Some("-m32"));
    }

    #[test]
    fn test_apple_clang_x86_gets_no_m32() {
        let platform = Platform::new(Os::Macos, Compiler::AppleClang, Arch::X86, BuildType::Release);
        let mut options = OptionSet::default();
        options.disable(BuildOption::Nis);
        options.disable(BuildOption::Uuid);
        let plan = plan_for(platform, options);

        assert_eq!(plan.env.get("CPPFLAGS"), None);
    }

    #[test]
    fn test_uuid_include_lands_in_cppflags() {
        let platform = Platform::new(Os::Linux, Compiler::Gcc, Arch::X86_64, BuildType::Release);
        let plan = plan_for(platform, OptionSet::default());

        assert_eq!(
            plan.env.get("CPPFLAGS").map(String::as_str),
            Some("-I/usr/include/uuid")
        );
    }

    #[test]
    fn test_msvc_plan() {
        let platform = Platform::new(Os::Windows, Compiler::Msvc, Arch::X86_64, BuildType::Debug);
        let mut options = OptionSet::default();
        options.disable(BuildOption::Nis);
        let plan = plan_for(platform, options);

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].program, PathBuf::from("build.bat"));
        assert_eq!(plan.steps[0].args, vec!["-c", "Debug", "-p", "x64"]);
        assert_eq!(plan.steps[0].cwd, PathBuf::from("/work/sources/PCBuild"));
    }

    #[test]
    fn test_posix_layout() {
        let layout = InstallLayout::posix("3.7", false);
        assert_eq!(layout.lib_dir, PathBuf::from("lib/python3.7"));
        assert_eq!(layout.include_dir, PathBuf::from("include/python3.7"));
        assert_eq!(layout.shared_lib_dir, None);
    }

    #[test]
    fn test_pcbuild_layout_arch_dirs() {
        let layout = InstallLayout::pcbuild(Path::new("/src/PCBuild"), Arch::X86_64);
        assert_eq!(layout.bin_dir, PathBuf::from("/src/PCBuild/amd64"));

        let layout = InstallLayout::pcbuild(Path::new("/src/PCBuild"), Arch::X86);
        assert_eq!(layout.bin_dir, PathBuf::from("/src/PCBuild/win32"));
    }
}
