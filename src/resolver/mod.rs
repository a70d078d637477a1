//! The option resolver
//!
//! Maps a validated [`BuildConfiguration`] to the external dependency
//! requirements to declare and the arguments to pass to the upstream
//! configure step. Pure computation over in-memory values: no I/O, and the
//! same input always yields the same output, order included.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::BuildConfiguration;
use crate::deps::{DependencySpec, MetadataSet, OPENSSL_REQUIREMENT, OPTION_REQUIREMENTS};
use crate::options::BuildOption;
use crate::{Error, Result};

/// Output of option resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Dependency requirements, in declaration order
    pub requirements: Vec<DependencySpec>,
    /// Arguments for the configure step, in the order configure expects them
    pub configure_args: Vec<String>,
    /// Extra header search paths to inject into the compile environment
    pub extra_include_paths: Vec<PathBuf>,
}

/// Resolve a configuration into requirements and configure arguments.
///
/// Preconditions (violations fail with a validation error rather than being
/// silently repaired): `fPIC` must already be stripped when `shared` is set,
/// and `nis` must be absent on platforms that cannot build it.
pub fn resolve(config: &BuildConfiguration, metadata: &MetadataSet) -> Result<Resolution> {
    check_preconditions(config)?;

    let requirements = derive_requirements(config);
    let configure_args = derive_configure_args(config, metadata)?;
    let extra_include_paths = derive_include_paths(config, metadata)?;

    tracing::debug!(
        requirements = requirements.len(),
        args = configure_args.len(),
        "Resolved build configuration"
    );

    Ok(Resolution {
        requirements,
        configure_args,
        extra_include_paths,
    })
}

fn check_preconditions(config: &BuildConfiguration) -> Result<()> {
    if config.is_enabled(BuildOption::Shared) && config.is_enabled(BuildOption::Fpic) {
        return Err(Error::Validation(
            "fPIC must be stripped before resolving a shared build".to_string(),
        ));
    }

    if config.is_enabled(BuildOption::Nis) && !config.platform().supports_nis() {
        return Err(Error::Validation(format!(
            "nis cannot be resolved for {}",
            config.platform().os
        )));
    }

    Ok(())
}

/// Emit one requirement per enabled library option, OpenSSL first.
///
/// OpenSSL is unconditional: the interpreter's secure-sockets support is not
/// optional. The rest follows the declarative table order.
fn derive_requirements(config: &BuildConfiguration) -> Vec<DependencySpec> {
    let mut requirements = vec![DependencySpec::new(
        OPENSSL_REQUIREMENT.0,
        OPENSSL_REQUIREMENT.1,
    )];

    for (option, specs) in OPTION_REQUIREMENTS {
        if config.is_enabled(*option) {
            for (name, reference) in *specs {
                requirements.push(DependencySpec::new(name, reference));
            }
        }
    }

    requirements
}

fn derive_configure_args(
    config: &BuildConfiguration,
    metadata: &MetadataSet,
) -> Result<Vec<String>> {
    let mut args = Vec::new();

    let toggle = |enabled: bool, on: &str, off: &str| -> String {
        if enabled { on.to_string() } else { off.to_string() }
    };

    args.push(toggle(
        config.is_enabled(BuildOption::Shared),
        "--enable-shared",
        "--disable-shared",
    ));
    args.push("--with-gcc".to_string());
    args.push("--without-icc".to_string());
    args.push(toggle(
        config.is_enabled(BuildOption::Expat),
        "--with-system-expat",
        "--without-system-expat",
    ));
    args.push(toggle(
        config.is_enabled(BuildOption::Decimal),
        "--with-system-libmpdec",
        "--without-system-libmpdec",
    ));
    args.push(toggle(
        config.is_enabled(BuildOption::Optimizations),
        "--enable-optimizations",
        "--disable-optimizations",
    ));
    args.push(toggle(
        config.is_enabled(BuildOption::Lto),
        "--with-lto",
        "--without-lto",
    ));

    let openssl = metadata
        .get("openssl")
        .ok_or_else(|| Error::MissingMetadata("openssl".to_string()))?;
    args.push(format!("--with-openssl={}", openssl.rootpath.display()));

    // The debug pair always travels together, never split
    if config.is_debug() {
        args.push("--with-pydebug".to_string());
        args.push("--with-assertions".to_string());
    } else {
        args.push("--without-pydebug".to_string());
        args.push("--without-assertions".to_string());
    }

    if config.is_enabled(BuildOption::Tcltk) {
        let (includes, libs) = aggregate_tcltk(metadata)?;
        args.push(format!("--with-tcltk-includes={}", includes));
        args.push(format!("--with-tcltk-libs={}", libs));
    }

    args.push(toggle(
        config.is_enabled(BuildOption::Ipv6),
        "--enable-ipv6",
        "--disable-ipv6",
    ));

    Ok(args)
}

/// Aggregate the tcl/tk/zlib header and library facts into the two derived
/// configure flags: one `-I` token per declared include dir, one `-l` token
/// per declared link lib, space-joined in dependency order.
fn aggregate_tcltk(metadata: &MetadataSet) -> Result<(String, String)> {
    let mut includes = Vec::new();
    let mut libs = Vec::new();

    for dep in ["tcl", "tk", "zlib"] {
        let info = metadata
            .get(dep)
            .ok_or_else(|| Error::MissingMetadata(dep.to_string()))?;
        includes.extend(info.include_dirs.iter().map(|d| format!("-I{}", d.display())));
        libs.extend(info.libs.iter().map(|l| format!("-l{}", l)));
    }

    Ok((includes.join(" "), libs.join(" ")))
}

/// libuuid installs its header under an extra `uuid/` subdirectory, so each
/// of its include dirs gets that suffix appended to the search path.
fn derive_include_paths(
    config: &BuildConfiguration,
    metadata: &MetadataSet,
) -> Result<Vec<PathBuf>> {
    if !config.is_enabled(BuildOption::Uuid) {
        return Ok(Vec::new());
    }

    let libuuid = metadata
        .get("libuuid")
        .ok_or_else(|| Error::MissingMetadata("libuuid".to_string()))?;

    Ok(libuuid
        .include_dirs
        .iter()
        .map(|d| d.join("uuid"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::DependencyMetadata;
    use crate::options::OptionSet;
    use crate::platform::{Arch, BuildType, Compiler, Os, Platform};
    use assert_matches::assert_matches;
    use semver::Version;

    fn linux(build_type: BuildType) -> Platform {
        Platform::new(Os::Linux, Compiler::Gcc, Arch::X86_64, build_type)
    }

    fn config_with(options: OptionSet, build_type: BuildType) -> BuildConfiguration {
        BuildConfiguration::new(options, linux(build_type), Version::new(3, 7, 1)).unwrap()
    }

    fn metadata() -> MetadataSet {
        MetadataSet::system_defaults()
    }

    #[test]
    fn test_openssl_is_unconditional_and_first() {
        let mut options = OptionSet::new();
        options.disable(BuildOption::Bz2);

        let resolution = resolve(&config_with(options, BuildType::Release), &metadata()).unwrap();
        assert_eq!(resolution.requirements[0].name, "openssl");
    }

    #[test]
    fn test_requirement_order_follows_declaration_order() {
        let resolution =
            resolve(&config_with(OptionSet::default(), BuildType::Release), &metadata()).unwrap();

        let names: Vec<&str> = resolution
            .requirements
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "openssl", "bzip2", "libffi", "libdb", "mpdecimal", "expat", "gdbm", "lzma",
                "libnsl", "sqlite3", "tcl", "tk", "libuuid",
            ]
        );
    }

    #[test]
    fn test_never_emits_both_sides_of_a_pair() {
        for shared in [false, true] {
            let mut options = OptionSet::default();
            if shared {
                options.enable(BuildOption::Shared);
                options.disable(BuildOption::Fpic);
            }

            let resolution =
                resolve(&config_with(options, BuildType::Release), &metadata()).unwrap();
            let args = &resolution.configure_args;

            for (on, off) in [
                ("--enable-shared", "--disable-shared"),
                ("--with-system-expat", "--without-system-expat"),
                ("--with-system-libmpdec", "--without-system-libmpdec"),
                ("--enable-optimizations", "--disable-optimizations"),
                ("--with-lto", "--without-lto"),
                ("--with-pydebug", "--without-pydebug"),
                ("--with-assertions", "--without-assertions"),
                ("--enable-ipv6", "--disable-ipv6"),
            ] {
                let on_present = args.iter().any(|a| a == on);
                let off_present = args.iter().any(|a| a == off);
                assert!(on_present != off_present, "pair {}/{} violated", on, off);
            }
        }
    }

    #[test]
    fn test_rejects_shared_with_fpic() {
        let mut options = OptionSet::new();
        options.enable(BuildOption::Shared);
        options.enable(BuildOption::Fpic);

        let result = BuildConfiguration::new(options, linux(BuildType::Release), Version::new(3, 7, 1));
        assert_matches!(result, Err(Error::Validation(_)));
    }

    #[test]
    fn test_rejects_nis_on_windows() {
        let mut options = OptionSet::new();
        options.enable(BuildOption::Nis);
        let platform = Platform::new(Os::Windows, Compiler::Msvc, Arch::X86_64, BuildType::Release);

        let result = BuildConfiguration::new(options, platform, Version::new(3, 7, 1));
        assert_matches!(result, Err(Error::Validation(_)));
    }

    #[test]
    fn test_static_release_args() {
        let mut options = OptionSet::default();
        options.disable(BuildOption::Tcltk);
        options.disable(BuildOption::Uuid);

        let resolution = resolve(&config_with(options, BuildType::Release), &metadata()).unwrap();
        let args = &resolution.configure_args;

        assert!(args.contains(&"--disable-shared".to_string()));
        assert!(args.contains(&"--without-pydebug".to_string()));
        assert!(args.contains(&"--without-assertions".to_string()));
        assert!(args.contains(&"--enable-ipv6".to_string()));
        assert!(args.contains(&"--with-openssl=/usr".to_string()));
    }

    #[test]
    fn test_debug_pair_travels_together() {
        let mut options = OptionSet::default();
        options.disable(BuildOption::Tcltk);
        options.disable(BuildOption::Uuid);

        let resolution = resolve(&config_with(options, BuildType::Debug), &metadata()).unwrap();
        let args = &resolution.configure_args;

        let pydebug = args.iter().position(|a| a == "--with-pydebug").unwrap();
        let assertions = args.iter().position(|a| a == "--with-assertions").unwrap();
        assert_eq!(assertions, pydebug + 1);
    }

    #[test]
    fn test_tcltk_aggregation() {
        let mut meta = MetadataSet::new();
        meta.declare("openssl", DependencyMetadata::new("/usr"));
        meta.declare(
            "tcl",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include/tcl")
                .with_lib("tcl86"),
        );
        meta.declare(
            "tk",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include/tk")
                .with_lib("tk86"),
        );
        meta.declare(
            "zlib",
            DependencyMetadata::new("/usr")
                .with_include_dir("/usr/include/zlib")
                .with_lib("z"),
        );

        let mut options = OptionSet::new();
        options.enable(BuildOption::Tcltk);

        let resolution = resolve(&config_with(options, BuildType::Release), &meta).unwrap();
        let args = &resolution.configure_args;

        assert!(args.contains(
            &"--with-tcltk-includes=-I/usr/include/tcl -I/usr/include/tk -I/usr/include/zlib"
                .to_string()
        ));
        assert!(args.contains(&"--with-tcltk-libs=-ltcl86 -ltk86 -lz".to_string()));
    }

    #[test]
    fn test_tcltk_missing_metadata() {
        let mut meta = MetadataSet::new();
        meta.declare("openssl", DependencyMetadata::new("/usr"));

        let mut options = OptionSet::new();
        options.enable(BuildOption::Tcltk);

        let result = resolve(&config_with(options, BuildType::Release), &meta);
        assert_matches!(result, Err(Error::MissingMetadata(ref d)) if d == "tcl");
    }

    #[test]
    fn test_uuid_include_quirk() {
        let mut options = OptionSet::new();
        options.enable(BuildOption::Uuid);

        let resolution = resolve(&config_with(options, BuildType::Release), &metadata()).unwrap();
        assert_eq!(
            resolution.extra_include_paths,
            vec![PathBuf::from("/usr/include/uuid")]
        );
    }

    #[test]
    fn test_no_uuid_no_extra_includes() {
        let mut options = OptionSet::default();
        options.disable(BuildOption::Uuid);

        let resolution = resolve(&config_with(options, BuildType::Release), &metadata()).unwrap();
        assert!(resolution.extra_include_paths.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = config_with(OptionSet::default(), BuildType::Release);
        let meta = metadata();

        let first = resolve(&config, &meta).unwrap();
        let second = resolve(&config, &meta).unwrap();
        assert_eq!(first, second);
    }
}
