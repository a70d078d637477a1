//! Upstream source artifact derivation
//!
//! Pure derivation of where the interpreter sources come from and what the
//! fetch/patch collaborator must do with them. Nothing here touches the
//! network or the filesystem.

use semver::Version;
use serde::{Deserialize, Serialize};
use url::Url;

/// Directory the extracted tree is renamed to
pub const SOURCE_SUBFOLDER: &str = "sources";

/// Known upstream release checksums (sha256 of the .tgz)
const RELEASE_CHECKSUMS: &[(&str, &str)] = &[(
    "3.7.1",
    "36c1b81ac29d0f8341f727ef40864d99d8206897be96be73dc34d4739c9c9f06",
)];

/// One upstream source release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamSource {
    version: Version,
}

impl UpstreamSource {
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Name of the release tarball
    pub fn archive_name(&self) -> String {
        format!("Python-{}.tgz", self.version)
    }

    /// Official download URL for this release
    pub fn download_url(&self) -> Url {
        let url = format!(
            "https://www.python.org/ftp/python/{v}/Python-{v}.tgz",
            v = self.version
        );
        // The format above always yields a valid absolute URL
        Url::parse(&url).unwrap()
    }

    /// Expected sha256 of the tarball, for releases this recipe knows
    pub fn sha256(&self) -> Option<&'static str> {
        let version = self.version.to_string();
        RELEASE_CHECKSUMS
            .iter()
            .find(|(v, _)| *v == version)
            .map(|(_, sum)| *sum)
    }

    /// Directory name the tarball extracts to
    pub fn extracted_dir(&self) -> String {
        format!("Python-{}", self.version)
    }
}

/// A textual patch to apply to an upstream build file after extraction.
///
/// The recipe only declares these; applying them is the fetch collaborator's
/// job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePatch {
    /// File to patch, relative to the extracted source tree
    pub file: &'static str,
    /// Text to find
    pub find: &'static str,
    /// Replacement text
    pub replace: &'static str,
}

/// Patches the upstream tree needs before configure runs
pub fn upstream_patches() -> &'static [SourcePatch] {
    &[
        // setup.py hardcodes the soname and library name of libmpdec in a
        // way that breaks linking against a system copy
        SourcePatch {
            file: "setup.py",
            find: ":libmpdec.so.2",
            replace: "libmpdec",
        },
        SourcePatch {
            file: "setup.py",
            find: "libraries = ['libmpdec']",
            replace: "libraries = ['mpdec']",
        },
        // Building x86 on an x86_64 host is not a real cross build; readlink
        // suffices, so the readelf requirement check is relaxed
        SourcePatch {
            file: "configure",
            find: "as_fn_error $? \"readelf for the host is required for cross builds\"",
            replace: "# as_fn_error $? \"readelf for the host is required for cross builds\"",
        },
        // Makefile.pre.in drops user CFLAGS from the OPT line
        SourcePatch {
            file: "Makefile.pre.in",
            find: "@OPT@",
            replace: "@OPT@ @CFLAGS@",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url() {
        let source = UpstreamSource::new(Version::new(3, 7, 1));
        assert_eq!(
            source.download_url().as_str(),
            "https://www.python.org/ftp/python/3.7.1/Python-3.7.1.tgz"
        );
    }

    #[test]
    fn test_known_checksum() {
        let source = UpstreamSource::new(Version::new(3, 7, 1));
        assert_eq!(
            source.sha256(),
            Some("36c1b81ac29d0f8341f727ef40864d99d8206897be96be73dc34d4739c9c9f06")
        );
    }

    #[test]
    fn test_unknown_release_has_no_checksum() {
        let source = UpstreamSource::new(Version::new(3, 12, 0));
        assert_eq!(source.sha256(), None);
    }

    #[test]
    fn test_extracted_dir() {
        let source = UpstreamSource::new(Version::new(3, 7, 1));
        assert_eq!(source.extracted_dir(), "Python-3.7.1");
        assert_eq!(source.archive_name(), "Python-3.7.1.tgz");
    }

    #[test]
    fn test_patches_name_real_files() {
        for patch in upstream_patches() {
            assert!(!patch.file.is_empty());
            assert_ne!(patch.find, patch.replace);
        }
    }
}
