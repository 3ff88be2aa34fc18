use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::error::{SnapError, SnapResult};

/// Marker gtest-style runners prepend to skipped test names. Stripped from
/// filenames so a re-enabled test keeps its committed reference.
const DISABLED_MARKER: &str = "DISABLED_";

/// Identity of a test, from its suite and case names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestIdentity {
    suite: String,
    case: String,
}

impl TestIdentity {
    pub fn new(suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
        }
    }

    /// `Suite.Case`, unsanitized.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.suite, self.case)
    }

    /// Filesystem-safe name: `DISABLED_` stripped, `/` replaced by `_`.
    ///
    /// Parameterized cases carry `/` in their names, so the replacement also
    /// keeps names unique per run.
    pub fn sanitized(&self) -> String {
        self.full_name()
            .replace(DISABLED_MARKER, "")
            .replace('/', "_")
    }

    /// Canonical output filename: `TestImage.<name>[.<descriptor>].png`.
    pub fn output_filename(&self, descriptor: Option<&str>) -> String {
        match descriptor {
            Some(desc) => format!("TestImage.{}.{desc}.png", self.sanitized()),
            None => format!("TestImage.{}.png", self.sanitized()),
        }
    }
}

/// Absolute locations for a test's artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Freshly rendered image, under the output directory.
    pub actual: PathBuf,
    /// Committed golden image, under the reference directory.
    pub reference: PathBuf,
    /// Synthesized delta image, next to the actual image.
    pub delta: PathBuf,
}

impl ArtifactPaths {
    /// Resolve `filename` against the configured directories, normalizing
    /// all three paths to absolute form.
    pub fn resolve(config: &HarnessConfig, filename: &str) -> SnapResult<Self> {
        let delta_name = format!("Delta.{filename}");
        Ok(Self {
            actual: absolutize(&config.output_dir.join(filename))?,
            reference: absolutize(&config.reference_dir.join(filename))?,
            delta: absolutize(&config.output_dir.join(delta_name))?,
        })
    }
}

fn absolutize(path: &Path) -> SnapResult<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        SnapError::artifact(format!(
            "cannot resolve '{}' to an absolute path: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;

    #[test]
    fn sanitizes_disabled_marker_and_separators() {
        let id = TestIdentity::new("Foo", "DISABLED_Bar/Baz");
        assert_eq!(id.output_filename(None), "TestImage.Foo.Bar_Baz.png");
    }

    #[test]
    fn descriptor_is_appended_before_extension() {
        let id = TestIdentity::new("Curves", "Dashes");
        assert_eq!(
            id.output_filename(Some("phase2")),
            "TestImage.Curves.Dashes.phase2.png"
        );
    }

    #[test]
    fn plain_name_passes_through() {
        let id = TestIdentity::new("Lines", "Simple");
        assert_eq!(id.full_name(), "Lines.Simple");
        assert_eq!(id.sanitized(), "Lines.Simple");
    }

    #[test]
    fn paths_resolve_against_both_directories() {
        let config = HarnessConfig::new(RunMode::Compare, "out", "refs");
        let paths = ArtifactPaths::resolve(&config, "TestImage.A.B.png").unwrap();

        assert!(paths.actual.is_absolute());
        assert!(paths.reference.is_absolute());
        assert!(paths.actual.ends_with("out/TestImage.A.B.png"));
        assert!(paths.reference.ends_with("refs/TestImage.A.B.png"));
        assert!(paths.delta.ends_with("out/Delta.TestImage.A.B.png"));
    }
}
