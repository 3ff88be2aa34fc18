use std::path::PathBuf;

use crate::error::{SnapError, SnapResult};

/// What the harness does after a test body finishes drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Write the actual image only. Used to (re)generate golden references.
    GenerateOnly,
    /// Write the actual image, then compare it against the committed reference.
    Compare,
}

/// Process-wide harness configuration.
///
/// Constructed once before any fixture runs and shared read-only afterwards
/// (see [`crate::session::Session`]). There is no interior mutability; test
/// isolation goes through [`crate::session::Session::reset_with`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HarnessConfig {
    pub mode: RunMode,
    /// Directory receiving actual and delta images.
    pub output_dir: PathBuf,
    /// Directory holding committed reference images.
    pub reference_dir: PathBuf,
}

impl HarnessConfig {
    pub fn new(
        mode: RunMode,
        output_dir: impl Into<PathBuf>,
        reference_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode,
            output_dir: output_dir.into(),
            reference_dir: reference_dir.into(),
        }
    }

    /// Read configuration from `SNAPCHECK_MODE`, `SNAPCHECK_OUTPUT_DIR`, and
    /// `SNAPCHECK_REFERENCE_DIR`.
    ///
    /// `SNAPCHECK_MODE` accepts `generate` or `compare` and defaults to
    /// `compare` when unset. The directory variables are required.
    pub fn from_env() -> SnapResult<Self> {
        let mode = match std::env::var("SNAPCHECK_MODE") {
            Ok(v) => match v.as_str() {
                "generate" => RunMode::GenerateOnly,
                "compare" => RunMode::Compare,
                other => {
                    return Err(SnapError::config(format!(
                        "SNAPCHECK_MODE must be 'generate' or 'compare', got '{other}'"
                    )));
                }
            },
            Err(_) => RunMode::Compare,
        };

        let dir = |key: &str| -> SnapResult<PathBuf> {
            std::env::var_os(key)
                .map(PathBuf::from)
                .ok_or_else(|| SnapError::config(format!("{key} is not set")))
        };

        Ok(Self {
            mode,
            output_dir: dir("SNAPCHECK_OUTPUT_DIR")?,
            reference_dir: dir("SNAPCHECK_REFERENCE_DIR")?,
        })
    }

    pub fn validate(&self) -> SnapResult<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(SnapError::config("output_dir must not be empty"));
        }
        if self.mode == RunMode::Compare && self.reference_dir.as_os_str().is_empty() {
            return Err(SnapError::config(
                "reference_dir must not be empty in compare mode",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_dirs() {
        let c = HarnessConfig::new(RunMode::Compare, "", "refs");
        assert!(c.validate().is_err());

        let c = HarnessConfig::new(RunMode::Compare, "out", "");
        assert!(c.validate().is_err());

        // Generate mode never reads the reference directory.
        let c = HarnessConfig::new(RunMode::GenerateOnly, "out", "");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn mode_serde_round_trip() {
        let c = HarnessConfig::new(RunMode::GenerateOnly, "out", "refs");
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("generate_only"));
        let back: HarnessConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
