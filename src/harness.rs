use crate::artifact::{Diagnostics, encode_png, load_reference, write_atomic};
use crate::compare::{Comparator, Comparison};
use crate::config::RunMode;
use crate::error::SnapResult;
use crate::fixture::CanvasFixture;
use crate::naming::{ArtifactPaths, TestIdentity};
use crate::session::Session;

/// Classification of a finished drawing test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Compare mode, and the actual image matched the reference.
    Passed,
    /// Generate-only mode: the actual image was written, nothing compared.
    GeneratedOnly,
    /// Content mismatch, with the differing-pixel count.
    Different { differing: u64 },
    /// Reference missing, or dimension/byte-length mismatch.
    Incomparable,
}

/// Result of the teardown pipeline: the outcome plus everything a human or a
/// reporting tool needs to triage it.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub outcome: Outcome,
    /// Where the rendered image was written.
    pub actual_path: std::path::PathBuf,
    /// Where the reference was looked for (compare mode only).
    pub reference_path: Option<std::path::PathBuf>,
    /// Where the delta image was written (mismatches only).
    pub delta_path: Option<std::path::PathBuf>,
    /// Recorded path properties (`expectedImage`, `actualImage`,
    /// `deltaImage`) for external reporting.
    pub diagnostics: Diagnostics,
}

impl Verdict {
    /// True when the test should be reported green.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed | Outcome::GeneratedOnly)
    }

    /// One-line human-readable summary for assertion messages.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Outcome::Passed => "images match".to_string(),
            Outcome::GeneratedOnly => {
                format!("generated {}", self.actual_path.display())
            }
            Outcome::Different { differing } => {
                format!("images differ nontrivially with {differing} registered differences")
            }
            Outcome::Incomparable => {
                "images are incomparable due to a mismatch in dimensions, presence, or byte length"
                    .to_string()
            }
        }
    }
}

/// Teardown pipeline for a drawing test: capture the fixture's surface,
/// persist the actual image, and (in compare mode) classify it against the
/// committed reference.
///
/// Runs even when the test body itself failed, so diagnostic artifacts are
/// always left behind. Setup, capture, and artifact-write defects come back
/// as `Err` (terminating); `Different` and `Incomparable` are `Ok` verdicts
/// the caller asserts on after any cleanup of its own.
#[tracing::instrument(skip(fixture, session, comparator), fields(test = %identity.full_name()))]
pub fn run_teardown(
    fixture: &mut CanvasFixture,
    session: &mut Session,
    identity: &TestIdentity,
    descriptor: Option<&str>,
    comparator: &dyn Comparator,
) -> SnapResult<Verdict> {
    let actual = fixture.capture(session)?;

    let filename = identity.output_filename(descriptor);
    let paths = ArtifactPaths::resolve(session.config(), &filename)?;

    let encoded = encode_png(&actual)?;
    write_atomic(&paths.actual, &encoded)?;
    tracing::debug!(path = %paths.actual.display(), "wrote actual image");

    if session.config().mode == RunMode::GenerateOnly {
        return Ok(Verdict {
            outcome: Outcome::GeneratedOnly,
            actual_path: paths.actual,
            reference_path: None,
            delta_path: None,
            diagnostics: Diagnostics::new(),
        });
    }

    let reference = load_reference(&paths.reference)?;
    let comparison = comparator.compare(reference.as_ref(), Some(&actual));

    let mut diagnostics = Diagnostics::new();
    let verdict = match comparison {
        Comparison::Same => Verdict {
            outcome: Outcome::Passed,
            actual_path: paths.actual,
            reference_path: Some(paths.reference),
            delta_path: None,
            diagnostics,
        },
        Comparison::Different { differing, diff } => {
            let delta_png = encode_png(&diff)?;
            write_atomic(&paths.delta, &delta_png)?;
            tracing::warn!(differing, path = %paths.delta.display(), "images differ");

            diagnostics.record("expectedImage", paths.reference.display().to_string());
            diagnostics.record("actualImage", paths.actual.display().to_string());
            diagnostics.record("deltaImage", paths.delta.display().to_string());

            Verdict {
                outcome: Outcome::Different { differing },
                actual_path: paths.actual,
                reference_path: Some(paths.reference),
                delta_path: Some(paths.delta),
                diagnostics,
            }
        }
        Comparison::Incomparable => {
            tracing::warn!(reference = %paths.reference.display(), "images are incomparable");

            diagnostics.record("expectedImage", paths.reference.display().to_string());
            diagnostics.record("actualImage", paths.actual.display().to_string());

            Verdict {
                outcome: Outcome::Incomparable,
                actual_path: paths.actual,
                reference_path: Some(paths.reference),
                delta_path: None,
                diagnostics,
            }
        }
    };

    Ok(verdict)
}
