use crate::bitmap::Bitmap;

/// Color marking differing pixels in a synthesized delta image.
const DIFF_MARKER: [u8; 4] = [0, 255, 0, 255];

/// How per-channel differences collapse into one per-pixel magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiffMetric {
    /// Sum of the four per-channel absolute differences (0..=1020).
    ///
    /// Large tolerances (512, 1024, ...) are meaningful under this metric;
    /// it is the default policy.
    #[default]
    ChannelSum,
    /// Largest single per-channel absolute difference (0..=255).
    ChannelMax,
}

/// Outcome of comparing a reference bitmap against an actual bitmap.
#[derive(Clone, Debug)]
pub enum Comparison {
    /// No pixel's difference magnitude exceeded the tolerance.
    Same,
    /// At least one pixel differed; carries the count and a delta image of
    /// the shared dimensions with differing positions marked.
    Different { differing: u64, diff: Bitmap },
    /// The images cannot be meaningfully diffed: one is missing, or their
    /// dimensions or byte lengths disagree. Signals a reference/fixture
    /// inconsistency, not a rendering regression.
    Incomparable,
}

impl Comparison {
    pub fn is_same(&self) -> bool {
        matches!(self, Comparison::Same)
    }
}

/// Capability for classifying a reference/actual bitmap pair.
///
/// Implementations are stateless beyond their construction parameters, so
/// differently parameterized instances can coexist freely.
pub trait Comparator {
    fn compare(&self, reference: Option<&Bitmap>, actual: Option<&Bitmap>) -> Comparison;
}

/// Pixel-by-pixel comparator with a per-pixel difference tolerance.
///
/// A pixel counts as differing only when its magnitude under the configured
/// [`DiffMetric`] is strictly greater than the tolerance, so `compare(b, b)`
/// is `Same` for any tolerance >= 0.
#[derive(Clone, Copy, Debug)]
pub struct PixelComparator {
    tolerance: u32,
    metric: DiffMetric,
}

impl PixelComparator {
    pub fn new(tolerance: u32) -> Self {
        Self {
            tolerance,
            metric: DiffMetric::default(),
        }
    }

    /// Byte-exact comparison.
    pub fn exact() -> Self {
        Self::new(0)
    }

    pub fn with_metric(mut self, metric: DiffMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    fn magnitude(&self, a: [u8; 4], b: [u8; 4]) -> u32 {
        let diffs = [0usize, 1, 2, 3].map(|i| u32::from(a[i].abs_diff(b[i])));
        match self.metric {
            DiffMetric::ChannelSum => diffs.iter().sum(),
            DiffMetric::ChannelMax => diffs.into_iter().max().unwrap_or(0),
        }
    }
}

impl Comparator for PixelComparator {
    fn compare(&self, reference: Option<&Bitmap>, actual: Option<&Bitmap>) -> Comparison {
        let (Some(reference), Some(actual)) = (reference, actual) else {
            return Comparison::Incomparable;
        };
        if reference.width() != actual.width()
            || reference.height() != actual.height()
            || reference.byte_len() != actual.byte_len()
        {
            return Comparison::Incomparable;
        }

        let width = actual.width();
        let height = actual.height();
        let mut differing = 0u64;
        let mut diff_data = vec![0u8; actual.byte_len()];

        for y in 0..height {
            for x in 0..width {
                let magnitude = self.magnitude(reference.pixel(x, y), actual.pixel(x, y));
                if magnitude > self.tolerance {
                    differing += 1;
                    let i = ((y as usize) * (width as usize) + (x as usize)) * 4;
                    diff_data[i..i + 4].copy_from_slice(&DIFF_MARKER);
                }
            }
        }

        if differing == 0 {
            return Comparison::Same;
        }

        // The diff bitmap shares the inputs' dimensions, so from_raw cannot
        // fail here; fall back to Incomparable rather than panic if it does.
        match Bitmap::from_raw(width, height, diff_data) {
            Ok(diff) => Comparison::Different { differing, diff },
            Err(_) => Comparison::Incomparable,
        }
    }
}
