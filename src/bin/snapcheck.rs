use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use snapcheck::{Bitmap, Comparator as _, Comparison, DiffMetric, PixelComparator};

#[derive(Parser, Debug)]
#[command(name = "snapcheck", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare an actual PNG against an expected PNG.
    Compare(CompareArgs),
    /// Promote an actual image to be the committed reference.
    Approve(ApproveArgs),
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// Expected (reference) PNG.
    #[arg(long)]
    expected: PathBuf,

    /// Actual (freshly rendered) PNG.
    #[arg(long)]
    actual: PathBuf,

    /// Where to write the delta PNG when the images differ.
    #[arg(long)]
    diff: Option<PathBuf>,

    /// Per-pixel difference tolerance.
    #[arg(long, default_value_t = 0)]
    tolerance: u32,

    /// How per-channel differences collapse into a per-pixel magnitude.
    #[arg(long, value_enum, default_value_t = MetricChoice::Sum)]
    metric: MetricChoice,
}

#[derive(Parser, Debug)]
struct ApproveArgs {
    /// Actual PNG to promote.
    #[arg(long)]
    actual: PathBuf,

    /// Reference path to overwrite.
    #[arg(long)]
    reference: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricChoice {
    /// Sum of per-channel absolute differences (0..=1020).
    Sum,
    /// Largest per-channel absolute difference (0..=255).
    Max,
}

impl From<MetricChoice> for DiffMetric {
    fn from(c: MetricChoice) -> Self {
        match c {
            MetricChoice::Sum => DiffMetric::ChannelSum,
            MetricChoice::Max => DiffMetric::ChannelMax,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let code = match cli.cmd {
        Command::Compare(args) => cmd_compare(args)?,
        Command::Approve(args) => cmd_approve(args)?,
    };
    std::process::exit(code);
}

fn read_png(path: &Path) -> anyhow::Result<Option<Bitmap>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read '{}'", path.display())),
    };
    let bitmap =
        snapcheck::decode_png(&bytes).with_context(|| format!("decode '{}'", path.display()))?;
    Ok(Some(bitmap))
}

fn cmd_compare(args: CompareArgs) -> anyhow::Result<i32> {
    let expected = read_png(&args.expected)?;
    let actual = read_png(&args.actual)?;

    let comparator = PixelComparator::new(args.tolerance).with_metric(args.metric.into());
    match comparator.compare(expected.as_ref(), actual.as_ref()) {
        Comparison::Same => {
            println!("same");
            Ok(0)
        }
        Comparison::Different { differing, diff } => {
            println!("different: {differing} differing pixels");
            if let Some(diff_path) = &args.diff {
                let png = snapcheck::encode_png(&diff)?;
                snapcheck::write_atomic(diff_path, &png)?;
                println!("delta written to {}", diff_path.display());
            }
            Ok(1)
        }
        Comparison::Incomparable => {
            println!("incomparable: missing input or dimension mismatch");
            Ok(2)
        }
    }
}

fn cmd_approve(args: ApproveArgs) -> anyhow::Result<i32> {
    // Decode before promoting so a truncated artifact never becomes golden.
    read_png(&args.actual)?
        .with_context(|| format!("'{}' does not exist", args.actual.display()))?;

    if let Some(parent) = args.reference.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create '{}'", parent.display()))?;
    }
    std::fs::copy(&args.actual, &args.reference).with_context(|| {
        format!(
            "copy '{}' to '{}'",
            args.actual.display(),
            args.reference.display()
        )
    })?;
    println!(
        "approved {} -> {}",
        args.actual.display(),
        args.reference.display()
    );
    Ok(0)
}
