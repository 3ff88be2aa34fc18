use std::path::PathBuf;

use snapcheck::{Bitmap, encode_png};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_snapcheck")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push("snapcheck");
            p
        })
}

fn write_solid_png(path: &std::path::Path, px: [u8; 4]) {
    let bitmap = Bitmap::from_raw(8, 8, px.repeat(64)).unwrap();
    std::fs::write(path, encode_png(&bitmap).unwrap()).unwrap();
}

#[test]
fn cli_compare_reports_difference_and_writes_delta() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let expected = dir.join("expected.png");
    let actual = dir.join("actual.png");
    let delta = dir.join("delta.png");
    let _ = std::fs::remove_file(&delta);

    write_solid_png(&expected, [0, 0, 0, 255]);
    write_solid_png(&actual, [255, 255, 255, 255]);

    let status = std::process::Command::new(exe())
        .args([
            "compare",
            "--expected",
            expected.to_str().unwrap(),
            "--actual",
            actual.to_str().unwrap(),
            "--diff",
            delta.to_str().unwrap(),
        ])
        .status()
        .expect("spawn snapcheck");

    assert_eq!(status.code(), Some(1));
    assert!(delta.exists());
}

#[test]
fn cli_compare_same_exits_zero_and_tolerance_applies() {
    let dir = PathBuf::from("target").join("cli_smoke_same");
    std::fs::create_dir_all(&dir).unwrap();

    let expected = dir.join("expected.png");
    let actual = dir.join("actual.png");
    write_solid_png(&expected, [100, 100, 100, 255]);
    write_solid_png(&actual, [101, 101, 101, 255]);

    let run = |tolerance: &str| {
        std::process::Command::new(exe())
            .args([
                "compare",
                "--expected",
                expected.to_str().unwrap(),
                "--actual",
                actual.to_str().unwrap(),
                "--tolerance",
                tolerance,
            ])
            .status()
            .expect("spawn snapcheck")
            .code()
    };

    assert_eq!(run("3"), Some(0));
    assert_eq!(run("2"), Some(1));
}

#[test]
fn cli_compare_missing_input_is_incomparable() {
    let dir = PathBuf::from("target").join("cli_smoke_missing");
    std::fs::create_dir_all(&dir).unwrap();

    let actual = dir.join("actual.png");
    write_solid_png(&actual, [1, 2, 3, 255]);

    let status = std::process::Command::new(exe())
        .args([
            "compare",
            "--expected",
            dir.join("nope.png").to_str().unwrap(),
            "--actual",
            actual.to_str().unwrap(),
        ])
        .status()
        .expect("spawn snapcheck");

    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_approve_copies_actual_over_reference() {
    let dir = PathBuf::from("target").join("cli_smoke_approve");
    std::fs::create_dir_all(&dir).unwrap();

    let actual = dir.join("actual.png");
    let reference = dir.join("golden").join("ref.png");
    write_solid_png(&actual, [7, 8, 9, 255]);

    let status = std::process::Command::new(exe())
        .args([
            "approve",
            "--actual",
            actual.to_str().unwrap(),
            "--reference",
            reference.to_str().unwrap(),
        ])
        .status()
        .expect("spawn snapcheck");

    assert_eq!(status.code(), Some(0));
    assert_eq!(
        std::fs::read(&actual).unwrap(),
        std::fs::read(&reference).unwrap()
    );
}
