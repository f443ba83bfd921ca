use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn imgconv(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_imgconv"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run imgconv")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn write_sample(path: &Path) {
    let img = RgbaImage::from_fn(8, 8, |x, y| Rgba([x as u8 * 30, y as u8 * 30, 90, 255]));
    DynamicImage::ImageRgba8(img).save(path).unwrap();
}

#[test]
fn single_file_success() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.png");
    let dest = dir.path().join("nested").join("out.webp");
    write_sample(&source);

    let output = imgconv(&[
        path_str(&source),
        path_str(&dest),
        "--format",
        "webp",
        "--compress",
        "70",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("Success: {} -> {}", source.display(), dest.display())
    );
    assert!(dest.is_file());
}

#[test]
fn missing_source_fails_without_creating_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest_dir = dir.path().join("out");

    let output = imgconv(&[
        path_str(&dir.path().join("nope.png")),
        path_str(&dest_dir.join("x.jpg")),
        "--format",
        "jpeg",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
    assert!(!dest_dir.exists());
}

#[test]
fn compress_out_of_range_rejected_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let dest_dir = dir.path().join("out");
    let source = dir.path().join("in.png");
    write_sample(&source);

    for bad in ["5", "150"] {
        let output = imgconv(&[
            path_str(&source),
            path_str(&dest_dir),
            "--format",
            "jpeg",
            "--compress",
            bad,
        ]);
        assert!(!output.status.success(), "--compress {} accepted", bad);
        assert!(!dest_dir.exists());
    }
}

#[test]
fn corrupt_single_file_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("broken.jpg");
    fs::write(&source, b"garbage").unwrap();

    let dest = dir.path().join("o.png");
    let output = imgconv(&[path_str(&source), path_str(&dest), "--format", "png"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with(&format!("Error converting {}:", source.display())));
}

#[test]
fn directory_mode_counts_successes() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let out = dst.path().join("converted");

    write_sample(&src.path().join("a.png"));
    write_sample(&src.path().join("b.bmp"));
    write_sample(&src.path().join("c.tiff"));
    fs::write(src.path().join("notes.txt"), b"not an image").unwrap();
    fs::write(src.path().join("d.gif"), b"broken gif").unwrap();

    let output = imgconv(&[path_str(src.path()), path_str(&out), "--format", "png8"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.iter().filter(|l| l.starts_with("Success: ")).count(), 3);
    assert_eq!(lines.last(), Some(&"Done: Converted 3 images."));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error converting"));

    for name in ["a.png", "b.png", "c.png"] {
        assert!(out.join(name).is_file(), "{}", name);
    }
    assert!(!out.join("d.png").exists());
    assert_eq!(fs::read(src.path().join("notes.txt")).unwrap(), b"not an image");
}

#[test]
fn json_progress_lines_parse() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    write_sample(&src.path().join("a.png"));
    write_sample(&src.path().join("b.png"));

    let output = imgconv(&[
        path_str(src.path()),
        path_str(dst.path()),
        "--format",
        "jpeg",
        "--json-progress",
        "--jobs",
        "2",
    ]);

    assert!(output.status.success());
    let messages: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let completed = messages.iter().filter(|m| m["type"] == "filecompleted").count();
    assert_eq!(completed, 2);
    let summary = messages.last().unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["processed"], 2);
}

#[test]
fn config_file_supplies_format() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("in.png");
    let dest = dir.path().join("out.jpg");
    let config = dir.path().join("imgconv.json");
    write_sample(&source);
    fs::write(&config, r#"{"format": "jpeg", "compress": 40}"#).unwrap();

    let output = imgconv(&[path_str(&source), path_str(&dest), "--config", path_str(&config)]);

    assert!(output.status.success());
    let decoded = image::open(&dest).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
}
