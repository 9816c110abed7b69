use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SINGLE_LINE: &str = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n20\n0\n11\n3\n21\n4\n0\nENDSEC\n0\nEOF\n";
const SINGLE_CIRCLE: &str = "0\nSECTION\n2\nENTITIES\n0\nCIRCLE\n10\n0\n20\n0\n40\n1\n0\nENDSEC\n0\nEOF\n";

fn dxfview(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dxfview").expect("dxfview 可执行文件");
    cmd.env_remove("DXFVIEW_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(workdir);
    cmd
}

fn write_input(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("写入测试输入");
    path
}

fn parse_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout 应为 JSON")
}

#[test]
fn summary_reports_segment_count() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "line.dxf", SINGLE_LINE.as_bytes());

    dxfview(dir.path())
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("线段数量：1"))
        .stdout(predicate::str::contains("实体统计：LINE=1"));
}

#[test]
fn compact_json_output_is_machine_readable() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "line.dxf", SINGLE_LINE.as_bytes());

    let output = dxfview(dir.path())
        .args(["--format", "json", "--compact"])
        .arg(&input)
        .output()
        .expect("运行 dxfview");
    assert!(output.status.success());
    assert_eq!(output.stdout.iter().filter(|b| **b == b'\n').count(), 1);

    let value = parse_stdout(&output);
    assert_eq!(value["segments"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["segments"][0]["x1"], 0.0);
    assert_eq!(value["segments"][0]["y2"], 4.0);
    assert_eq!(value["report"]["entities"]["LINE"], 1);
}

#[test]
fn reads_from_stdin_dash() {
    let dir = TempDir::new().expect("临时目录");

    dxfview(dir.path())
        .args(["-", "--format", "json"])
        .write_stdin(SINGLE_LINE)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"x2\": 3.0"));
}

#[test]
fn arc_segments_flag_overrides_default() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "circle.dxf", SINGLE_CIRCLE.as_bytes());

    let output = dxfview(dir.path())
        .args(["--format", "json", "--arc-segments", "8"])
        .arg(&input)
        .output()
        .expect("运行 dxfview");
    assert!(output.status.success());
    let value = parse_stdout(&output);
    assert_eq!(value["segments"].as_array().map(Vec::len), Some(8));
}

#[test]
fn discovered_config_sets_output_format() {
    let dir = TempDir::new().expect("临时目录");
    fs::create_dir(dir.path().join("config")).expect("创建配置目录");
    fs::write(
        dir.path().join("config").join("default.toml"),
        "[parser]\narc_segments = 4\n\n[output]\nformat = \"json\"\n",
    )
    .expect("写入配置");
    let input = write_input(&dir, "circle.dxf", SINGLE_CIRCLE.as_bytes());

    let output = dxfview(dir.path()).arg(&input).output().expect("运行 dxfview");
    assert!(output.status.success());
    let value = parse_stdout(&output);
    assert_eq!(value["segments"].as_array().map(Vec::len), Some(4));
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().expect("临时目录");

    dxfview(dir.path())
        .arg(dir.path().join("missing.dxf"))
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn invalid_utf8_fails() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "broken.dxf", b"0\nSECTION\n2\n\xff\xfe\n");

    dxfview(dir.path()).arg(&input).assert().failure().code(1);
}

#[test]
fn zero_arc_segments_in_config_is_rejected() {
    let dir = TempDir::new().expect("临时目录");
    let config = write_input(&dir, "zero.toml", b"[parser]\narc_segments = 0\n");
    let input = write_input(&dir, "line.dxf", SINGLE_LINE.as_bytes());

    dxfview(dir.path())
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn oversized_arc_segments_fail_cleanly() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "circle.dxf", SINGLE_CIRCLE.as_bytes());

    dxfview(dir.path())
        .args(["--arc-segments", "18446744073709551615"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn oversized_insert_depth_fails_cleanly() {
    let dir = TempDir::new().expect("临时目录");
    let input = write_input(&dir, "line.dxf", SINGLE_LINE.as_bytes());

    dxfview(dir.path())
        .args(["--max-insert-depth", "17"])
        .arg(&input)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn unreadable_config_is_logged_and_defaults_apply() {
    let dir = TempDir::new().expect("临时目录");
    let config = write_input(&dir, "broken.toml", b"[output]\nformat = \"svg\"\n");
    let input = write_input(&dir, "line.dxf", SINGLE_LINE.as_bytes());

    dxfview(dir.path())
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("线段数量：1"))
        .stderr(predicate::str::contains("加载配置失败"))
        .stderr(predicate::str::contains("broken.toml"));
}
