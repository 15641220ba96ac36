mod common;

use std::fs;
use std::process::Command;

use serde_json::Value;

#[test]
fn decompress_cli_writes_and_reuses_sibling() {
    let exe = env!("CARGO_BIN_EXE_dbd_decompress");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("01600000.mcg");
    fs::write(&input, common::compress_container(b"the8x3_filename: 01600000\n")).unwrap();

    let run = || {
        Command::new(exe)
            .args([input.to_str().unwrap(), "--json"])
            .output()
            .expect("failed to run dbd_decompress")
    };

    let first = run();
    assert!(first.status.success());
    let json: Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(json[0]["bytes"].as_u64().unwrap(), 26);
    assert_eq!(json[0]["reused"], Value::Bool(false));
    assert_eq!(
        fs::read(dir.path().join("01600000.mlg")).unwrap(),
        b"the8x3_filename: 01600000\n"
    );

    let second = run();
    assert!(second.status.success());
    let json: Value = serde_json::from_slice(&second.stdout).unwrap();
    assert_eq!(json[0]["reused"], Value::Bool(true));
    assert!(!dir.path().join("01600000.mbg").exists());
}

#[test]
fn decompress_cli_names_cache_files() {
    let exe = env!("CARGO_BIN_EXE_dbd_decompress");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("0a1b2c3d.ccc");
    fs::write(&input, common::compress_container(b"s: 0 1 12 c_heading rad\n")).unwrap();
    let output = Command::new(exe)
        .args([input.to_str().unwrap(), "--json"])
        .output()
        .expect("run failed");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json[0]["output"].as_str().unwrap().ends_with("0a1b2c3d.cac"));
    assert!(dir.path().join("0a1b2c3d.cac").exists());
}

#[test]
fn invalid_extension_error() {
    let exe = env!("CARGO_BIN_EXE_dbd_decompress");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("01600000.dbd");
    fs::write(&input, b"plain").unwrap();
    let output = Command::new(exe)
        .arg(input.to_str().unwrap())
        .output()
        .expect("run failed");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid file extension"));
}

#[test]
fn truncated_file_error() {
    let exe = env!("CARGO_BIN_EXE_dbd_decompress");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.dcd");
    fs::write(&input, [0x00, 0x40, 0x01, 0x02]).unwrap();
    let output = Command::new(exe)
        .args([input.to_str().unwrap(), "--force"])
        .output()
        .expect("run failed");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("truncated or corrupted"));
    assert!(!dir.path().join("bad.dbd").exists());
}
