use std::process::Command;

use serde_json::{Value, json};

const BIN: &str = env!("CARGO_BIN_EXE_plastic-classifier");

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a single JSON document")
}

#[test]
fn test_missing_image_argument() {
    let output = Command::new(BIN).output().expect("run binary");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output),
        json!({"error": "No image path provided"})
    );
}

#[test]
fn test_missing_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("bottle.jpg");
    std::fs::write(&image, b"").expect("write image");

    let output = Command::new(BIN)
        .arg("--model")
        .arg(dir.path().join("missing.safetensors"))
        .arg(&image)
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output), json!({"error": "Model not found"}));
}

#[test]
fn test_unreadable_model_is_data_not_exit_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let weights = dir.path().join("best.safetensors");
    std::fs::write(&weights, b"").expect("write weights");
    std::fs::write(
        dir.path().join("best.json"),
        r#"{"size": "n", "names": ["plastic_bottle"]}"#,
    )
    .expect("write manifest");

    let output = Command::new(BIN)
        .arg("--model")
        .arg(&weights)
        .arg(dir.path().join("bottle.jpg"))
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output);
    assert!(value["error"].is_string(), "unexpected output: {value}");
}

#[test]
fn test_extra_image_paths_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = Command::new(BIN)
        .arg("--model")
        .arg(dir.path().join("missing.safetensors"))
        .arg(dir.path().join("a.jpg"))
        .arg(dir.path().join("b.jpg"))
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output), json!({"error": "Model not found"}));
}

#[test]
fn test_unparsable_arguments_are_reported_as_json() {
    let output = Command::new(BIN)
        .arg("-photo.jpg")
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output);
    assert!(value["error"].is_string(), "unexpected output: {value}");
}

#[test]
fn test_help_exits_cleanly() {
    let output = Command::new(BIN).arg("--help").output().expect("run binary");
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--model"));
}
