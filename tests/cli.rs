//! End-to-end runs of the `heredity` binary.

use std::error::Error;
use std::io::Write;
use std::process::Command;

fn heredity() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_heredity"));
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn missing_argument_prints_usage() -> Result<(), Box<dyn Error>> {
    let output = heredity().output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Usage"), "stderr was: {}", stderr);
    Ok(())
}

#[test]
fn extra_argument_is_rejected() -> Result<(), Box<dyn Error>> {
    let output = heredity()
        .args(["data/family0.csv", "data/family1.csv"])
        .output()?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn text_report_for_family0() -> Result<(), Box<dyn Error>> {
    let output = heredity().arg("data/family0.csv").output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with(
        "Harry:\n  Gene:\n    2: 0.0092\n    1: 0.4557\n    0: 0.5351\n  Trait:\n    True: 0.2665\n    False: 0.7335\n"
    ));
    Ok(())
}

#[test]
fn json_report_parses() -> Result<(), Box<dyn Error>> {
    let output = heredity()
        .args(["--format", "json", "data/family2.csv"])
        .output()?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json.as_array().map(Vec::len), Some(5));
    Ok(())
}

#[test]
fn joint_probability_of_one_world() -> Result<(), Box<dyn Error>> {
    let output = heredity()
        .args([
            "data/family0.csv",
            "--joint",
            "--one-gene",
            "Harry,Lily",
            "--two-genes",
            "James",
            "--have-trait",
            "Harry,Lily,James",
        ])
        .output()?;
    assert!(output.status.success());
    let p: f64 = String::from_utf8(output.stdout)?.trim().parse()?;
    assert!((p - 3.0576e-05).abs() < 1e-15);
    Ok(())
}

#[test]
fn model_file_is_applied() -> Result<(), Box<dyn Error>> {
    let mut model = tempfile::NamedTempFile::new()?;
    writeln!(model, "mutation = 0.0")?;
    let output = heredity()
        .args(["data/family0.csv", "--joint", "--one-gene", "Harry"])
        .arg("--model")
        .arg(model.path())
        .output()?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.trim(), "0");
    Ok(())
}

#[test]
fn malformed_data_fails() -> Result<(), Box<dyn Error>> {
    let mut data = tempfile::NamedTempFile::new()?;
    writeln!(data, "name,mother,father,trait")?;
    writeln!(data, "Harry,Lily,,")?;
    writeln!(data, "Lily,,,0")?;
    let output = heredity().arg(data.path()).output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Harry"), "stderr was: {}", stderr);
    Ok(())
}
