use assert_cmd::cargo::cargo_bin;
use std::fs;
use std::process::{Command, Stdio};

#[test]
fn exits_successfully_when_downstream_pipe_closes() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    let document = "Paragraph of text.\n\n".repeat(20_000);
    for name in ["a.md", "b.md", "c.md"] {
        fs::write(temp.path().join(name), &document)?;
    }

    let mut cmd = Command::new(cargo_bin("markdown-convert"));
    cmd.current_dir(temp.path())
        .arg("*.md")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    drop(child.stdout.take());

    let output = child.wait_with_output()?;
    assert!(
        output.status.success(),
        "expected success, got status: {status:?}",
        status = output.status
    );
    assert!(
        output.stderr.is_empty(),
        "expected stderr to be empty, got: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(())
}
