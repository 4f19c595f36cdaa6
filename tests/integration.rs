use std::path::Path;
use std::process::Command;

fn discref_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_discref"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd
}

#[test]
fn render_resolves_every_placeholder() {
    let out = discref_cmd("basic").args(["render", "disc.toml"]).output().unwrap();
    assert!(
        out.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let xml = String::from_utf8(out.stdout).unwrap();

    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(r#"<dvdauthor dest="dvd" jumppad="yes">"#));
    assert!(xml.contains("<fpc>jump menu 1;</fpc>"));
    assert!(xml.contains(r#"<button name="play">jump titleset 1 title 1;</button>"#));
    assert!(xml.contains(r#"<button name="extras">jump titleset 1 title 2;</button>"#));
    assert!(xml.contains("<button>jump title 1;</button>"));
    assert!(xml.contains("<post>jump title 1;</post>"));
    assert!(!xml.contains("@@"), "unresolved handle left in output:\n{xml}");
}

#[test]
fn render_honours_output_dir() {
    let out = discref_cmd("basic")
        .args(["render", "disc.toml", "-o", "out/disc"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let xml = String::from_utf8(out.stdout).unwrap();
    assert!(xml.contains(r#"dest="out/disc""#));
}

#[test]
fn addresses_lists_ids() {
    let out = discref_cmd("basic").args(["addresses", "disc.toml"]).output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();

    assert!(text.contains("feature"));
    assert!(text.contains("titleset 1 title 1"));
    assert!(text.contains("vmgm menu 1"));
}

#[test]
fn addresses_json() {
    let out = discref_cmd("basic")
        .args(["addresses", "disc.toml", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);

    let extras = rows.iter().find(|r| r["id"] == "extras").unwrap();
    assert_eq!(extras["full"], "titleset 1 title 2");
    assert_eq!(extras["index"], 2);
    assert_eq!(extras["kind"], "title");

    let main = rows.iter().find(|r| r["id"] == "main").unwrap();
    assert_eq!(main["kind"], "titleset");
}

#[test]
fn unknown_id_fails_with_diagnostic() {
    let out = discref_cmd("broken").args(["render", "disc.toml"]).output().unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unknown Node Id"), "stderr: {stderr}");
    assert!(stderr.contains("`{missing}` in top"), "stderr: {stderr}");
}

#[test]
fn missing_project_fails() {
    let out = discref_cmd("basic").args(["render", "nope.toml"]).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Project Not Found"), "stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn build_writes_document_and_runs_tool() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy("tests/fixtures/basic/disc.toml", dir.path().join("disc.toml")).unwrap();
    std::fs::write(dir.path().join(".discref.toml"), "program = \"true\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_discref"))
        .current_dir(dir.path())
        .args(["build", "disc.toml", "-o", "image"])
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );

    let xml = std::fs::read_to_string(dir.path().join("image/dvdauthor.xml")).unwrap();
    assert!(xml.contains(r#"dest="image""#));
}

#[cfg(unix)]
#[test]
fn build_reports_failing_tool() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy("tests/fixtures/basic/disc.toml", dir.path().join("disc.toml")).unwrap();
    std::fs::write(dir.path().join(".discref.toml"), "program = \"false\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_discref"))
        .current_dir(dir.path())
        .args(["build", "disc.toml", "--xml", "authoring/doc.xml"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(dir.path().join("authoring/doc.xml").exists());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Authoring Failed"), "stderr: {stderr}");
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy("tests/fixtures/basic/disc.toml", dir.path().join("disc.toml")).unwrap();
    std::fs::write(dir.path().join(".discref.toml"), "progam = \"x\"\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_discref"))
        .current_dir(dir.path())
        .args(["build", "disc.toml"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(!dir.path().join("dvd").exists());
}
