//! The build-and-run boundary: render, write, and hand off to the authoring tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::error::Error;
use crate::model::Disc;
use crate::writer;

/// Render and resolve `disc`, then write the document.
///
/// The document goes to `document` if given, otherwise to
/// `<output_dir>/<config.document>`. The output directory is created if
/// needed. Nothing is written when resolution fails.
///
/// # Errors
///
/// Returns resolution errors from [`writer::render`], or `Error::Io` if the
/// directory or file cannot be written.
pub fn write_document(
    disc: &Disc,
    output_dir: &Path,
    document: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, Error> {
    let xml = writer::render(disc, output_dir)?;

    std::fs::create_dir_all(output_dir)?;
    let path = document.map_or_else(|| return output_dir.join(&config.document), Path::to_path_buf);
    if let Some(parent) = path.parent().filter(|p| return !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, xml)?;

    tracing::info!(path = %path.display(), "wrote authoring document");
    return Ok(path);
}

/// Write the document, then run `<config.program> -x <document>`.
///
/// # Errors
///
/// Returns everything [`write_document`] can, plus
/// `Error::AuthoringToolNotFound` if the program cannot be spawned and
/// `Error::AuthoringFailed` if it exits unsuccessfully.
pub fn author(
    disc: &Disc,
    output_dir: &Path,
    document: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, Error> {
    let path = write_document(disc, output_dir, document, config)?;
    run_authoring_tool(&config.program, &path)?;
    return Ok(path);
}

/// Spawn the authoring program on a written document and wait for it.
///
/// # Errors
///
/// Returns `Error::AuthoringToolNotFound` or `Error::AuthoringFailed`.
fn run_authoring_tool(program: &str, document: &Path) -> Result<(), Error> {
    tracing::info!(program, document = %document.display(), "running authoring tool");

    let status = match Command::new(program).arg("-x").arg(document).status() {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::AuthoringToolNotFound { program: program.to_string() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(status) => status,
    };

    if !status.success() {
        tracing::warn!(program, code = ?status.code(), "authoring tool failed");
        return Err(Error::AuthoringFailed {
            program: program.to_string(),
            status: status.code(),
        });
    }
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;
    use crate::model::{Menu, Titleset};
    use crate::model::ProgramChain as _;

    /// A disc whose only menu refers to a menu that was never attached.
    fn dangling_disc() -> Disc {
        let mut disc = Disc::new();
        let orphan = Menu::new(disc.handles(), None);
        let mut menu = Menu::new(disc.handles(), None);
        menu.set_post_commands(format!("jump {};", orphan.handle().full()));
        let mut ts = Titleset::new(disc.handles());
        ts.add_menu(menu).unwrap();
        disc.add_titleset(ts);
        return disc;
    }

    #[test]
    fn writes_to_default_location() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("disc");
        let disc = Disc::new();
        let path = write_document(&disc, &out, None, &Config::default()).unwrap();
        assert_eq!(path, out.join("dvdauthor.xml"));
        let xml = std::fs::read_to_string(path).unwrap();
        assert!(xml.contains(&format!("dest=\"{}\"", out.display())));
    }

    #[test]
    fn writes_to_explicit_location() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("nested/project.xml");
        let path = write_document(&Disc::new(), &dir.path().join("disc"), Some(&doc), &Config::default()).unwrap();
        assert_eq!(path, doc);
        assert!(doc.exists());
    }

    #[test]
    fn nothing_written_on_dangling_reference() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("disc");
        let err = write_document(&dangling_disc(), &out, None, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn missing_program_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            program: "discref-no-such-authoring-tool".to_string(),
            ..Config::default()
        };
        let err = author(&Disc::new(), dir.path(), None, &config).unwrap_err();
        assert!(matches!(err, Error::AuthoringToolNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            program: "false".to_string(),
            ..Config::default()
        };
        let err = author(&Disc::new(), dir.path(), None, &config).unwrap_err();
        assert!(matches!(err, Error::AuthoringFailed { status: Some(1), .. }));
    }
}
