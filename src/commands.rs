//! CLI commands: build, render, addresses.

use std::path::{Path, PathBuf};

use discref::author;
use discref::config::Config;
use discref::error;
use discref::project;
use discref::resolver;
use discref::types::NodeKind;
use discref::writer;

/// One row of `discref addresses`.
#[derive(serde::Serialize)]
struct AddressRow<'a> {
    /// Full-address form.
    full: &'a str,
    /// Handle token.
    handle: String,
    /// Project id.
    id: &'a str,
    /// One-based index within the container.
    index: usize,
    /// Node kind.
    kind: NodeKind,
}

/// Load the project, write the document, and run the authoring tool.
///
/// # Errors
///
/// Returns errors from config or project loading, resolution, writing, or the tool.
pub fn build(project_path: &Path, output_dir: &Path, xml: Option<&Path>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let project = project::load(project_path)?;

    let path = author::author(&project.disc, output_dir, xml, &config)?;
    eprintln!("Authored {} from {}", output_dir.display(), path.display());
    return Ok(());
}

/// Print the resolved document to stdout without running the tool.
///
/// # Errors
///
/// Returns errors from project loading or resolution.
pub fn render(project_path: &Path, output_dir: &Path) -> Result<(), error::Error> {
    let project = project::load(project_path)?;
    let xml = writer::render(&project.disc, output_dir)?;
    print!("{xml}");
    return Ok(());
}

/// Print the address every project id resolves to.
///
/// # Errors
///
/// Returns errors from project loading, resolution, or JSON encoding.
pub fn addresses(project_path: &Path, json: bool) -> Result<(), error::Error> {
    let project = project::load(project_path)?;
    let table = resolver::resolve(&project.disc)?;

    let mut rows: Vec<AddressRow<'_>> = project
        .ids
        .iter()
        .filter_map(|(id, handle)| {
            let address = table.get(*handle)?;
            return Some(AddressRow {
                full: &address.full,
                handle: handle.to_string(),
                id,
                index: address.index,
                kind: address.kind,
            });
        })
        .collect();
    rows.sort_by(|a, b| return a.full.cmp(b.full));

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = rows.iter().map(|r| return r.id.len()).max().unwrap_or(0);
    for row in &rows {
        println!("{:width$}  {}  ({})", row.id, row.full, row.index);
    }
    return Ok(());
}
