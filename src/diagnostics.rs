use std::fmt::Write as _;

use crate::config::CONFIG_FILE;
use crate::error::{DanglingHandle, Error};
use crate::types::{ContainerKind, Entry};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::DanglingReference { handles } => render_dangling(handles),
        Error::InvalidEntryPoint { container, entry } => render_invalid_entry(*container, *entry),
        Error::UnknownNodeId { id, referenced_from } => render_unknown_id(id, referenced_from),
        Error::AuthoringToolNotFound { program } => render_tool_not_found(program),
        Error::VmgmAlreadySet => render_vmgm_already_set(),
        _ => render_generic(e),
    };
}

/// Variants that need no more than a heading and the message.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::ProjectNotFound { path } => format!("\
# Error: Project Not Found

`{}` does not exist.
", path.display()),

        Error::MalformedReference { command, referenced_from } => format!("\
# Error: Malformed Reference

The command in {referenced_from} contains `@@` but no valid handle:

    {command}
"),

        Error::DuplicateHandle { handle, first, second } => format!("\
# Error: Duplicate Handle

`{handle}` belongs to the nodes at {first} and {second}. Each node must be
created once with `new` and attached once.
"),

        Error::DuplicateNodeId { id } => format!("\
# Error: Duplicate Id

More than one node declares `id = \"{id}\"`. Ids must be unique across the project.
"),

        Error::UnknownEntryTag { tag } => format!("\
# Error: Unknown Entry Tag

`{tag}` is not an entry tag. Use one of `title`, `root`, `subtitle`, `audio`, `angle`, `ptt`.
"),

        Error::AuthoringFailed { .. } => format!("\
# Error: Authoring Failed

{e}

The document was written; check the tool's output above.
"),

        Error::TomlDe(err) => format!("\
# Error: Invalid TOML

{err}
"),

        _ => format!("\
# Error

{e}
"),
    };
}

fn render_dangling(handles: &[DanglingHandle]) -> String {
    let mut out = "\
# Error: Dangling Reference

These handles are used in commands but their nodes are not in the disc:

"
    .to_string();

    for d in handles {
        let what = d.kind.map_or_else(
            || return "not issued by this disc".to_string(),
            |k| return format!("{k}, never attached or since removed"),
        );
        let _ = writeln!(out, "- `{}` ({what}) in {}", d.handle, d.referenced_from);
    }

    out.push_str("\
\n## Fix

Attach each node to a titleset or the vmgm before rendering, or drop the command that refers to it.
");
    return out;
}

fn render_invalid_entry(container: ContainerKind, entry: Entry) -> String {
    let allowed = container
        .allowed_entries()
        .iter()
        .map(|e| return format!("`{e}`"))
        .collect::<Vec<_>>()
        .join(", ");
    return format!("\
# Error: Invalid Entry Point

A menu with `entry = \"{entry}\"` cannot go in a {container} menu domain.

## Allowed

{allowed}, or no entry tag.
");
}

fn render_unknown_id(id: &str, referenced_from: &str) -> String {
    return format!("\
# Error: Unknown Node Id

`{{{id}}}` in {referenced_from} names no node.

## Fix

Give the target node `id = \"{id}\"`, or correct the placeholder.
");
}

fn render_tool_not_found(program: &str) -> String {
    return format!("\
# Error: Authoring Tool Not Found

`{program}` is not on `PATH`.

## Fix

Install it, or point `{CONFIG_FILE}` at it:

    program = \"/path/to/dvdauthor\"

Use `discref render` to produce the document without running the tool.
");
}

fn render_vmgm_already_set() -> String {
    return "\
# Error: VMGM Already Set

The disc already has a video manager. Use `replace_vmgm` to overwrite it deliberately.
"
    .to_string();
}
