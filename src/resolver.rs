//! Turn handles embedded in command text into disc addresses.
//!
//! Addresses come from a table built by walking the finished tree once.
//! Command text is only scanned for tokens, never rewritten globally, so a
//! handle-like string in a file path or language code cannot be mistaken
//! for a reference.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{DanglingHandle, Error};
use crate::handle::{DELIMITER, Handle};
use crate::model::{Disc, Menu, ProgramChain as _, Title};
use crate::types::NodeKind;

/// A handle token, optionally preceded by the full-address marker.
/// The optional prefix is part of the match, so `f:@@1.3@@` is never seen as a bare `@@1.3@@`.
static HANDLE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(f:)?@@([0-9]+)\.([0-9]+)@@").expect("valid regex"));

/// Where a node sits in the finished tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Address {
    /// Fully qualified form, e.g. `titleset 2 menu 1`.
    pub full: String,
    /// One-based position within the immediate container.
    pub index: usize,
    /// What the node is.
    pub kind: NodeKind,
}

/// Every handle reachable from the disc root, mapped to its address.
#[derive(Debug, Default)]
pub struct AddressTable {
    /// Addresses keyed by handle; ordered by issue order.
    entries: BTreeMap<Handle, Address>,
}

impl AddressTable {
    /// Walk the tree and record the address of every titleset, menu, and title.
    ///
    /// The video manager itself has no address; only its menus do.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateHandle` if two nodes in the tree carry the same handle.
    pub fn build(disc: &Disc) -> Result<Self, Error> {
        let mut table = Self::default();

        if let Some(vmgm) = disc.vmgm() {
            for (j, menu) in (1_usize..).zip(vmgm.menus()) {
                table.insert(menu.handle(), NodeKind::Menu, j, format!("vmgm menu {j}"))?;
            }
        }

        for (i, titleset) in (1_usize..).zip(disc.titlesets()) {
            table.insert(titleset.handle(), NodeKind::Titleset, i, format!("titleset {i}"))?;
            for (j, menu) in (1_usize..).zip(titleset.menus()) {
                table.insert(menu.handle(), NodeKind::Menu, j, format!("titleset {i} menu {j}"))?;
            }
            for (k, title) in (1_usize..).zip(titleset.titles()) {
                table.insert(title.handle(), NodeKind::Title, k, format!("titleset {i} title {k}"))?;
            }
        }

        tracing::debug!(session = disc.handles().session(), nodes = table.entries.len(), "built address table");
        return Ok(table);
    }

    /// Record one node.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateHandle` if `handle` is already recorded.
    fn insert(&mut self, handle: Handle, kind: NodeKind, index: usize, full: String) -> Result<(), Error> {
        if let Some(existing) = self.entries.get(&handle) {
            return Err(Error::DuplicateHandle {
                handle,
                first: existing.full.clone(),
                second: full,
            });
        }
        self.entries.insert(handle, Address { full, index, kind });
        return Ok(());
    }

    /// The address of `handle`, if its node is in the tree.
    pub fn get(&self, handle: Handle) -> Option<&Address> {
        return self.entries.get(&handle);
    }

    /// Number of nodes with an address.
    pub(crate) fn len(&self) -> usize {
        return self.entries.len();
    }

    /// Replace every token in `text` with its address: `f:<h>` with the full
    /// form, `<h>` with the one-based index. Tokens with no address are left as-is.
    pub fn substitute(&self, text: &str) -> String {
        return HANDLE_TOKEN
            .replace_all(text, |caps: &Captures<'_>| return self.replacement(caps))
            .into_owned();
    }

    /// Replacement text for one token match.
    fn replacement(&self, caps: &Captures<'_>) -> String {
        let original = caps.get(0).map_or("", |m| return m.as_str()).to_string();
        let Some(handle) = handle_from_captures(caps) else {
            return original;
        };
        let Some(address) = self.get(handle) else {
            return original;
        };
        if caps.get(1).is_some() {
            return address.full.clone();
        }
        return address.index.to_string();
    }

    /// Handles used in `text` that have no address, in order of appearance.
    pub fn unresolved_in(&self, text: &str) -> Vec<Handle> {
        return HANDLE_TOKEN
            .captures_iter(text)
            .filter_map(|caps| return handle_from_captures(&caps))
            .filter(|h| return !self.entries.contains_key(h))
            .collect();
    }
}

/// Parse the session and serial out of a token match.
fn handle_from_captures(caps: &Captures<'_>) -> Option<Handle> {
    let session = caps.get(2)?.as_str().parse::<u64>().ok()?;
    let serial = caps.get(3)?.as_str().parse::<u64>().ok()?;
    return Some(Handle::from_parts(session, serial));
}

/// Whether `text` has a token too large to be a handle, or still contains the
/// delimiter once every well-formed token is removed.
fn is_malformed(text: &str) -> bool {
    let overflowing = HANDLE_TOKEN
        .captures_iter(text)
        .any(|caps| return handle_from_captures(&caps).is_none());
    return overflowing || HANDLE_TOKEN.replace_all(text, "").contains(DELIMITER);
}

/// Build the address table and verify that every command in the tree resolves.
///
/// # Errors
///
/// Returns `Error::DuplicateHandle` if two nodes share a handle,
/// `Error::MalformedReference` for the first command containing a stray
/// delimiter or an unparseable token, or `Error::DanglingReference` listing
/// every handle that is used but not reachable from the root.
pub fn resolve(disc: &Disc) -> Result<AddressTable, Error> {
    let table = AddressTable::build(disc)?;
    let mut dangling = Vec::new();
    let mut malformed = None;

    for_each_command(disc, |location, command| {
        if malformed.is_none() && is_malformed(command) {
            malformed = Some(Error::MalformedReference {
                command: command.to_string(),
                referenced_from: location.to_string(),
            });
        }
        for handle in table.unresolved_in(command) {
            dangling.push(DanglingHandle {
                handle,
                kind: disc.handles().kind_of(handle),
                referenced_from: location.to_string(),
            });
        }
    });

    if let Some(err) = malformed {
        return Err(err);
    }
    if !dangling.is_empty() {
        tracing::debug!(count = dangling.len(), "unresolved handles");
        return Err(Error::DanglingReference { handles: dangling });
    }
    return Ok(table);
}

/// Visit every command string reachable from the root, in document order,
/// with a description of where it lives.
pub fn for_each_command(disc: &Disc, mut visit: impl FnMut(&str, &str)) {
    if let Some(vmgm) = disc.vmgm() {
        if let Some(fpc) = vmgm.first_play() {
            visit("vmgm fpc", fpc);
        }
        for (j, menu) in (1_usize..).zip(vmgm.menus()) {
            visit_menu(&format!("vmgm menu {j}"), menu, &mut visit);
        }
    }

    for (i, titleset) in (1_usize..).zip(disc.titlesets()) {
        for (j, menu) in (1_usize..).zip(titleset.menus()) {
            visit_menu(&format!("titleset {i} menu {j}"), menu, &mut visit);
        }
        for (k, title) in (1_usize..).zip(titleset.titles()) {
            visit_title(&format!("titleset {i} title {k}"), title, &mut visit);
        }
    }
}

/// Label a node by its address plus its diagnostic name, if it has one.
fn describe(address: &str, name: Option<&str>) -> String {
    return match name {
        Some(name) => format!("{address} \"{name}\""),
        None => address.to_string(),
    };
}

/// Visit a menu's pre-commands, buttons, and post-commands.
fn visit_menu(address: &str, menu: &Menu, visit: &mut impl FnMut(&str, &str)) {
    let node = describe(address, menu.name());
    if let Some(pre) = &menu.pgc().pre {
        visit(&format!("{node} pre"), pre);
    }
    for (b, button) in (1_usize..).zip(menu.buttons()) {
        let label = match &button.name {
            Some(name) => format!("{node} button \"{name}\""),
            None => format!("{node} button {b}"),
        };
        visit(&label, &button.command);
    }
    if let Some(post) = &menu.pgc().post {
        visit(&format!("{node} post"), post);
    }
}

/// Visit a title's pre- and post-commands.
fn visit_title(address: &str, title: &Title, visit: &mut impl FnMut(&str, &str)) {
    let node = describe(address, title.name());
    if let Some(pre) = &title.pgc().pre {
        visit(&format!("{node} pre"), pre);
    }
    if let Some(post) = &title.pgc().post {
        visit(&format!("{node} post"), post);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;
    use crate::model::{Titleset, Vmgm};

    /// Two titlesets, each with one menu and one title.
    fn two_titlesets(disc: &mut Disc) -> Vec<(Handle, Handle, Handle)> {
        let mut out = Vec::new();
        for _ in 0..2 {
            let mut ts = Titleset::new(disc.handles());
            let menu = Menu::new(disc.handles(), Some(crate::types::Entry::Root));
            let title = Title::new(disc.handles());
            out.push((ts.handle(), menu.handle(), title.handle()));
            ts.add_menu(menu).unwrap();
            ts.add_title(title);
            disc.add_titleset(ts);
        }
        return out;
    }

    #[test]
    fn addresses_are_positional() {
        let mut disc = Disc::new();
        let nodes = two_titlesets(&mut disc);
        let table = AddressTable::build(&disc).unwrap();

        let (ts2, menu2, title2) = nodes[1];
        assert_eq!(table.get(ts2).unwrap().full, "titleset 2");
        assert_eq!(table.get(menu2).unwrap().full, "titleset 2 menu 1");
        assert_eq!(table.get(title2).unwrap().full, "titleset 2 title 1");
        assert_eq!(table.get(title2).unwrap().index, 1);
        assert_eq!(table.get(ts2).unwrap().index, 2);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn full_and_bare_in_one_command() {
        let mut disc = Disc::new();
        let nodes = two_titlesets(&mut disc);
        let table = AddressTable::build(&disc).unwrap();
        let (_, _, title2) = nodes[1];

        let command = format!("jump {}; g1 = {};", title2.full(), title2);
        assert_eq!(table.substitute(&command), "jump titleset 2 title 1; g1 = 1;");
    }

    #[test]
    fn vmgm_menus_use_vmgm_prefix() {
        let mut disc = Disc::new();
        let mut vmgm = Vmgm::new(disc.handles());
        let first = Menu::new(disc.handles(), Some(crate::types::Entry::Title));
        let second = Menu::new(disc.handles(), None);
        let second_handle = second.handle();
        vmgm.add_menu(first).unwrap();
        vmgm.add_menu(second).unwrap();
        disc.set_vmgm(vmgm).unwrap();

        let table = AddressTable::build(&disc).unwrap();
        assert_eq!(table.substitute(&format!("jump {}", second_handle.full())), "jump vmgm menu 2");
        assert_eq!(table.substitute(&format!("jump menu {second_handle}")), "jump menu 2");
    }

    #[test]
    fn text_without_tokens_is_untouched() {
        let table = AddressTable::default();
        assert_eq!(table.substitute("if (g1 == 1) { jump title 1; }"), "if (g1 == 1) { jump title 1; }");
    }

    #[test]
    fn never_attached_menu_is_dangling() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        let orphan = Menu::new(disc.handles(), None);
        let mut referrer = Menu::new(disc.handles(), Some(crate::types::Entry::Root)).with_name("Main");
        referrer.set_post_commands(format!("jump {};", orphan.handle().full()));
        ts.add_menu(referrer).unwrap();
        disc.add_titleset(ts);

        let Err(Error::DanglingReference { handles }) = resolve(&disc) else {
            panic!("expected a dangling reference");
        };
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].handle, orphan.handle());
        assert_eq!(handles[0].kind, Some(NodeKind::Menu));
        assert_eq!(handles[0].referenced_from, "titleset 1 menu 1 \"Main\" post");
    }

    #[test]
    fn stray_delimiter_is_malformed() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        let mut title = Title::new(disc.handles());
        title.set_pre_commands("g1 = @@oops@@;");
        ts.add_title(title);
        disc.add_titleset(ts);

        assert!(matches!(resolve(&disc), Err(Error::MalformedReference { .. })));
    }

    #[test]
    fn oversized_token_is_malformed() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        let mut title = Title::new(disc.handles());
        title.set_post_commands("jump f:@@1.99999999999999999999999@@;");
        ts.add_title(title);
        disc.add_titleset(ts);

        let Err(Error::MalformedReference { command, referenced_from }) = resolve(&disc) else {
            panic!("expected a malformed reference");
        };
        assert_eq!(command, "jump f:@@1.99999999999999999999999@@;");
        assert_eq!(referenced_from, "titleset 1 title 1 post");
    }

    #[test]
    fn non_ascii_digits_are_malformed() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        let mut title = Title::new(disc.handles());
        title.set_pre_commands("jump title @@\u{661}.\u{661}@@;");
        ts.add_title(title);
        disc.add_titleset(ts);

        assert!(matches!(resolve(&disc), Err(Error::MalformedReference { .. })));
    }

    #[test]
    fn unknown_handle_has_no_kind() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        let mut title = Title::new(disc.handles());
        title.set_post_commands("jump @@0.4096@@;");
        ts.add_title(title);
        disc.add_titleset(ts);

        let Err(Error::DanglingReference { handles }) = resolve(&disc) else {
            panic!("expected a dangling reference");
        };
        assert_eq!(handles[0].kind, None);
    }

    #[test]
    fn visits_commands_in_document_order() {
        let mut disc = Disc::new();
        let mut vmgm = Vmgm::new(disc.handles());
        vmgm.set_first_play("jump menu 1;");
        let mut top = Menu::new(disc.handles(), None);
        top.set_button_commands("a", Some("play"));
        top.set_button_commands("b", None);
        vmgm.add_menu(top).unwrap();
        disc.set_vmgm(vmgm).unwrap();
        let mut ts = Titleset::new(disc.handles());
        let mut title = Title::new(disc.handles());
        title.set_pre_commands("c");
        ts.add_title(title);
        disc.add_titleset(ts);

        let mut seen = Vec::new();
        for_each_command(&disc, |location, command| seen.push(format!("{location}: {command}")));
        assert_eq!(seen, [
            "vmgm fpc: jump menu 1;",
            "vmgm menu 1 button \"play\": a",
            "vmgm menu 1 button 2: b",
            "titleset 1 title 1 pre: c",
        ]);
    }
}
