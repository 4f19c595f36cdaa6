//! Render a disc as a `dvdauthor` XML document.
//!
//! Output order is fixed: the video manager first, then each titleset in
//! insertion order with its menus before its titles. Rendering the same
//! tree twice gives byte-identical output.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;
use crate::model::{Disc, Menu, Pgc, ProgramChain as _, Title, Titleset, Vmgm};
use crate::resolver::{self, AddressTable};
use crate::types::{Cell, VideoFile};

/// Spaces per nesting level.
const INDENT: usize = 2;

/// Resolve every handle and render the document.
///
/// `dest` becomes the root element's `dest` attribute: the directory the
/// authoring tool writes the disc image into.
///
/// # Errors
///
/// Returns `Error::DanglingReference` or `Error::MalformedReference` from
/// resolution. Nothing is rendered when resolution fails.
pub fn render(disc: &Disc, dest: &Path) -> Result<String, Error> {
    let table = resolver::resolve(disc)?;
    let xml = render_resolved(disc, &table, dest);
    tracing::debug!(bytes = xml.len(), nodes = table.len(), "rendered document");
    return Ok(xml);
}

/// Render with the table [`resolver::resolve`] returned for `disc`.
fn render_resolved(disc: &Disc, table: &AddressTable, dest: &Path) -> String {
    let mut w = XmlWriter::new(table);
    w.out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let dest = dest.display().to_string();
    let jumppad = disc.jumppad().then_some("yes");
    w.open("dvdauthor", &[("dest", Some(dest.as_str())), ("jumppad", jumppad)]);

    if let Some(vmgm) = disc.vmgm() {
        write_vmgm(&mut w, vmgm);
    }
    for titleset in disc.titlesets() {
        write_titleset(&mut w, titleset);
    }

    w.close("dvdauthor");
    return w.out;
}

/// Emit `<vmgm>`: first-play commands, then the menu domain.
fn write_vmgm(w: &mut XmlWriter<'_>, vmgm: &Vmgm) {
    let has_menus = !vmgm.menus().is_empty() || !vmgm.audio_langs().is_empty() || !vmgm.subpicture_langs().is_empty();
    if vmgm.first_play().is_none() && !has_menus {
        w.empty("vmgm", &[]);
        return;
    }

    w.open("vmgm", &[]);
    if let Some(fpc) = vmgm.first_play() {
        w.command("fpc", &[], fpc);
    }
    if has_menus {
        w.open("menus", &[("lang", vmgm.menu_lang())]);
        write_langs(w, "audio", vmgm.audio_langs());
        write_langs(w, "subpicture", vmgm.subpicture_langs());
        for menu in vmgm.menus() {
            write_menu(w, menu);
        }
        w.close("menus");
    }
    w.close("vmgm");
}

/// Emit `<titleset>`: the menu domain (if any menus) then the titles (if any).
/// Audio languages belong to those blocks, so a titleset with neither renders empty.
fn write_titleset(w: &mut XmlWriter<'_>, titleset: &Titleset) {
    if titleset.menus().is_empty() && titleset.titles().is_empty() {
        w.empty("titleset", &[]);
        return;
    }

    w.open("titleset", &[]);
    if !titleset.menus().is_empty() {
        w.open("menus", &[("lang", titleset.menu_lang())]);
        write_langs(w, "audio", titleset.audio_langs());
        for menu in titleset.menus() {
            write_menu(w, menu);
        }
        w.close("menus");
    }
    if !titleset.titles().is_empty() {
        w.open("titles", &[]);
        write_langs(w, "audio", titleset.audio_langs());
        for title in titleset.titles() {
            write_title(w, title);
        }
        w.close("titles");
    }
    w.close("titleset");
}

/// One empty `<audio lang=..>`/`<subpicture lang=..>` element per language.
fn write_langs(w: &mut XmlWriter<'_>, tag: &str, langs: &[String]) {
    for lang in langs {
        w.empty(tag, &[("lang", Some(lang.as_str()))]);
    }
}

/// Emit a menu pgc with its buttons between the video files and post-commands.
fn write_menu(w: &mut XmlWriter<'_>, menu: &Menu) {
    let entry = menu.entry().map(|e| return e.as_str());
    write_pgc(w, menu.pgc(), entry, |w| {
        for button in menu.buttons() {
            w.command("button", &[("name", button.name.as_deref())], &button.command);
        }
    });
}

/// Emit a title pgc.
fn write_title(w: &mut XmlWriter<'_>, title: &Title) {
    write_pgc(w, title.pgc(), None, |_| {});
}

/// Emit `<pgc>`: pre-commands, video files, whatever `body` adds, post-commands.
fn write_pgc(w: &mut XmlWriter<'_>, pgc: &Pgc, entry: Option<&str>, body: impl FnOnce(&mut XmlWriter<'_>)) {
    let attrs = [("entry", entry), ("pause", pgc.pause.as_deref())];
    w.open("pgc", &attrs);
    if let Some(pre) = &pgc.pre {
        w.command("pre", &[], pre);
    }
    for video in &pgc.videos {
        write_video(w, video);
    }
    body(w);
    if let Some(post) = &pgc.post {
        w.command("post", &[], post);
    }
    w.close("pgc");
}

/// Emit `<vob>` with nested cells.
fn write_video(w: &mut XmlWriter<'_>, video: &VideoFile) {
    let file = video.file.display().to_string();
    let attrs = [
        ("file", Some(file.as_str())),
        ("chapters", video.chapters.as_deref()),
        ("pause", video.pause.as_deref()),
    ];
    if video.cells.is_empty() {
        w.empty("vob", &attrs);
        return;
    }
    w.open("vob", &attrs);
    for cell in &video.cells {
        write_cell(w, cell);
    }
    w.close("vob");
}

/// Emit one `<cell>`. Flags are written only when set.
fn write_cell(w: &mut XmlWriter<'_>, cell: &Cell) {
    w.empty("cell", &[
        ("start", Some(cell.start.as_str())),
        ("end", cell.end.as_deref()),
        ("chapter", cell.chapter.then_some("1")),
        ("program", cell.program.then_some("1")),
        ("pause", cell.pause.as_deref()),
    ]);
}

// ── XML output ────────────────────────────────────────────────────────

/// Indenting element writer. Attributes whose value is `None` are omitted.
struct XmlWriter<'t> {
    /// Current nesting depth.
    depth: usize,
    /// Document text so far.
    out: String,
    /// Addresses substituted into command text.
    table: &'t AddressTable,
}

impl<'t> XmlWriter<'t> {
    /// An empty writer at depth zero.
    const fn new(table: &'t AddressTable) -> Self {
        return Self {
            depth: 0,
            out: String::new(),
            table,
        };
    }

    /// Write the indentation for the current depth.
    fn indent(&mut self) {
        let width = self.depth.saturating_mul(INDENT);
        let _ = write!(self.out, "{:width$}", "");
    }

    /// Write `<tag attr="..."` without closing the start tag.
    fn start_tag(&mut self, tag: &str, attrs: &[(&str, Option<&str>)]) {
        self.indent();
        let _ = write!(self.out, "<{tag}");
        for (name, value) in attrs {
            if let Some(value) = value {
                let _ = write!(self.out, " {name}=\"{}\"", escape_attr(value));
            }
        }
    }

    /// Open an element and descend.
    fn open(&mut self, tag: &str, attrs: &[(&str, Option<&str>)]) {
        self.start_tag(tag, attrs);
        self.out.push_str(">\n");
        self.depth = self.depth.saturating_add(1);
    }

    /// Ascend and close an element.
    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        let _ = writeln!(self.out, "</{tag}>");
    }

    /// Write a self-closing element.
    fn empty(&mut self, tag: &str, attrs: &[(&str, Option<&str>)]) {
        self.start_tag(tag, attrs);
        self.out.push_str("/>\n");
    }

    /// Write an element whose text is command text, with handles replaced by addresses.
    fn command(&mut self, tag: &str, attrs: &[(&str, Option<&str>)], command: &str) {
        let resolved = self.table.substitute(command);
        self.start_tag(tag, attrs);
        let _ = writeln!(self.out, ">{}</{tag}>", escape_text(&resolved));
    }
}

/// Escape character data.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    return out;
}

/// Escape an attribute value (double-quoted).
fn escape_attr(value: &str) -> String {
    return escape_text(value).replace('"', "&quot;");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;
    use crate::model::ProgramChain as _;
    use crate::types::{Entry, VideoFile};

    #[test]
    fn escapes_command_text() {
        assert_eq!(escape_text("if (g1 < 3 && g2 > 1)"), "if (g1 &lt; 3 &amp;&amp; g2 &gt; 1)");
        assert_eq!(escape_attr("a \"b\""), "a &quot;b&quot;");
    }

    #[test]
    fn renders_full_layout() {
        let mut disc = Disc::new();
        disc.set_jumppad(true);

        let mut vmgm = Vmgm::new(disc.handles());
        vmgm.add_audio_lang("en");
        vmgm.add_subpicture_lang("en");
        let mut top = Menu::new(disc.handles(), Some(Entry::Title));
        top.add_video_file(VideoFile::new("menu.mpg").with_pause("inf"));

        let mut ts = Titleset::new(disc.handles());
        ts.add_audio_lang("en");
        let mut root = Menu::new(disc.handles(), Some(Entry::Root));
        root.set_post_commands("jump vmgm menu 1;");
        ts.add_menu(root).unwrap();
        let mut feature = Title::new(disc.handles());
        feature.add_video_file(VideoFile::new("feature.mpg").with_chapters("0,5:00"));
        feature.add_cell(Cell::new("0").with_end("5:00").chapter().program()).unwrap();
        feature.set_post_commands("call menu entry root;");
        top.set_button_commands(format!("jump {};", feature.handle().full()), Some("play"));
        ts.add_title(feature);

        vmgm.add_menu(top).unwrap();
        disc.set_vmgm(vmgm).unwrap();
        disc.add_titleset(ts);

        let xml = render(&disc, Path::new("out")).unwrap();
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<dvdauthor dest=\"out\" jumppad=\"yes\">
  <vmgm>
    <menus>
      <audio lang=\"en\"/>
      <subpicture lang=\"en\"/>
      <pgc entry=\"title\">
        <vob file=\"menu.mpg\" pause=\"inf\"/>
        <button name=\"play\">jump titleset 1 title 1;</button>
      </pgc>
    </menus>
  </vmgm>
  <titleset>
    <menus>
      <audio lang=\"en\"/>
      <pgc entry=\"root\">
        <post>jump vmgm menu 1;</post>
      </pgc>
    </menus>
    <titles>
      <audio lang=\"en\"/>
      <pgc>
        <vob file=\"feature.mpg\" chapters=\"0,5:00\">
          <cell start=\"0\" end=\"5:00\" chapter=\"1\" program=\"1\"/>
        </vob>
        <post>call menu entry root;</post>
      </pgc>
    </titles>
  </titleset>
</dvdauthor>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn omits_empty_blocks() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        ts.add_title(Title::new(disc.handles()));
        disc.add_titleset(ts);

        let xml = render(&disc, Path::new("out")).unwrap();
        assert!(!xml.contains("<vmgm"));
        assert!(!xml.contains("<menus"));
        assert!(xml.contains("    <titles>\n      <pgc>\n      </pgc>\n    </titles>\n"));
    }

    #[test]
    fn menu_lang_goes_on_menus_element() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        ts.set_menu_lang("de");
        ts.add_menu(Menu::new(disc.handles(), None)).unwrap();
        disc.add_titleset(ts);

        let xml = render(&disc, Path::new("out")).unwrap();
        assert!(xml.contains("<menus lang=\"de\">"));
    }

    #[test]
    fn first_play_is_resolved() {
        let mut disc = Disc::new();
        let mut vmgm = Vmgm::new(disc.handles());
        let menu = Menu::new(disc.handles(), None);
        vmgm.set_first_play(format!("jump {};", menu.handle().full()));
        vmgm.add_menu(menu).unwrap();
        disc.set_vmgm(vmgm).unwrap();

        let xml = render(&disc, Path::new("out")).unwrap();
        assert!(xml.contains("<fpc>jump vmgm menu 1;</fpc>"));
    }

    #[test]
    fn titleset_without_domains_drops_its_languages() {
        let mut disc = Disc::new();
        let mut ts = Titleset::new(disc.handles());
        ts.add_audio_lang("fr");
        disc.add_titleset(ts);

        let xml = render(&disc, Path::new("out")).unwrap();
        assert!(xml.contains("  <titleset/>\n"));
        assert!(!xml.contains(r#"lang="fr""#));
    }
}
