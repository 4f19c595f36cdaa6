//! Declarative disc projects: a TOML description turned into a [`Disc`].
//!
//! Commands refer to other nodes by id: `{feature}` becomes the bare handle
//! of the node with id `feature`, `{f:feature}` its full-address handle.
//!
//! ```toml
//! [[vmgm.menus]]
//! id = "top"
//! entry = "title"
//! videos = [{ file = "menu.mpg", pause = "inf" }]
//! buttons = [{ name = "play", command = "jump {f:feature};" }]
//!
//! [[titlesets]]
//! [[titlesets.titles]]
//! id = "feature"
//! videos = [{ file = "feature.mpg" }]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::Error;
use crate::handle::Handle;
use crate::model::{Disc, Menu, ProgramChain, Title, Titleset, Vmgm};
use crate::types::{Cell, Entry, VideoFile};

/// `{id}` or `{f:id}`. Ids have no spaces, so `{ jump ... }` blocks never match.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\{(f:)?([A-Za-z0-9_.-]+)\}").expect("valid regex"));

/// Top level of a project file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
    /// Render `jumppad="yes"`.
    #[serde(default)]
    jumppad: bool,
    /// Titlesets in order.
    #[serde(default)]
    titlesets: Vec<TitlesetSpec>,
    /// The video manager, if any.
    vmgm: Option<VmgmSpec>,
}

/// `[vmgm]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VmgmSpec {
    /// Audio languages.
    #[serde(default)]
    audio: Vec<String>,
    /// First-play commands.
    fpc: Option<String>,
    /// Menu domain language.
    menu_lang: Option<String>,
    /// Menus in order.
    #[serde(default)]
    menus: Vec<MenuSpec>,
    /// Subpicture languages.
    #[serde(default)]
    subpicture: Vec<String>,
}

/// `[[titlesets]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TitlesetSpec {
    /// Audio languages.
    #[serde(default)]
    audio: Vec<String>,
    /// Optional id so commands can name the titleset.
    id: Option<String>,
    /// Menu domain language.
    menu_lang: Option<String>,
    /// Menus in order.
    #[serde(default)]
    menus: Vec<MenuSpec>,
    /// Titles in order.
    #[serde(default)]
    titles: Vec<TitleSpec>,
}

/// A menu under `[vmgm]` or `[[titlesets]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MenuSpec {
    /// Buttons in order; named buttons follow the first-match update rule.
    #[serde(default)]
    buttons: Vec<ButtonSpec>,
    /// Entry tag.
    entry: Option<String>,
    /// Optional id so commands can name the menu.
    id: Option<String>,
    /// Diagnostic label.
    name: Option<String>,
    /// Pgc pause.
    pause: Option<String>,
    /// Post-commands.
    post: Option<String>,
    /// Pre-commands.
    pre: Option<String>,
    /// Video files in order.
    #[serde(default)]
    videos: Vec<VideoSpec>,
}

/// A title under `[[titlesets]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TitleSpec {
    /// Optional id so commands can name the title.
    id: Option<String>,
    /// Diagnostic label.
    name: Option<String>,
    /// Pgc pause.
    pause: Option<String>,
    /// Post-commands.
    post: Option<String>,
    /// Pre-commands.
    pre: Option<String>,
    /// Video files in order.
    #[serde(default)]
    videos: Vec<VideoSpec>,
}

/// `[[...videos]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VideoSpec {
    /// Cells in order.
    #[serde(default)]
    cells: Vec<CellSpec>,
    /// Chapter list.
    chapters: Option<String>,
    /// MPEG file path.
    file: PathBuf,
    /// Pause after playback.
    pause: Option<String>,
}

/// `[[...cells]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CellSpec {
    /// Chapter point.
    #[serde(default)]
    chapter: bool,
    /// End timestamp.
    end: Option<String>,
    /// Pause after the cell.
    pause: Option<String>,
    /// Program point.
    #[serde(default)]
    program: bool,
    /// Start timestamp.
    start: String,
}

/// `[[...buttons]]`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ButtonSpec {
    /// Command text with placeholders.
    command: String,
    /// Button name.
    name: Option<String>,
}

/// A loaded project: the disc plus the handle behind every id.
#[derive(Debug)]
pub struct Project {
    /// The assembled disc.
    pub disc: Disc,
    /// Handle of every node that declared an id.
    pub ids: BTreeMap<String, Handle>,
}

/// Read and assemble a project file.
///
/// # Errors
///
/// Returns `Error::ProjectNotFound` if the file doesn't exist, `Error::Io`
/// for other read failures, or anything [`parse`] returns.
pub fn load(path: &Path) -> Result<Project, Error> {
    let content = match std::fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ProjectNotFound { path: path.to_path_buf() });
        },
        Err(e) => return Err(Error::Io(e)),
        Ok(c) => c,
    };
    let project = parse(&content)?;
    tracing::debug!(path = %path.display(), ids = project.ids.len(), "loaded project");
    return Ok(project);
}

/// Assemble a project from TOML content.
///
/// Every node is created first so that commands can name nodes declared
/// later in the file; commands are filled in and nodes attached afterwards.
///
/// # Errors
///
/// Returns `Error::TomlDe` for malformed TOML, `Error::DuplicateNodeId`,
/// `Error::UnknownNodeId`, `Error::UnknownEntryTag`, or the structural errors
/// raised while attaching menus.
pub fn parse(content: &str) -> Result<Project, Error> {
    let file: ProjectFile = toml::from_str(content)?;
    let mut disc = Disc::new();
    disc.set_jumppad(file.jumppad);
    let mut ids = BTreeMap::new();

    // Pass 1: create every node and register its id.
    let vmgm = match &file.vmgm {
        None => None,
        Some(spec) => {
            let vmgm = Vmgm::new(disc.handles());
            let menus = create_menus(&disc, &spec.menus, &mut ids)?;
            Some((vmgm, menus))
        },
    };
    let mut titlesets = Vec::with_capacity(file.titlesets.len());
    for spec in &file.titlesets {
        let titleset = Titleset::new(disc.handles());
        register(&mut ids, spec.id.as_deref(), titleset.handle())?;
        let menus = create_menus(&disc, &spec.menus, &mut ids)?;
        let mut titles = Vec::with_capacity(spec.titles.len());
        for title_spec in &spec.titles {
            let mut title = Title::new(disc.handles());
            if let Some(name) = &title_spec.name {
                title = title.with_name(name);
            }
            register(&mut ids, title_spec.id.as_deref(), title.handle())?;
            titles.push(title);
        }
        titlesets.push((titleset, menus, titles));
    }

    // Pass 2: fill in contents and attach.
    if let (Some(spec), Some((mut vmgm, menus))) = (&file.vmgm, vmgm) {
        for lang in &spec.audio {
            vmgm.add_audio_lang(lang);
        }
        for lang in &spec.subpicture {
            vmgm.add_subpicture_lang(lang);
        }
        if let Some(lang) = &spec.menu_lang {
            vmgm.set_menu_lang(lang);
        }
        if let Some(fpc) = &spec.fpc {
            vmgm.set_first_play(translate(fpc, &ids, "vmgm fpc")?);
        }
        for ((j, menu_spec), mut menu) in (1_usize..).zip(&spec.menus).zip(menus) {
            let location = location_of(menu_spec.id.as_deref(), || return format!("vmgm menu {j}"));
            fill_menu(&mut menu, menu_spec, &ids, &location)?;
            vmgm.add_menu(menu)?;
        }
        disc.set_vmgm(vmgm)?;
    }

    for ((i, spec), (mut titleset, menus, titles)) in (1_usize..).zip(&file.titlesets).zip(titlesets) {
        for lang in &spec.audio {
            titleset.add_audio_lang(lang);
        }
        if let Some(lang) = &spec.menu_lang {
            titleset.set_menu_lang(lang);
        }
        for ((j, menu_spec), mut menu) in (1_usize..).zip(&spec.menus).zip(menus) {
            let location = location_of(menu_spec.id.as_deref(), || return format!("titleset {i} menu {j}"));
            fill_menu(&mut menu, menu_spec, &ids, &location)?;
            titleset.add_menu(menu)?;
        }
        for ((k, title_spec), mut title) in (1_usize..).zip(&spec.titles).zip(titles) {
            let location = location_of(title_spec.id.as_deref(), || return format!("titleset {i} title {k}"));
            let pgc = PgcFields {
                pause: title_spec.pause.as_deref(),
                post: title_spec.post.as_deref(),
                pre: title_spec.pre.as_deref(),
                videos: &title_spec.videos,
            };
            fill_pgc(&mut title, &pgc, &ids, &location)?;
            titleset.add_title(title);
        }
        disc.add_titleset(titleset);
    }

    return Ok(Project { disc, ids });
}

/// Create the menus of one domain and register their ids.
///
/// # Errors
///
/// Returns `Error::UnknownEntryTag` or `Error::DuplicateNodeId`.
fn create_menus(disc: &Disc, specs: &[MenuSpec], ids: &mut BTreeMap<String, Handle>) -> Result<Vec<Menu>, Error> {
    let mut menus = Vec::with_capacity(specs.len());
    for spec in specs {
        let entry = spec.entry.as_deref().map(Entry::parse).transpose()?;
        let mut menu = Menu::new(disc.handles(), entry);
        if let Some(name) = &spec.name {
            menu = menu.with_name(name);
        }
        register(ids, spec.id.as_deref(), menu.handle())?;
        menus.push(menu);
    }
    return Ok(menus);
}

/// Record `id → handle`.
///
/// # Errors
///
/// Returns `Error::DuplicateNodeId` if the id is taken.
fn register(ids: &mut BTreeMap<String, Handle>, id: Option<&str>, handle: Handle) -> Result<(), Error> {
    let Some(id) = id else {
        return Ok(());
    };
    if ids.insert(id.to_string(), handle).is_some() {
        return Err(Error::DuplicateNodeId { id: id.to_string() });
    }
    return Ok(());
}

/// Describe a node for error messages: its id if it has one, else its position.
fn location_of(id: Option<&str>, position: impl FnOnce() -> String) -> String {
    return id.map_or_else(position, str::to_string);
}

/// The pgc fields menus and titles share.
struct PgcFields<'a> {
    /// Pgc pause.
    pause: Option<&'a str>,
    /// Post-commands.
    post: Option<&'a str>,
    /// Pre-commands.
    pre: Option<&'a str>,
    /// Video files.
    videos: &'a [VideoSpec],
}

/// Fill a menu's pgc and buttons.
///
/// # Errors
///
/// Returns `Error::UnknownNodeId` for an undefined placeholder.
fn fill_menu(menu: &mut Menu, spec: &MenuSpec, ids: &BTreeMap<String, Handle>, location: &str) -> Result<(), Error> {
    let pgc = PgcFields {
        pause: spec.pause.as_deref(),
        post: spec.post.as_deref(),
        pre: spec.pre.as_deref(),
        videos: &spec.videos,
    };
    fill_pgc(menu, &pgc, ids, location)?;
    for button in &spec.buttons {
        let command = translate(&button.command, ids, location)?;
        menu.set_button_commands(command, button.name.as_deref());
    }
    return Ok(());
}

/// Fill the shared pgc fields.
///
/// # Errors
///
/// Returns `Error::UnknownNodeId` for an undefined placeholder.
fn fill_pgc(
    node: &mut impl ProgramChain,
    spec: &PgcFields<'_>,
    ids: &BTreeMap<String, Handle>,
    location: &str,
) -> Result<(), Error> {
    if let Some(pre) = spec.pre {
        node.set_pre_commands(translate(pre, ids, location)?);
    }
    if let Some(post) = spec.post {
        node.set_post_commands(translate(post, ids, location)?);
    }
    if let Some(pause) = spec.pause {
        node.set_pause(pause);
    }
    node.pgc_mut().videos.extend(spec.videos.iter().map(video_from_spec));
    return Ok(());
}

/// Build a video file with its cells.
fn video_from_spec(spec: &VideoSpec) -> VideoFile {
    return VideoFile {
        cells: spec.cells.iter().map(cell_from_spec).collect(),
        chapters: spec.chapters.clone(),
        file: spec.file.clone(),
        pause: spec.pause.clone(),
    };
}

/// Build one cell.
fn cell_from_spec(spec: &CellSpec) -> Cell {
    return Cell {
        chapter: spec.chapter,
        end: spec.end.clone(),
        pause: spec.pause.clone(),
        program: spec.program,
        start: spec.start.clone(),
    };
}

/// Replace `{id}` / `{f:id}` placeholders with handle tokens.
///
/// # Errors
///
/// Returns `Error::UnknownNodeId` for the first undefined id.
fn translate(command: &str, ids: &BTreeMap<String, Handle>, location: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(command.len());
    let mut last = 0_usize;
    for caps in PLACEHOLDER.captures_iter(command) {
        let (Some(whole), Some(id)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let Some(handle) = ids.get(id.as_str()) else {
            return Err(Error::UnknownNodeId {
                id: id.as_str().to_string(),
                referenced_from: location.to_string(),
            });
        };
        out.push_str(command.get(last..whole.start()).unwrap_or_default());
        if caps.get(1).is_some() {
            out.push_str(&handle.full().to_string());
        } else {
            out.push_str(&handle.to_string());
        }
        last = whole.end();
    }
    out.push_str(command.get(last..).unwrap_or_default());
    return Ok(out);
}
