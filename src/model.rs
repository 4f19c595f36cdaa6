//! The disc tree: disc, video manager, titlesets, menus, and titles.
//!
//! Structural rules are checked when a node is attached, not when the
//! document is rendered. A node gets its handle when it is constructed and
//! its address only once the tree is resolved.

use crate::error::Error;
use crate::handle::{Handle, HandleAllocator};
use crate::types::{Button, Cell, ContainerKind, Entry, NodeKind, VideoFile};

/// Program chain contents shared by menus and titles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pgc {
    /// Pause at the end of the pgc, in seconds or `inf`.
    pub pause: Option<String>,
    /// Commands run after playback.
    pub post: Option<String>,
    /// Commands run before playback.
    pub pre: Option<String>,
    /// Video files in playback order.
    pub videos: Vec<VideoFile>,
}

impl Pgc {
    /// Cells across every video file, in playback order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        return self.videos.iter().flat_map(|v| return v.cells.iter());
    }
}

/// Mutators common to every node that renders as a `<pgc>`.
pub trait ProgramChain {
    /// The node's program chain.
    fn pgc(&self) -> &Pgc;

    /// Mutable access to the node's program chain.
    fn pgc_mut(&mut self) -> &mut Pgc;

    /// Append a video file.
    fn add_video_file(&mut self, video: VideoFile) {
        self.pgc_mut().videos.push(video);
    }

    /// Append a cell to the most recently added video file.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedOperation` if no video file has been added yet.
    fn add_cell(&mut self, cell: Cell) -> Result<(), Error> {
        let Some(video) = self.pgc_mut().videos.last_mut() else {
            return Err(Error::UnsupportedOperation {
                operation: "add a cell before any video file",
            });
        };
        video.cells.push(cell);
        return Ok(());
    }

    /// Replace the pre-commands.
    fn set_pre_commands(&mut self, commands: impl Into<String>) {
        self.pgc_mut().pre = Some(commands.into());
    }

    /// Replace the post-commands.
    fn set_post_commands(&mut self, commands: impl Into<String>) {
        self.pgc_mut().post = Some(commands.into());
    }

    /// Set the pause at the end of the pgc.
    fn set_pause(&mut self, pause: impl Into<String>) {
        self.pgc_mut().pause = Some(pause.into());
    }
}

// ── Title ─────────────────────────────────────────────────────────────

/// A playable title.
///
/// Not `Clone`: a copy would carry the same handle as its original.
///
/// ```compile_fail
/// # use discref::model::{Disc, Title};
/// let disc = Disc::new();
/// let title = Title::new(disc.handles());
/// let copy = title.clone();
/// ```
#[derive(Debug)]
pub struct Title {
    /// Handle issued at construction.
    handle: Handle,
    /// Label used in diagnostics; never rendered.
    name: Option<String>,
    /// Playback contents.
    pgc: Pgc,
}

impl Title {
    /// A new, empty title with a fresh handle.
    pub fn new(handles: &HandleAllocator) -> Self {
        return Self {
            handle: handles.allocate(NodeKind::Title),
            name: None,
            pgc: Pgc::default(),
        };
    }

    /// Attach a diagnostic label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        return self;
    }

    /// This title's handle.
    pub const fn handle(&self) -> Handle {
        return self.handle;
    }

    /// Diagnostic label, if set.
    pub fn name(&self) -> Option<&str> {
        return self.name.as_deref();
    }
}

impl ProgramChain for Title {
    fn pgc(&self) -> &Pgc {
        return &self.pgc;
    }

    fn pgc_mut(&mut self) -> &mut Pgc {
        return &mut self.pgc;
    }
}

// ── Menu ──────────────────────────────────────────────────────────────

/// A menu: a program chain with buttons and an optional entry tag.
#[derive(Debug)]
pub struct Menu {
    /// Buttons in insertion order.
    buttons: Vec<Button>,
    /// Entry tag, checked against the container on insertion.
    entry: Option<Entry>,
    /// Handle issued at construction.
    handle: Handle,
    /// Label used in diagnostics; never rendered.
    name: Option<String>,
    /// Playback contents.
    pgc: Pgc,
}

impl Menu {
    /// A new, empty menu with a fresh handle.
    pub fn new(handles: &HandleAllocator, entry: Option<Entry>) -> Self {
        return Self {
            buttons: Vec::new(),
            entry,
            handle: handles.allocate(NodeKind::Menu),
            name: None,
            pgc: Pgc::default(),
        };
    }

    /// Attach a diagnostic label.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        return self;
    }

    /// Buttons in insertion order.
    pub fn buttons(&self) -> &[Button] {
        return &self.buttons;
    }

    /// Entry tag, if any.
    pub const fn entry(&self) -> Option<Entry> {
        return self.entry;
    }

    /// This menu's handle.
    pub const fn handle(&self) -> Handle {
        return self.handle;
    }

    /// Diagnostic label, if set.
    pub fn name(&self) -> Option<&str> {
        return self.name.as_deref();
    }

    /// Add or update a button.
    ///
    /// Without a name a new button is always appended. With a name, the first
    /// button carrying that name gets the new command; if none does, a named
    /// button is appended.
    pub fn set_button_commands(&mut self, command: impl Into<String>, name: Option<&str>) {
        let command = command.into();
        if let Some(name) = name
            && let Some(existing) = self.buttons.iter_mut().find(|b| return b.name.as_deref() == Some(name))
        {
            existing.command = command;
            return;
        }
        self.buttons.push(Button {
            command,
            name: name.map(str::to_string),
        });
    }
}

impl ProgramChain for Menu {
    fn pgc(&self) -> &Pgc {
        return &self.pgc;
    }

    fn pgc_mut(&mut self) -> &mut Pgc {
        return &mut self.pgc;
    }
}

/// Reject a menu whose entry tag the container does not accept.
///
/// # Errors
///
/// Returns `Error::InvalidEntryPoint` naming the container and tag.
fn check_entry_point(container: ContainerKind, menu: &Menu) -> Result<(), Error> {
    return match menu.entry {
        Some(entry) if !container.accepts(Some(entry)) => Err(Error::InvalidEntryPoint { container, entry }),
        _ => Ok(()),
    };
}

/// Remove the node with `handle` from `nodes`, preserving the order of the rest.
fn remove_by_handle<T>(nodes: &mut Vec<T>, handle: Handle, handle_of: impl Fn(&T) -> Handle) -> Option<T> {
    let index = nodes.iter().position(|n| return handle_of(n) == handle)?;
    return Some(nodes.remove(index));
}

// ── Titleset ──────────────────────────────────────────────────────────

/// A titleset: its own menu domain plus the titles it plays.
#[derive(Debug)]
pub struct Titleset {
    /// Audio language codes, declared in both the menu and title domains.
    audio_langs: Vec<String>,
    /// Handle issued at construction.
    handle: Handle,
    /// Language of the menu domain.
    menu_lang: Option<String>,
    /// Menus in insertion order.
    menus: Vec<Menu>,
    /// Titles in insertion order.
    titles: Vec<Title>,
}

impl Titleset {
    /// A new, empty titleset with a fresh handle.
    pub fn new(handles: &HandleAllocator) -> Self {
        return Self {
            audio_langs: Vec::new(),
            handle: handles.allocate(NodeKind::Titleset),
            menu_lang: None,
            menus: Vec::new(),
            titles: Vec::new(),
        };
    }

    /// Declare an audio stream language.
    pub fn add_audio_lang(&mut self, lang: impl Into<String>) {
        self.audio_langs.push(lang.into());
    }

    /// Append a menu.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEntryPoint` unless the menu's entry is one of
    /// `root`, `subtitle`, `audio`, `angle`, `ptt`, or absent.
    pub fn add_menu(&mut self, menu: Menu) -> Result<(), Error> {
        check_entry_point(ContainerKind::Titleset, &menu)?;
        self.menus.push(menu);
        return Ok(());
    }

    /// Append a title.
    pub fn add_title(&mut self, title: Title) {
        self.titles.push(title);
    }

    /// Audio language codes.
    pub fn audio_langs(&self) -> &[String] {
        return &self.audio_langs;
    }

    /// This titleset's handle.
    pub const fn handle(&self) -> Handle {
        return self.handle;
    }

    /// Menu domain language, if set.
    pub fn menu_lang(&self) -> Option<&str> {
        return self.menu_lang.as_deref();
    }

    /// Menus in order.
    pub fn menus(&self) -> &[Menu] {
        return &self.menus;
    }

    /// Detach a menu. References to it become dangling.
    pub fn remove_menu(&mut self, handle: Handle) -> Option<Menu> {
        return remove_by_handle(&mut self.menus, handle, Menu::handle);
    }

    /// Detach a title. References to it become dangling.
    pub fn remove_title(&mut self, handle: Handle) -> Option<Title> {
        return remove_by_handle(&mut self.titles, handle, Title::handle);
    }

    /// Set the menu domain language.
    pub fn set_menu_lang(&mut self, lang: impl Into<String>) {
        self.menu_lang = Some(lang.into());
    }

    /// Titles in order.
    pub fn titles(&self) -> &[Title] {
        return &self.titles;
    }
}

// ── Vmgm ──────────────────────────────────────────────────────────────

/// The video manager: the disc's top-level menu domain. Holds menus only.
#[derive(Debug)]
pub struct Vmgm {
    /// Audio language codes.
    audio_langs: Vec<String>,
    /// First-play commands.
    first_play: Option<String>,
    /// Handle issued at construction.
    handle: Handle,
    /// Language of the menu domain.
    menu_lang: Option<String>,
    /// Menus in insertion order.
    menus: Vec<Menu>,
    /// Subpicture language codes.
    subpicture_langs: Vec<String>,
}

impl Vmgm {
    /// A new, empty video manager with a fresh handle.
    pub fn new(handles: &HandleAllocator) -> Self {
        return Self {
            audio_langs: Vec::new(),
            first_play: None,
            handle: handles.allocate(NodeKind::Vmgm),
            menu_lang: None,
            menus: Vec::new(),
            subpicture_langs: Vec::new(),
        };
    }

    /// Declare an audio stream language.
    pub fn add_audio_lang(&mut self, lang: impl Into<String>) {
        self.audio_langs.push(lang.into());
    }

    /// Append a menu.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEntryPoint` unless the menu's entry is `title` or absent.
    pub fn add_menu(&mut self, menu: Menu) -> Result<(), Error> {
        check_entry_point(ContainerKind::Vmgm, &menu)?;
        self.menus.push(menu);
        return Ok(());
    }

    /// Declare a subpicture stream language.
    pub fn add_subpicture_lang(&mut self, lang: impl Into<String>) {
        self.subpicture_langs.push(lang.into());
    }

    /// The video manager cannot hold titles.
    ///
    /// # Errors
    ///
    /// Always returns `Error::UnsupportedOperation`.
    #[allow(clippy::unused_self, clippy::needless_pass_by_value, reason = "mirrors Titleset::add_title")]
    pub fn add_title(&mut self, title: Title) -> Result<(), Error> {
        tracing::debug!(handle = %title.handle(), "rejected title on vmgm");
        return Err(Error::UnsupportedOperation {
            operation: "add a title to the vmgm",
        });
    }

    /// Audio language codes.
    pub fn audio_langs(&self) -> &[String] {
        return &self.audio_langs;
    }

    /// First-play commands, if set.
    pub fn first_play(&self) -> Option<&str> {
        return self.first_play.as_deref();
    }

    /// This video manager's handle.
    pub const fn handle(&self) -> Handle {
        return self.handle;
    }

    /// Menu domain language, if set.
    pub fn menu_lang(&self) -> Option<&str> {
        return self.menu_lang.as_deref();
    }

    /// Menus in order.
    pub fn menus(&self) -> &[Menu] {
        return &self.menus;
    }

    /// Detach a menu. References to it become dangling.
    pub fn remove_menu(&mut self, handle: Handle) -> Option<Menu> {
        return remove_by_handle(&mut self.menus, handle, Menu::handle);
    }

    /// Set the commands run when the disc is inserted.
    pub fn set_first_play(&mut self, commands: impl Into<String>) {
        self.first_play = Some(commands.into());
    }

    /// Set the menu domain language.
    pub fn set_menu_lang(&mut self, lang: impl Into<String>) {
        self.menu_lang = Some(lang.into());
    }

    /// Subpicture language codes.
    pub fn subpicture_langs(&self) -> &[String] {
        return &self.subpicture_langs;
    }
}

// ── Disc ──────────────────────────────────────────────────────────────

/// Root of the tree. Owns the allocator every node of this disc draws its handle from.
#[derive(Debug, Default)]
pub struct Disc {
    /// Handle source for this disc's nodes.
    handles: HandleAllocator,
    /// Render `jumppad="yes"` on the root element.
    jumppad: bool,
    /// Titlesets in insertion order.
    titlesets: Vec<Titleset>,
    /// The video manager, if set.
    vmgm: Option<Vmgm>,
}

impl Disc {
    /// An empty disc with a fresh allocator.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Append a titleset.
    pub fn add_titleset(&mut self, titleset: Titleset) {
        self.titlesets.push(titleset);
    }

    /// The allocator nodes for this disc must be created from.
    pub const fn handles(&self) -> &HandleAllocator {
        return &self.handles;
    }

    /// Whether the root element carries `jumppad="yes"`.
    pub const fn jumppad(&self) -> bool {
        return self.jumppad;
    }

    /// Detach a titleset. References to it and to everything inside it become dangling.
    pub fn remove_titleset(&mut self, handle: Handle) -> Option<Titleset> {
        return remove_by_handle(&mut self.titlesets, handle, Titleset::handle);
    }

    /// Overwrite the video manager, returning the previous one.
    pub fn replace_vmgm(&mut self, vmgm: Vmgm) -> Option<Vmgm> {
        return self.vmgm.replace(vmgm);
    }

    /// Enable or disable the jump pad.
    pub fn set_jumppad(&mut self, jumppad: bool) {
        self.jumppad = jumppad;
    }

    /// Set the video manager.
    ///
    /// # Errors
    ///
    /// Returns `Error::VmgmAlreadySet` if one is already present; use
    /// [`Disc::replace_vmgm`] to overwrite.
    pub fn set_vmgm(&mut self, vmgm: Vmgm) -> Result<(), Error> {
        if self.vmgm.is_some() {
            return Err(Error::VmgmAlreadySet);
        }
        self.vmgm = Some(vmgm);
        return Ok(());
    }

    /// Detach the video manager. References to its menus become dangling.
    pub fn take_vmgm(&mut self) -> Option<Vmgm> {
        return self.vmgm.take();
    }

    /// Titlesets in order.
    pub fn titlesets(&self) -> &[Titleset] {
        return &self.titlesets;
    }

    /// The video manager, if set.
    pub const fn vmgm(&self) -> Option<&Vmgm> {
        return self.vmgm.as_ref();
    }
}
