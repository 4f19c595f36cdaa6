/// Core value types shared by the node model, resolver, and writer.
use std::fmt;
use std::path::PathBuf;

use crate::error::Error;

/// Entry-point tag on a menu pgc. Which tags are legal depends on the
/// container the menu is added to; see [`ContainerKind::accepts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    /// Angle menu (titleset only).
    Angle,
    /// Audio menu (titleset only).
    Audio,
    /// Chapter (part-of-title) menu (titleset only).
    Ptt,
    /// Root menu (titleset only).
    Root,
    /// Subtitle menu (titleset only).
    Subtitle,
    /// Title menu (vmgm only).
    Title,
}

impl Entry {
    /// The tag as written in the `entry` attribute.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Entry::Angle => "angle",
            Entry::Audio => "audio",
            Entry::Ptt => "ptt",
            Entry::Root => "root",
            Entry::Subtitle => "subtitle",
            Entry::Title => "title",
        };
    }

    /// Parse an `entry` attribute value.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownEntryTag` for anything outside the six known tags.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        return match tag {
            "angle" => Ok(Entry::Angle),
            "audio" => Ok(Entry::Audio),
            "ptt" => Ok(Entry::Ptt),
            "root" => Ok(Entry::Root),
            "subtitle" => Ok(Entry::Subtitle),
            "title" => Ok(Entry::Title),
            _ => Err(Error::UnknownEntryTag { tag: tag.to_string() }),
        };
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.as_str());
    }
}

/// The two kinds of menu domain a [`crate::model::Menu`] can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A titleset's menu domain.
    Titleset,
    /// The video manager (top-level) menu domain.
    Vmgm,
}

impl ContainerKind {
    /// Entry tags a menu in this domain may carry. A menu with no tag is always accepted.
    pub const fn allowed_entries(self) -> &'static [Entry] {
        return match self {
            ContainerKind::Titleset => &[Entry::Root, Entry::Subtitle, Entry::Audio, Entry::Angle, Entry::Ptt],
            ContainerKind::Vmgm => &[Entry::Title],
        };
    }

    /// Whether a menu with the given entry tag may be added to this domain.
    pub fn accepts(self, entry: Option<Entry>) -> bool {
        return entry.is_none_or(|e| return self.allowed_entries().contains(&e));
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(match self {
            ContainerKind::Titleset => "titleset",
            ContainerKind::Vmgm => "vmgm",
        });
    }
}

/// What a handle was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A menu pgc.
    Menu,
    /// A title pgc.
    Title,
    /// A titleset.
    Titleset,
    /// The video manager.
    Vmgm,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(match self {
            NodeKind::Menu => "menu",
            NodeKind::Title => "title",
            NodeKind::Titleset => "titleset",
            NodeKind::Vmgm => "vmgm",
        });
    }
}

/// A reference to an encoded video file, rendered as `<vob>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    /// Cells carved out of this file, rendered as nested `<cell>` elements.
    pub cells: Vec<Cell>,
    /// Comma-separated chapter timestamps.
    pub chapters: Option<String>,
    /// Path to the MPEG program stream.
    pub file: PathBuf,
    /// Pause after playback, in seconds or `inf`.
    pub pause: Option<String>,
}

impl VideoFile {
    /// A video file with no chapters, pause, or cells.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        return Self {
            cells: Vec::new(),
            chapters: None,
            file: file.into(),
            pause: None,
        };
    }

    /// Set the chapter list.
    #[must_use]
    pub fn with_chapters(mut self, chapters: impl Into<String>) -> Self {
        self.chapters = Some(chapters.into());
        return self;
    }

    /// Set the pause after playback.
    #[must_use]
    pub fn with_pause(mut self, pause: impl Into<String>) -> Self {
        self.pause = Some(pause.into());
        return self;
    }
}

/// A cell within a video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Marks the cell as a chapter point.
    pub chapter: bool,
    /// End timestamp; `None` runs to the next cell or end of file.
    pub end: Option<String>,
    /// Pause after the cell, in seconds or `inf`.
    pub pause: Option<String>,
    /// Marks the cell as a program point.
    pub program: bool,
    /// Start timestamp.
    pub start: String,
}

impl Cell {
    /// A plain cell starting at `start`.
    pub fn new(start: impl Into<String>) -> Self {
        return Self {
            chapter: false,
            end: None,
            pause: None,
            program: false,
            start: start.into(),
        };
    }

    /// Set the end timestamp.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        return self;
    }

    /// Set the pause after the cell.
    #[must_use]
    pub fn with_pause(mut self, pause: impl Into<String>) -> Self {
        self.pause = Some(pause.into());
        return self;
    }

    /// Mark as chapter point.
    #[must_use]
    pub const fn chapter(mut self) -> Self {
        self.chapter = true;
        return self;
    }

    /// Mark as program point.
    #[must_use]
    pub const fn program(mut self) -> Self {
        self.program = true;
        return self;
    }
}

/// A menu button: optional name plus the command run when it is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Command text, possibly embedding handles.
    pub command: String,
    /// Button name matching the subpicture highlight, if any.
    pub name: Option<String>,
}
