//! Build `dvdauthor` documents whose navigation commands name nodes by handle.
//!
//! Nodes get a [`handle::Handle`] when they are created. Commands embed the
//! handle (`@@s.n@@`) or its full-address form (`f:@@s.n@@`); once the tree is
//! finished, [`writer::render`] resolves each to the node's position, e.g.
//! `1` or `titleset 2 title 1`, and fails if a referenced node is not in the
//! tree.
//!
//! ```
//! use std::path::Path;
//! use discref::model::{Disc, Menu, ProgramChain as _, Title, Titleset, Vmgm};
//! use discref::types::{Entry, VideoFile};
//!
//! let mut disc = Disc::new();
//! let mut feature = Title::new(disc.handles());
//! feature.add_video_file(VideoFile::new("feature.mpg"));
//! let mut top = Menu::new(disc.handles(), Some(Entry::Title));
//! top.set_button_commands(format!("jump {};", feature.handle().full()), None);
//!
//! let mut vmgm = Vmgm::new(disc.handles());
//! vmgm.add_menu(top)?;
//! disc.set_vmgm(vmgm)?;
//! let mut titleset = Titleset::new(disc.handles());
//! titleset.add_title(feature);
//! disc.add_titleset(titleset);
//!
//! let xml = discref::writer::render(&disc, Path::new("dvd"))?;
//! assert!(xml.contains("<button>jump titleset 1 title 1;</button>"));
//! # Ok::<(), discref::error::Error>(())
//! ```

pub mod author;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod model;
pub mod project;
pub mod resolver;
pub mod types;
pub mod writer;
