/// Crate-level error types for disc construction, resolution, and authoring.
use std::path::PathBuf;

use crate::handle::Handle;
use crate::types::{ContainerKind, Entry, NodeKind};

/// A handle found in command text that has no address in the finished tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingHandle {
    /// The unresolved handle.
    pub handle: Handle,
    /// Kind of node the handle was issued for, `None` if this disc never issued it.
    pub kind: Option<NodeKind>,
    /// Location of the command that used the handle (e.g. `titleset 1 menu 2 button "play"`).
    pub referenced_from: String,
}

/// Every error names the node, handle, or file involved so a diagnostic can be
/// produced without re-running the build.
#[allow(clippy::error_impl_error, reason = "crate-wide error type")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spawning the external authoring program failed or it exited non-zero.
    #[error("authoring failed: `{program}` exited with {}", describe_exit(*status))]
    AuthoringFailed {
        /// Program that was run.
        program: String,
        /// Exit code, `None` when terminated by a signal.
        status: Option<i32>,
    },

    /// The external authoring program could not be found on `PATH`.
    #[error("authoring tool not found: `{program}`")]
    AuthoringToolNotFound {
        /// Program that was looked up.
        program: String,
    },

    /// Command text references handles that are not reachable from the disc root.
    #[error(
        "dangling reference: {}",
        handles.iter().map(|d| return format!("{} in {}", d.handle, d.referenced_from)).collect::<Vec<_>>().join(", ")
    )]
    DanglingReference {
        /// Every unresolved handle, in document order.
        handles: Vec<DanglingHandle>,
    },

    /// Two nodes in the tree carry the same handle.
    #[error("duplicate handle: {handle} is at both {first} and {second}")]
    DuplicateHandle {
        /// The shared handle.
        handle: Handle,
        /// Address of the first node found with it.
        first: String,
        /// Address of the second.
        second: String,
    },

    /// Two nodes in a project file share the same id.
    #[error("duplicate node id: `{id}`")]
    DuplicateNodeId {
        /// The repeated id.
        id: String,
    },

    /// A menu's entry tag is not accepted by the container it was added to.
    #[error("invalid entry point: `{entry}` is not allowed in a {container} menu")]
    InvalidEntryPoint {
        /// Container the menu was added to.
        container: ContainerKind,
        /// The rejected entry tag.
        entry: Entry,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Command text contains the handle delimiter without forming a valid handle.
    #[error("malformed reference in {referenced_from}: `{command}`")]
    MalformedReference {
        /// The offending command text.
        command: String,
        /// Location of the command.
        referenced_from: String,
    },

    /// The project file does not exist.
    #[error("project not found: {}", path.display())]
    ProjectNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A project file names an entry tag that does not exist.
    #[error("unknown entry tag: `{tag}`")]
    UnknownEntryTag {
        /// The unrecognised tag.
        tag: String,
    },

    /// A project placeholder names a node id that is not defined.
    #[error("unknown node id `{id}` in {referenced_from}")]
    UnknownNodeId {
        /// The undefined id.
        id: String,
        /// Id of the node whose command used the placeholder.
        referenced_from: String,
    },

    /// The operation is structurally impossible for this node.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Description of what was attempted.
        operation: &'static str,
    },

    /// `set_vmgm` was called on a disc that already has one.
    #[error("vmgm already set (use replace_vmgm to overwrite)")]
    VmgmAlreadySet,
}

/// Human wording for a child process exit code.
fn describe_exit(status: Option<i32>) -> String {
    return match status {
        None => "a signal".to_string(),
        Some(code) => format!("status {code}"),
    };
}
