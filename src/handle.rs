//! Symbolic node handles and the per-disc allocator that issues them.
//!
//! A handle renders as `@@<session>.<n>@@` (bare form) or
//! `f:@@<session>.<n>@@` (full-address form) so it can be embedded in command
//! text before the node it names has a position in the tree. The session
//! number identifies the allocator, so handles from two discs never compare
//! equal.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::NodeKind;

/// Delimiter wrapped around a handle's number in command text.
pub const DELIMITER: &str = "@@";

/// Marker placed before a handle to request the full-address form.
pub const FULL_PREFIX: &str = "f:";

/// Separates the session number from the serial inside a token.
pub const SEPARATOR: char = '.';

/// Next session number. Zero is never issued.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Opaque token naming one node. Unique across every allocator in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    /// Session of the allocator that issued the handle.
    session: u64,
    /// Position in that allocator's issue order, starting at 1.
    serial: u64,
}

impl Handle {
    /// Rebuild a handle from the numbers embedded in its token.
    pub(crate) const fn from_parts(session: u64, serial: u64) -> Self {
        return Self { session, serial };
    }

    /// Position in the issuing allocator's order.
    pub const fn serial(self) -> u64 {
        return self.serial;
    }

    /// The full-address form, which resolves to e.g. `titleset 2 menu 1`.
    pub const fn full(self) -> FullHandle {
        return FullHandle(self);
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{DELIMITER}{}{SEPARATOR}{}{DELIMITER}", self.session, self.serial);
    }
}

/// Display adapter for the `f:`-prefixed form of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullHandle(Handle);

impl fmt::Display for FullHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{FULL_PREFIX}{}", self.0);
    }
}

/// Issues handles from a monotonic counter and remembers what each was issued for.
///
/// Serials are never reused and every allocator has its own session number,
/// so no two nodes can share a handle. The allocator is `!Sync`: one disc is
/// built on one thread.
#[derive(Debug)]
pub struct HandleAllocator {
    /// Kind of node for serial `n`, stored at index `n - 1`.
    issued: RefCell<Vec<NodeKind>>,
    /// Session number stamped on every handle this allocator issues.
    session: u64,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        return Self::new();
    }
}

impl HandleAllocator {
    /// An allocator with a fresh session that has issued nothing yet.
    pub fn new() -> Self {
        return Self {
            issued: RefCell::new(Vec::new()),
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Issue the next handle for a node of `kind`.
    pub fn allocate(&self, kind: NodeKind) -> Handle {
        let mut issued = self.issued.borrow_mut();
        issued.push(kind);
        let serial = u64::try_from(issued.len()).unwrap_or(u64::MAX);
        tracing::trace!(session = self.session, serial, %kind, "allocated handle");
        return Handle::from_parts(self.session, serial);
    }

    /// Number of handles issued so far.
    pub fn issued(&self) -> usize {
        return self.issued.borrow().len();
    }

    /// The kind of node `handle` was issued for, or `None` if this allocator never issued it.
    pub fn kind_of(&self, handle: Handle) -> Option<NodeKind> {
        if handle.session != self.session {
            return None;
        }
        let index = usize::try_from(handle.serial.checked_sub(1)?).ok()?;
        return self.issued.borrow().get(index).copied();
    }

    /// Session number stamped on this allocator's handles.
    pub(crate) const fn session(&self) -> u64 {
        return self.session;
    }
}
