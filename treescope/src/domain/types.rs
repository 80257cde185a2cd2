//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a commit id where
//! a node index is expected, and make function signatures more expressive.

use std::fmt;

/// Arena index of a node inside a [`HostTree`](crate::host::HostTree)
///
/// Only meaningful for the tree it was taken from. Never persisted across
/// commits; externally visible positions use uids instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

/// Commit sequence number
///
/// Incremented once per host commit callback, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CommitId(pub u64);

impl CommitId {
    #[must_use]
    pub fn next(self) -> Self {
        CommitId(self.0 + 1)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commit#{}", self.0)
    }
}

/// Renderer that delivered a commit
///
/// A host may run several renderers (one per root); the id is passed through
/// from the commit callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RendererId(pub u32);

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Renderer#{}", self.0)
    }
}

/// Key of an outstanding asynchronous request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req_{}", self.0)
    }
}

/// Wall-clock timestamp in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// Time elapsed from `earlier` to `self` (zero if `earlier` is later)
    #[must_use]
    pub fn since(self, earlier: Timestamp) -> Elapsed {
        Elapsed((self.0 - earlier.0).max(0.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0 / 1000.0)
    }
}

/// Elapsed time in milliseconds
///
/// Displays as `850ms`, `12.3s` or `2m 5s` depending on magnitude.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Elapsed(pub f64);

impl Elapsed {
    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 / 1000.0
    }
}

impl fmt::Display for Elapsed {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        if ms < 1000.0 {
            write!(f, "{ms:.0}ms")
        } else if ms < 60_000.0 {
            write!(f, "{:.1}s", self.as_seconds())
        } else {
            let total = self.as_seconds() as u64;
            write!(f, "{}m {}s", total / 60, total % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(5).to_string(), "Node#5");
    }

    #[test]
    fn test_commit_id_next() {
        let id = CommitId::default();
        assert_eq!(id.0, 0);
        assert_eq!(id.next(), CommitId(1));
        assert_eq!(CommitId(7).to_string(), "Commit#7");
    }

    #[test]
    fn test_request_id_display() {
        assert_eq!(RequestId(42).to_string(), "req_42");
    }

    #[test]
    fn test_timestamp_since() {
        let start = Timestamp(1_000.0);
        assert_eq!(Timestamp(3_500.0).since(start), Elapsed(2_500.0));
        assert_eq!(Timestamp(500.0).since(start), Elapsed(0.0));
    }

    #[test]
    fn test_elapsed_display() {
        assert_eq!(Elapsed(850.0).to_string(), "850ms");
        assert_eq!(Elapsed(12_340.0).to_string(), "12.3s");
        assert_eq!(Elapsed(125_000.0).to_string(), "2m 5s");
    }
}
