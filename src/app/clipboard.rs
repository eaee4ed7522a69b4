//! Single-slot clipboard holding a copy or cut snapshot.

use crate::core::fm::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    Copy,
    Cut,
}

/// Entries captured at copy/cut time. They are not re-resolved at paste time.
#[derive(Debug, Clone)]
pub struct Clipboard {
    op: ClipOp,
    entries: Vec<Entry>,
}

impl Clipboard {
    pub fn new(op: ClipOp, entries: Vec<Entry>) -> Self {
        Self { op, entries }
    }

    #[inline]
    pub fn op(&self) -> ClipOp {
        self.op
    }

    #[inline]
    pub fn is_cut(&self) -> bool {
        self.op == ClipOp::Cut
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}
