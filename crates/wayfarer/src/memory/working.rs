//! Working memory: the ordered, role-tagged interaction history.
//!
//! Every operation returns a new [`WorkingMemory`]; entries are never
//! mutated in place. States receive a memory value and hand back a fresh one.

use std::ops::{Bound, RangeBounds};

use serde::{Deserialize, Serialize};

/// Role of a memory entry.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MemoryEntry {
    pub role: Role,
    pub content: String,
}

impl MemoryEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered history plus the identity of the agent it belongs to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WorkingMemory {
    agent_name: String,
    entries: Vec<MemoryEntry>,
}

impl WorkingMemory {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            entries: Vec::new(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MemoryEntry> {
        self.entries.last()
    }

    fn with_entries(&self, entries: Vec<MemoryEntry>) -> Self {
        Self {
            agent_name: self.agent_name.clone(),
            entries,
        }
    }

    /// New memory with `entries` added at the end.
    pub fn append(&self, entries: impl IntoIterator<Item = MemoryEntry>) -> Self {
        let mut next = self.entries.clone();
        next.extend(entries);
        self.with_entries(next)
    }

    /// Same as [`append`](Self::append); kept as the sequence-style name used
    /// when joining two histories.
    pub fn concat(&self, entries: impl IntoIterator<Item = MemoryEntry>) -> Self {
        self.append(entries)
    }

    /// Entries in `range`, clamped to the current length.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.entries.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        self.with_entries(self.entries[start..end].to_vec())
    }

    /// The last `n` entries (all of them when shorter).
    pub fn last_n(&self, n: usize) -> Self {
        self.slice(self.len().saturating_sub(n)..)
    }

    /// Everything but the most recent entry.
    pub fn without_last(&self) -> Self {
        self.slice(..self.len().saturating_sub(1))
    }

    /// Append an assistant-voiced thought.
    pub fn with_monologue(&self, text: impl Into<String>) -> Self {
        self.append([MemoryEntry::assistant(text)])
    }

    /// Append a user-voiced entry (perceptions from the environment).
    pub fn with_user(&self, text: impl Into<String>) -> Self {
        self.append([MemoryEntry::user(text)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(n: usize) -> WorkingMemory {
        WorkingMemory::new("Philip").append((0..n).map(|i| MemoryEntry::user(format!("m{i}"))))
    }

    #[test]
    fn operations_do_not_mutate_original() {
        let base = memory(3);
        let appended = base.with_monologue("thought");
        assert_eq!(base.len(), 3);
        assert_eq!(appended.len(), 4);
        assert_eq!(appended.last().unwrap().role, Role::Assistant);
        assert_eq!(appended.agent_name(), "Philip");
    }

    #[test]
    fn slice_clamps() {
        let m = memory(5);
        assert_eq!(m.slice(1..3).entries()[0].content, "m1");
        assert_eq!(m.slice(1..3).len(), 2);
        assert_eq!(m.slice(3..100).len(), 2);
        assert_eq!(m.slice(10..).len(), 0);
        assert_eq!(m.slice(..=1).len(), 2);
    }

    #[test]
    fn tail_and_without_last() {
        let m = memory(8);
        let tail = m.last_n(6);
        assert_eq!(tail.len(), 6);
        assert_eq!(tail.entries()[0].content, "m2");
        assert_eq!(memory(2).last_n(6).len(), 2);

        let trimmed = m.without_last();
        assert_eq!(trimmed.len(), 7);
        assert_eq!(trimmed.last().unwrap().content, "m6");
        assert!(WorkingMemory::new("x").without_last().is_empty());
    }

    #[test]
    fn concat_preserves_order() {
        let m = memory(1).concat([MemoryEntry::assistant("a"), MemoryEntry::system("s")]);
        let roles: Vec<Role> = m.entries().iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::System]);
    }
}
