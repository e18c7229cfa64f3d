//! Declarations remembered across cells.
//!
//! The store maps each [`DeclKind`] to its declarations by name. Cells only
//! change it through a [`StoreTransaction`], which snapshots every entry it
//! touches. An uncommitted transaction restores those snapshots when dropped,
//! so a cell whose compilation fails (or that is interrupted, or whose future
//! is dropped) leaves the store exactly as it found it.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::classify::{DeclKind, Declaration};

/// A stored declaration with its definition sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    source: String,
    seq: u64,
}

/// Per-kind, per-name declaration store.
#[derive(Debug, Default)]
pub struct DeclarationStore {
    kinds: FxHashMap<DeclKind, FxHashMap<String, Entry>>,
    next_seq: u64,
}

impl DeclarationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declarations of all kinds.
    pub fn len(&self) -> usize {
        self.kinds.values().map(|names| names.len()).sum()
    }

    /// Whether nothing has been declared yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source of a declaration, if present.
    pub fn get(&self, kind: DeclKind, name: &str) -> Option<&str> {
        self.kinds
            .get(&kind)
            .and_then(|names| names.get(name))
            .map(|entry| entry.source.as_str())
    }

    /// Names of one kind, sorted.
    pub fn names(&self, kind: DeclKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .kinds
            .get(&kind)
            .map(|names| names.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Sources of one kind in definition order.
    pub fn sources(&self, kind: DeclKind) -> Vec<&str> {
        let Some(names) = self.kinds.get(&kind) else {
            return Vec::new();
        };
        let mut entries: Vec<&Entry> = names.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.source.as_str()).collect()
    }

    /// Apply a cell's declarations. The returned transaction must be
    /// committed, or every change is undone when it is dropped.
    pub fn apply(&mut self, declarations: &[Declaration]) -> StoreTransaction<'_> {
        let mut tx = StoreTransaction {
            store: self,
            snapshots: Vec::new(),
            added: BTreeMap::new(),
            committed: false,
        };
        for decl in declarations {
            tx.insert(decl);
        }
        tx
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.kinds.clear();
    }

    fn put(&mut self, kind: DeclKind, name: &str, source: &str) -> Option<Entry> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.kinds.entry(kind).or_default().insert(
            name.to_string(),
            Entry {
                source: source.to_string(),
                seq,
            },
        )
    }

    fn restore(&mut self, kind: DeclKind, name: String, previous: Option<Entry>) {
        let names = self.kinds.entry(kind).or_default();
        match previous {
            Some(entry) => {
                names.insert(name, entry);
            }
            None => {
                names.remove(&name);
            }
        }
    }
}

/// Pending changes made by one cell.
///
/// Holds the previous value of every `(kind, name)` it wrote, and the names it
/// newly introduced per kind.
pub struct StoreTransaction<'a> {
    store: &'a mut DeclarationStore,
    snapshots: Vec<(DeclKind, String, Option<Entry>)>,
    added: BTreeMap<DeclKind, Vec<String>>,
    committed: bool,
}

impl StoreTransaction<'_> {
    fn insert(&mut self, decl: &Declaration) {
        if self.store.get(decl.kind, &decl.name) == Some(decl.source.as_str()) {
            return;
        }

        let previous = self.store.put(decl.kind, &decl.name, &decl.source);
        let already_snapshotted = self
            .snapshots
            .iter()
            .any(|(kind, name, _)| *kind == decl.kind && *name == decl.name);

        if !already_snapshotted {
            if previous.is_none() {
                self.added
                    .entry(decl.kind)
                    .or_default()
                    .push(decl.name.clone());
            }
            self.snapshots.push((decl.kind, decl.name.clone(), previous));
        }
    }

    /// The store as modified by this transaction.
    pub fn store(&self) -> &DeclarationStore {
        &*self.store
    }

    /// Names this cell introduced, per kind. Replaced names are not listed.
    pub fn added(&self) -> &BTreeMap<DeclKind, Vec<String>> {
        &self.added
    }

    /// Number of entries written (added or replaced).
    pub fn changes(&self) -> usize {
        self.snapshots.len()
    }

    /// Keep the changes.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Undo the changes now. Equivalent to dropping the transaction.
    pub fn rollback(self) {}
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if self.committed || self.snapshots.is_empty() {
            return;
        }
        tracing::debug!(entries = self.snapshots.len(), "rolling back declarations");
        for (kind, name, previous) in self.snapshots.drain(..).rev() {
            self.store.restore(kind, name, previous);
        }
    }
}
