//! Undo/redo history with speculative snapshots.

use sculpt_config::HistoryConfig;
use tracing::{debug, warn};

use crate::action::Action;
use crate::error::{Outcome, SculptError};
use crate::registry::MeshRegistry;

/// State saved when a speculative operation starts
#[derive(Debug)]
struct Snapshot {
    /// Length of the undo stack when the snapshot was taken
    depth: usize,
    /// Redo stack at that time, restored if the speculation is discarded
    future: Vec<Action>,
}

/// Linear undo/redo history over a [`MeshRegistry`]
///
/// New actions clear the redo stack. The undo stack is capped at
/// `undo_depth` entries (0 disables the cap); the oldest entries are
/// dropped first, except while a snapshot is open.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Action>,
    redo_stack: Vec<Action>,
    snapshots: Vec<Snapshot>,
    undo_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            snapshots: Vec::new(),
            undo_depth: config.undo_depth,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub fn is_speculating(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Register a completed action. Empty actions are dropped.
    pub fn add_action(&mut self, action: Action) {
        if action.is_empty() {
            debug!("Dropping empty action");
            return;
        }
        debug!("Recorded action with {} partial actions", action.partial_count());
        self.undo_stack.push(action);
        self.redo_stack.clear();
        self.enforce_depth();
    }

    /// Undo the most recent action
    ///
    /// Returns true if an undo was performed, false if no undo available
    pub fn undo(&mut self, registry: &mut MeshRegistry) -> bool {
        assert!(!self.is_speculating(), "undo while a snapshot is open");
        let Some(action) = self.undo_stack.pop() else {
            debug!("Undo: no entries available");
            return false;
        };
        action.undo(registry);
        self.redo_stack.push(action);
        debug!("Undo: {} entries left", self.undo_stack.len());
        true
    }

    /// Redo the most recently undone action
    pub fn redo(&mut self, registry: &mut MeshRegistry) -> bool {
        assert!(!self.is_speculating(), "redo while a snapshot is open");
        let Some(action) = self.redo_stack.pop() else {
            debug!("Redo: no entries available");
            return false;
        };
        action.redo(registry);
        self.undo_stack.push(action);
        debug!("Redo: {} entries left", self.redo_stack.len());
        true
    }

    /// Forget everything. Does not touch the meshes.
    pub fn reset(&mut self) {
        debug!(
            "Resetting history ({} undo, {} redo entries)",
            self.undo_stack.len(),
            self.redo_stack.len()
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.snapshots.clear();
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Open a snapshot before a speculative operation. Snapshots nest.
    pub fn snapshot(&mut self) {
        self.snapshots.push(Snapshot {
            depth: self.undo_stack.len(),
            future: std::mem::take(&mut self.redo_stack),
        });
    }

    /// Close the innermost snapshot and keep what was recorded since,
    /// merged into a single undo step
    pub fn keep(&mut self) {
        let snapshot = self.pop_snapshot();
        let mut recorded = self.undo_stack.split_off(snapshot.depth);
        match recorded.len() {
            0 => self.redo_stack = snapshot.future,
            1 => self.undo_stack.append(&mut recorded),
            _ => self.undo_stack.push(Action::Group(recorded)),
        }
        self.enforce_depth();
    }

    /// Close the innermost snapshot, undoing and discarding everything
    /// recorded since
    pub fn rollback(&mut self, registry: &mut MeshRegistry) {
        let snapshot = self.pop_snapshot();
        let recorded = self.undo_stack.split_off(snapshot.depth);
        if !recorded.is_empty() {
            warn!("Rolling back {} speculative actions", recorded.len());
        }
        for action in recorded.iter().rev() {
            action.undo(registry);
        }
        self.redo_stack = snapshot.future;
    }

    /// Close the innermost snapshot of an operation that turned out to be a
    /// no-op
    pub fn drop_snapshot(&mut self) {
        let snapshot = self.pop_snapshot();
        assert_eq!(
            self.undo_stack.len(),
            snapshot.depth,
            "no-op operation recorded actions"
        );
        self.redo_stack = snapshot.future;
    }

    /// Run `op` speculatively: keep its actions if it succeeds, discard the
    /// snapshot on a no-op, and roll back on failure or error
    pub fn speculate<F>(&mut self, registry: &mut MeshRegistry, op: F) -> Result<Outcome, SculptError>
    where
        F: FnOnce(&mut MeshRegistry, &mut History) -> Result<Outcome, SculptError>,
    {
        self.snapshot();
        let result = op(registry, self);
        match &result {
            Ok(Outcome::Succeeded) => self.keep(),
            Ok(Outcome::NoOp) => self.drop_snapshot(),
            Ok(Outcome::Failed) | Err(_) => self.rollback(registry),
        }
        result
    }

    fn pop_snapshot(&mut self) -> Snapshot {
        let Some(snapshot) = self.snapshots.pop() else {
            panic!("no snapshot is open");
        };
        snapshot
    }

    fn enforce_depth(&mut self) {
        if self.undo_depth == 0 || self.is_speculating() {
            return;
        }
        while self.undo_stack.len() > self.undo_depth {
            self.undo_stack.remove(0);
        }
    }
}
