//! Batch scheduler: at most one flush per root per turn.
//!
//! The store never flushes inside a write. It queues the tree and, when the
//! queue goes from empty to non-empty, asks its [`TurnScheduler`] for a turn.
//! The host answers by calling [`Store::run_turn`] once the current call
//! stack has unwound.

use tracing::debug;

use super::{Store, TreeId};
use crate::diagnostics::Diagnostic;
use crate::error::TreeError;

/// Defers work to the next turn of the host.
pub trait TurnScheduler {
    /// Called once per idle-to-queued transition of the store.
    fn request_turn(&mut self);
}

/// Leaves turn driving entirely to the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTurns;

impl TurnScheduler for ManualTurns {
    fn request_turn(&mut self) {}
}

/// Forwards turn requests to a closure, e.g. one that posts a task to an
/// event loop.
pub struct CallbackTurns<F>(pub F);

impl<F: FnMut()> TurnScheduler for CallbackTurns<F> {
    fn request_turn(&mut self) {
        (self.0)();
    }
}

/// What a turn did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Trees whose root was dirty and got rebuilt.
    pub flushed_trees: usize,
    /// Nodes rebuilt, across all trees.
    pub rebuilt_nodes: usize,
}

impl Store {
    pub(crate) fn schedule_flush(&mut self, tree: TreeId) {
        let Some(record) = self.trees.get_mut(&tree) else {
            return;
        };
        if record.scheduled {
            return;
        }
        record.scheduled = true;
        let was_idle = self.queue.is_empty();
        self.queue.push_back(tree);
        debug!(?tree, "flush scheduled");
        if was_idle {
            self.scheduler.request_turn();
        }
    }

    pub fn has_pending_turn(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Runs one turn: flushes every tree queued before the turn started.
    ///
    /// Writes made by listeners during the turn are queued for the next one.
    /// Calling this from inside a listener is reported and ignored.
    pub fn run_turn(&mut self) -> TurnReport {
        if self.in_turn {
            self.report(Diagnostic::ReentrantFlush, None);
            return TurnReport::default();
        }
        self.in_turn = true;
        let batch: Vec<TreeId> = self.queue.drain(..).collect();
        let mut report = TurnReport::default();
        for tree in batch {
            let Some(record) = self.trees.get_mut(&tree) else {
                continue;
            };
            record.scheduled = false;
            let root = record.root;
            let rebuilt = self.flush_root(root);
            if rebuilt.is_empty() {
                continue;
            }
            debug!(?tree, rebuilt = rebuilt.len(), "flushed");
            report.flushed_trees += 1;
            report.rebuilt_nodes += rebuilt.len();
            for node in rebuilt {
                self.emit_change(node);
            }
        }
        self.sweep();
        self.in_turn = false;
        report
    }

    /// Runs turns until nothing is queued. Returns the number of turns run.
    pub fn run_until_idle(&mut self) -> Result<usize, TreeError> {
        if self.in_turn {
            self.report(Diagnostic::ReentrantFlush, None);
            return Ok(0);
        }
        let mut turns = 0;
        while self.has_pending_turn() {
            if turns >= self.config.max_settle_turns {
                return Err(TreeError::SettleLimit { turns });
            }
            self.run_turn();
            turns += 1;
        }
        Ok(turns)
    }
}
