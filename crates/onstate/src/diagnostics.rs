//! Non-fatal usage and value-shape warnings.
//!
//! Warnings never interrupt control flow. Each one is logged through
//! `tracing` and kept in a bounded log on the store so callers and tests can
//! inspect what was reported.

use std::collections::VecDeque;
use std::fmt;

use tracing::warn;

use crate::arena::NodeId;
use crate::value::PathStep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A function value was written; the write was dropped.
    UnsupportedValue { node: NodeId, step: PathStep },
    /// A listener was removed from a node it was never added to.
    ListenerNotFound { node: NodeId },
    /// A listener was added to a node that is no longer part of any tree.
    ListenerOnDetached { node: NodeId },
    /// A write hit a node with no path to any root; nobody could observe it.
    DetachedMutation { node: NodeId },
    /// A turn was requested while one was already running.
    ReentrantFlush,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnsupportedValue { node, step } => {
                write!(f, "unsupported function value for slot `{step}` of {node}; omitted")
            }
            Diagnostic::ListenerNotFound { node } => {
                write!(f, "listener is not registered on {node}")
            }
            Diagnostic::ListenerOnDetached { node } => {
                write!(f, "listener added to detached node {node}")
            }
            Diagnostic::DetachedMutation { node } => {
                write!(f, "mutation on detached node {node} ignored")
            }
            Diagnostic::ReentrantFlush => write!(f, "flush requested while a flush is running"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DiagnosticLog {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, diagnostic: Diagnostic, tree: Option<&str>) {
        warn!(tree = tree.unwrap_or("-"), "{diagnostic}");
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(diagnostic);
    }

    pub fn entries(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_bounded() {
        let mut log = DiagnosticLog::new(2);
        log.record(Diagnostic::ReentrantFlush, None);
        log.record(Diagnostic::ReentrantFlush, Some("app"));
        log.record(Diagnostic::ReentrantFlush, None);
        assert_eq!(log.entries().count(), 2);
        assert_eq!(log.take().len(), 2);
        assert_eq!(log.entries().count(), 0);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = DiagnosticLog::new(0);
        log.record(Diagnostic::ReentrantFlush, None);
        assert!(log.take().is_empty());
    }
}
