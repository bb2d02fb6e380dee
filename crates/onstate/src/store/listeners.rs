//! Listener registry operations.

use super::Store;
use crate::arena::NodeId;
use crate::diagnostics::Diagnostic;
use crate::listener::Listener;

impl Store {
    /// Registers `listener` on `node`. It follows the node into every
    /// rebuilt successor.
    pub fn add_change_listener(&mut self, node: NodeId, listener: &Listener) {
        let live = self.nodes.get(node).is_some_and(|d| d.successor.is_none());
        if !live {
            self.report(Diagnostic::ListenerOnDetached { node }, None);
            return;
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.listeners.push(listener.clone());
        }
    }

    /// Removes every registration of `listener` on `node`. Returns `false`
    /// and reports a diagnostic when there was none.
    pub fn remove_change_listener(&mut self, node: NodeId, listener: &Listener) -> bool {
        let removed = match self.nodes.get_mut(node) {
            Some(data) => {
                let before = data.listeners.len();
                data.listeners.retain(|l| !l.ptr_eq(listener));
                data.listeners.len() != before
            }
            None => false,
        };
        if !removed {
            self.report(Diagnostic::ListenerNotFound { node }, Some(node));
        }
        removed
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |d| d.listeners.len())
    }

    /// Calls the listeners of `node` in registration order, passing `node`.
    ///
    /// The list is captured before the first call; listeners added or
    /// removed by a callback take effect on the next emission.
    pub fn emit_change(&mut self, node: NodeId) {
        let listeners = match self.nodes.get(node) {
            Some(data) => data.listeners.clone(),
            None => return,
        };
        for listener in listeners {
            listener.call(self, node);
        }
    }
}
