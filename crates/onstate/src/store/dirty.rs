//! Dirty propagation.

use tracing::trace;

use super::Store;
use crate::arena::NodeId;

impl Store {
    /// Marks `node` dirty in every parent, transitively, and queues a flush
    /// for every root reached on the way.
    ///
    /// A parent that already lists a child as dirty was marked earlier in the
    /// same batch together with everything above it, so the walk stops there.
    pub(crate) fn mark_dirty(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.get(current) else {
                continue;
            };
            let root = data.root;
            let parents: Vec<NodeId> = data.parents.keys().copied().collect();
            if let Some(tree) = root {
                self.schedule_flush(tree);
            }
            for parent in parents {
                let Some(pdata) = self.nodes.get_mut(parent) else {
                    continue;
                };
                if pdata.dirty_children.insert(current) {
                    trace!(%parent, child = %current, "dirty");
                    stack.push(parent);
                }
            }
        }
    }
}
