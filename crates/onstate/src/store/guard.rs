//! Loop guard and ancestry walks.

use indexmap::IndexSet;

use super::Store;
use crate::arena::NodeId;
use crate::error::TreeError;

impl Store {
    /// `node` plus every node reachable from it through parent links.
    pub(crate) fn ascendancy(&self, node: NodeId) -> IndexSet<NodeId> {
        let mut seen = IndexSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(data) = self.nodes.get(current) {
                stack.extend(data.parents.keys().copied());
            }
        }
        seen
    }

    /// Rejects attaching `candidate` when it, or anything below it, is in
    /// `ascendancy`. Reads only; callers run it before mutating anything.
    pub(crate) fn assert_no_loop(
        &self,
        ascendancy: &IndexSet<NodeId>,
        candidate: NodeId,
    ) -> Result<(), TreeError> {
        let mut visited = IndexSet::new();
        let mut stack = vec![candidate];
        while let Some(current) = stack.pop() {
            if ascendancy.contains(&current) {
                return Err(TreeError::Loop { node: current });
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(data) = self.nodes.get(current) {
                stack.extend(data.effective().child_nodes());
            }
        }
        Ok(())
    }

    /// Whether some root can be reached from `node` through parent links.
    pub(crate) fn reaches_root(&self, node: NodeId) -> bool {
        self.ascendancy(node)
            .into_iter()
            .any(|n| self.nodes.get(n).is_some_and(|d| d.root.is_some()))
    }
}
