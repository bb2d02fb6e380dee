//! Tree rebuilder and end-of-turn reclamation.
//!
//! A flush walks down from the root through dirty nodes only. Every dirty
//! node is replaced by a fresh node built from its pending copy; clean
//! children are kept by reference. Listeners and the root tag move to the
//! fresh node, and the old one records its successor so that a second
//! parent (in this tree or another one) sharing the same child picks up the
//! already rebuilt node instead of rebuilding it again.

use std::mem;

use tracing::trace;

use super::Store;
use crate::arena::NodeId;
use crate::node::{Children, NodeData};
use crate::value::Slot;

impl Store {
    /// Rebuilds the dirty part of the tree under `root`. Returns the fresh
    /// nodes deepest first, the new root last; empty when nothing was dirty.
    pub(crate) fn flush_root(&mut self, root: NodeId) -> Vec<NodeId> {
        let mut rebuilt = Vec::new();
        if self.is_dirty(root) {
            self.rebuild(root, &mut rebuilt);
        }
        rebuilt
    }

    fn rebuild(&mut self, node: NodeId, rebuilt: &mut Vec<NodeId>) -> NodeId {
        let Some(data) = self.nodes.get_mut(node) else {
            return node;
        };
        if let Some(next) = data.successor {
            return next;
        }
        let mut source = data.pending.take().unwrap_or_else(|| data.children.clone());
        data.dirty_children.clear();
        let listeners = mem::take(&mut data.listeners);
        let root = data.root.take();

        let fresh = self.nodes.insert(NodeData::new(Children::empty(source.shape())));
        if let Some(old) = self.nodes.get_mut(node) {
            old.successor = Some(fresh);
        }
        self.superseded.push(node);

        for slot in source.slots_mut() {
            let Slot::Node(child) = *slot else {
                continue;
            };
            let next = self.resolve_child(child, rebuilt);
            if let Some(data) = self.nodes.get_mut(next) {
                data.add_parent(fresh);
            }
            if let Some(data) = self.nodes.get_mut(child) {
                data.remove_parent(node);
            }
            *slot = Slot::Node(next);
        }

        if let Some(data) = self.nodes.get_mut(fresh) {
            data.children = source;
            data.listeners = listeners;
            data.root = root;
        }
        if let Some(tree) = root {
            if let Some(record) = self.trees.get_mut(&tree) {
                record.root = fresh;
            }
        }
        trace!(old = %node, new = %fresh, "rebuilt");
        rebuilt.push(fresh);
        fresh
    }

    /// The node a parent being rebuilt should point at instead of `child`.
    fn resolve_child(&mut self, child: NodeId, rebuilt: &mut Vec<NodeId>) -> NodeId {
        let mut current = child;
        loop {
            let Some(data) = self.nodes.get(current) else {
                return current;
            };
            if let Some(next) = data.successor {
                current = next;
                continue;
            }
            if data.is_dirty() {
                return self.rebuild(current, rebuilt);
            }
            return current;
        }
    }

    /// Moves the parents that still reference a superseded node (parents no
    /// flush reached, such as a removed node awaiting re-attachment) over to
    /// its latest successor.
    fn forward_parents(&mut self, node: NodeId) {
        let Some(data) = self.nodes.get(node) else {
            return;
        };
        if data.parents.is_empty() {
            return;
        }
        let parents: Vec<(NodeId, usize)> = data.parents.iter().map(|(p, n)| (*p, *n)).collect();
        let mut target = node;
        while let Some(next) = self.nodes.get(target).and_then(|d| d.successor) {
            target = next;
        }
        if target == node {
            return;
        }
        for (parent, count) in parents {
            let Some(pdata) = self.nodes.get_mut(parent) else {
                continue;
            };
            if pdata.successor.is_some() {
                continue;
            }
            pdata.replace_child(node, target);
            pdata.dirty_children.shift_remove(&node);
            if let Some(tdata) = self.nodes.get_mut(target) {
                for _ in 0..count {
                    tdata.add_parent(parent);
                }
            }
            trace!(%parent, old = %node, new = %target, "forwarded");
        }
        if self.is_dirty(target) {
            self.mark_dirty(target);
        }
    }

    /// Frees nodes superseded during the turn and every non-root node left
    /// without parents, together with whatever only they kept alive.
    pub(crate) fn sweep(&mut self) {
        let superseded = mem::take(&mut self.superseded);
        for &node in &superseded {
            self.forward_parents(node);
        }
        for node in superseded {
            self.nodes.remove(node);
        }
        let mut stack: Vec<NodeId> = mem::take(&mut self.orphans).into_iter().collect();
        let mut freed = 0usize;
        while let Some(node) = stack.pop() {
            let Some(data) = self.nodes.get(node) else {
                continue;
            };
            if !data.parents.is_empty() || data.root.is_some() {
                continue;
            }
            let Some(data) = self.nodes.remove(node) else {
                continue;
            };
            freed += 1;
            let mut children = data.children.child_nodes();
            if let Some(pending) = &data.pending {
                children.extend(pending.child_nodes());
            }
            for child in children {
                if let Some(cdata) = self.nodes.get_mut(child) {
                    cdata.remove_parent(node);
                    cdata.dirty_children.shift_remove(&node);
                    stack.push(child);
                }
            }
        }
        if freed > 0 {
            trace!(freed, "reclaimed orphans");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{Store, TreeOptions};

    #[test]
    fn clean_root_flush_is_empty() {
        let mut store = Store::default();
        let tree = store.create_tree(json!({"a": 1}), TreeOptions::default()).unwrap();
        let root = store.root(tree).unwrap();
        assert!(store.flush_root(root).is_empty());
    }

    #[test]
    fn rebuilt_order_is_deepest_first() {
        let mut store = Store::default();
        let tree = store
            .create_tree(json!({"a": {"b": {"c": 1}}}), TreeOptions::default())
            .unwrap();
        let root = store.root(tree).unwrap();
        let a = store.child(root, &"a".into()).unwrap();
        let b = store.child(a, &"b".into()).unwrap();
        store.set(b, "c", 2).unwrap();

        let rebuilt = store.flush_root(root);
        assert_eq!(rebuilt.len(), 3);
        let new_root = store.root(tree).unwrap();
        assert_eq!(rebuilt[2], new_root);
        let new_a = store.child(new_root, &"a".into()).unwrap();
        let new_b = store.child(new_a, &"b".into()).unwrap();
        assert_eq!(rebuilt, vec![new_b, new_a, new_root]);
        assert_eq!(store.parents(new_b), vec![new_a]);
    }

    #[test]
    fn sweep_frees_superseded_and_orphans() {
        let mut store = Store::default();
        let tree = store
            .create_tree(json!({"keep": {"x": 1}, "drop": {"y": {"z": 1}}}), TreeOptions::default())
            .unwrap();
        assert_eq!(store.node_count(), 4);
        let root = store.root(tree).unwrap();
        store.delete(root, "drop").unwrap();
        store.run_turn();
        // new root + untouched "keep"
        assert_eq!(store.node_count(), 2);
        assert!(!store.contains(root));
    }

    #[test]
    fn sweep_forwards_detached_parents_to_successor() {
        let mut store = Store::default();
        let tree = store
            .create_tree(json!({"p1": {"s": {"v": 0}}, "p2": {}}), TreeOptions::default())
            .unwrap();
        let root = store.root(tree).unwrap();
        let p1 = store.child(root, &"p1".into()).unwrap();
        let p2 = store.child(root, &"p2".into()).unwrap();
        let s = store.child(p1, &"s".into()).unwrap();
        store.set(p2, "s", s).unwrap();
        store.run_turn();

        let root = store.root(tree).unwrap();
        let p2 = store.child(root, &"p2".into()).unwrap();
        store.delete(root, "p2").unwrap();
        store.set(s, "v", 1).unwrap();
        // keep p2 alive through the sweep the way a re-attach would
        store.orphans.shift_remove(&p2);
        store.run_turn();

        let fresh = store.find_node(tree, &["p1".into(), "s".into()]).unwrap();
        assert_ne!(fresh, s);
        assert_eq!(store.child(p2, &"s".into()), Some(fresh));
        assert!(store.parents(fresh).contains(&p2));
        assert!(!store.is_dirty(p2));
    }
}
