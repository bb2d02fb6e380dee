//! Per-node record: committed children, the pending shadow copy and the
//! bookkeeping used by dirty propagation and rebuilds.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::arena::NodeId;
use crate::error::TreeError;
use crate::listener::Listener;
use crate::store::TreeId;
use crate::value::{PathStep, Shape, Slot};

/// Child slots of a node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Children {
    Map(IndexMap<String, Slot>),
    Seq(Vec<Slot>),
}

impl Children {
    pub fn empty(shape: Shape) -> Self {
        match shape {
            Shape::Seq => Children::Seq(Vec::new()),
            _ => Children::Map(IndexMap::new()),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Children::Map(_) => Shape::Map,
            Children::Seq(_) => Shape::Seq,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Children::Map(m) => m.len(),
            Children::Seq(s) => s.len(),
        }
    }

    /// Rewrites `step` into the canonical form for this shape.
    ///
    /// Mappings accept indices as keys. Sequences accept numeric keys as
    /// indices and `-` as append.
    pub fn normalize(&self, step: &PathStep) -> Result<PathStep, TreeError> {
        let mismatch = || TreeError::SlotKind {
            step: step.to_string(),
            shape: self.shape(),
        };
        match (self, step) {
            (Children::Map(_), PathStep::Key(_)) => Ok(step.clone()),
            (Children::Map(_), PathStep::Index(i)) => Ok(PathStep::Key(i.to_string())),
            (Children::Map(_), PathStep::Append) => Err(mismatch()),
            (Children::Seq(_), PathStep::Index(_) | PathStep::Append) => Ok(step.clone()),
            (Children::Seq(_), PathStep::Key(k)) if k == "-" => Ok(PathStep::Append),
            (Children::Seq(_), PathStep::Key(k)) => {
                k.parse::<usize>().map(PathStep::Index).map_err(|_| mismatch())
            }
        }
    }

    /// Reads a slot. `step` must be normalized.
    pub fn get(&self, step: &PathStep) -> Option<&Slot> {
        match (self, step) {
            (Children::Map(m), PathStep::Key(k)) => m.get(k),
            (Children::Seq(s), PathStep::Index(i)) => s.get(*i),
            _ => None,
        }
    }

    /// Writes a slot and returns the value it replaced. `step` must be
    /// normalized.
    ///
    /// Writing past the end of a sequence pads the gap with `null` leaves.
    pub fn write(&mut self, step: &PathStep, slot: Slot) -> Option<Slot> {
        match (self, step) {
            (Children::Map(m), PathStep::Key(k)) => m.insert(k.clone(), slot),
            (Children::Seq(s), PathStep::Index(i)) if *i < s.len() => {
                Some(std::mem::replace(&mut s[*i], slot))
            }
            (Children::Seq(s), PathStep::Index(i)) => {
                s.resize(*i, Slot::Leaf(Value::Null));
                s.push(slot);
                None
            }
            (Children::Seq(s), PathStep::Append) => {
                s.push(slot);
                None
            }
            _ => None,
        }
    }

    /// Removes a slot entirely; sequences shift their tail down.
    pub fn remove(&mut self, step: &PathStep) -> Option<Slot> {
        match (self, step) {
            (Children::Map(m), PathStep::Key(k)) => m.shift_remove(k),
            (Children::Seq(s), PathStep::Index(i)) if *i < s.len() => Some(s.remove(*i)),
            _ => None,
        }
    }

    pub fn keys(&self) -> Vec<PathStep> {
        match self {
            Children::Map(m) => m.keys().cloned().map(PathStep::Key).collect(),
            Children::Seq(s) => (0..s.len()).map(PathStep::Index).collect(),
        }
    }

    pub fn slots(&self) -> Box<dyn Iterator<Item = &Slot> + '_> {
        match self {
            Children::Map(m) => Box::new(m.values()),
            Children::Seq(s) => Box::new(s.iter()),
        }
    }

    pub fn slots_mut(&mut self) -> Box<dyn Iterator<Item = &mut Slot> + '_> {
        match self {
            Children::Map(m) => Box::new(m.values_mut()),
            Children::Seq(s) => Box::new(s.iter_mut()),
        }
    }

    pub fn child_nodes(&self) -> Vec<NodeId> {
        self.slots().filter_map(Slot::as_node).collect()
    }

    /// Points every slot holding `old` at `new` instead.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) {
        for slot in self.slots_mut() {
            if *slot == Slot::Node(old) {
                *slot = Slot::Node(new);
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub children: Children,
    /// Shadow copy holding writes made since the last rebuild.
    pub pending: Option<Children>,
    /// Parent handle -> number of that parent's slots pointing here.
    pub parents: IndexMap<NodeId, usize>,
    pub listeners: Vec<Listener>,
    pub dirty_children: IndexSet<NodeId>,
    /// Set when this node is the root of a tree.
    pub root: Option<TreeId>,
    /// Set once a rebuild has replaced this node.
    pub successor: Option<NodeId>,
}

impl NodeData {
    pub fn new(children: Children) -> Self {
        Self {
            children,
            pending: None,
            parents: IndexMap::new(),
            listeners: Vec::new(),
            dirty_children: IndexSet::new(),
            root: None,
            successor: None,
        }
    }

    /// What readers see: pending writes if any, else the committed children.
    pub fn effective(&self) -> &Children {
        self.pending.as_ref().unwrap_or(&self.children)
    }

    pub fn effective_mut(&mut self) -> &mut Children {
        self.pending.get_or_insert_with(|| self.children.clone())
    }

    /// Redirects committed and pending slots from `old` to `new`.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) {
        self.children.replace_node(old, new);
        if let Some(pending) = &mut self.pending {
            pending.replace_node(old, new);
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.pending.is_some() || !self.dirty_children.is_empty()
    }

    pub fn add_parent(&mut self, parent: NodeId) {
        *self.parents.entry(parent).or_insert(0) += 1;
    }

    /// Drops one reference from `parent`. Returns `true` when `parent` no
    /// longer references this node at all.
    pub fn remove_parent(&mut self, parent: NodeId) -> bool {
        let Some(count) = self.parents.get_mut(&parent) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.parents.shift_remove(&parent);
            return true;
        }
        false
    }
}
