//! The store: a shared arena of nodes hosting any number of trees.
//!
//! # Overview
//!
//! [`Store::create_tree`] wraps a JSON value into nodes and tags the top one
//! as a tree root. Writes ([`Store::set`], [`Store::delete`],
//! [`Store::push`]) never touch committed children: they go to a per-node
//! pending copy, mark every ancestor dirty and queue a flush of every root
//! they reach. The host runs queued flushes with [`Store::run_turn`]; a flush
//! rebuilds only the dirty paths, gives each rebuilt node a fresh
//! [`NodeId`], keeps untouched branches by reference and fires listeners from
//! the deepest rebuilt node up to the root.
//!
//! Nodes may be shared between several parents, in one tree or across
//! trees, as long as no node becomes its own ancestor.

mod dirty;
mod guard;
mod listeners;
mod path;
mod rebuild;
mod scheduler;

pub use scheduler::{CallbackTurns, ManualTurns, TurnReport, TurnScheduler};

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::debug;

use crate::arena::{Arena, NodeId};
use crate::config::{FlushPolicy, ParentPolicy, StoreConfig, TreeOptions};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::error::TreeError;
use crate::handle::NodeHandle;
use crate::node::{Children, NodeData};
use crate::value::{classify, Input, PathStep, Shape, Slot};

/// Identity of a tree. Stays valid across rebuilds of its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeId(u32);

#[derive(Debug)]
struct TreeRecord {
    root: NodeId,
    name: Option<String>,
    scheduled: bool,
}

pub struct Store {
    nodes: Arena<NodeData>,
    trees: IndexMap<TreeId, TreeRecord>,
    next_tree: u32,
    queue: VecDeque<TreeId>,
    scheduler: Box<dyn TurnScheduler>,
    config: StoreConfig,
    diagnostics: DiagnosticLog,
    in_turn: bool,
    /// Nodes replaced by a rebuild during the current turn.
    superseded: Vec<NodeId>,
    /// Nodes that lost their last parent; reclaimed at the end of a turn
    /// unless re-attached.
    orphans: IndexSet<NodeId>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("nodes", &self.nodes.len())
            .field("trees", &self.trees.len())
            .field("queued", &self.queue.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_scheduler(config, ManualTurns)
    }

    /// Creates a store that calls `scheduler` whenever a flush gets queued
    /// and no turn has been requested yet.
    pub fn with_scheduler(config: StoreConfig, scheduler: impl TurnScheduler + 'static) -> Self {
        Self {
            nodes: Arena::default(),
            trees: IndexMap::new(),
            next_tree: 0,
            queue: VecDeque::new(),
            scheduler: Box::new(scheduler),
            diagnostics: DiagnosticLog::new(config.diagnostics_capacity),
            config,
            in_turn: false,
            superseded: Vec::new(),
            orphans: IndexSet::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Trees ─────────────────────────────────────────────────────────────

    /// Wraps `initial` into nodes and registers it as a new tree.
    pub fn create_tree(&mut self, initial: Value, options: TreeOptions) -> Result<TreeId, TreeError> {
        if classify(&initial) == Shape::Leaf {
            return Err(TreeError::NotComposite);
        }
        let Slot::Node(root) = self.wrap(initial) else {
            return Err(TreeError::NotComposite);
        };
        let id = TreeId(self.next_tree);
        self.next_tree += 1;
        if let Some(data) = self.nodes.get_mut(root) {
            data.root = Some(id);
        }
        debug!(tree = options.name.as_deref().unwrap_or("-"), %root, "tree created");
        self.trees.insert(
            id,
            TreeRecord {
                root,
                name: options.name,
                scheduled: false,
            },
        );
        Ok(id)
    }

    /// Current root node of `tree`. Changes every time the root is rebuilt.
    pub fn root(&self, tree: TreeId) -> Option<NodeId> {
        self.trees.get(&tree).map(|t| t.root)
    }

    pub fn tree_name(&self, tree: TreeId) -> Option<&str> {
        self.trees.get(&tree)?.name.as_deref()
    }

    /// The tree `node` is the root of, if any.
    pub fn tree_of(&self, node: NodeId) -> Option<TreeId> {
        self.nodes.get(node)?.root
    }

    pub fn trees(&self) -> impl Iterator<Item = TreeId> + '_ {
        self.trees.keys().copied()
    }

    /// Releases the root holder of `tree`. Its nodes are reclaimed unless
    /// they are still attached elsewhere.
    pub fn drop_tree(&mut self, tree: TreeId) -> bool {
        let Some(record) = self.trees.shift_remove(&tree) else {
            return false;
        };
        self.queue.retain(|t| *t != tree);
        if let Some(data) = self.nodes.get_mut(record.root) {
            data.root = None;
            if data.parents.is_empty() {
                self.orphans.insert(record.root);
            }
        }
        if !self.in_turn {
            self.sweep();
        }
        true
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Reads a slot, pending writes included.
    pub fn get(&self, node: NodeId, step: &PathStep) -> Option<Slot> {
        let children = self.nodes.get(node)?.effective();
        let step = children.normalize(step).ok()?;
        children.get(&step).cloned()
    }

    /// Reads a slot and returns it only when it holds a node.
    pub fn child(&self, node: NodeId, step: &PathStep) -> Option<NodeId> {
        self.get(node, step)?.as_node()
    }

    pub fn keys(&self, node: NodeId) -> Vec<PathStep> {
        self.nodes
            .get(node)
            .map(|d| d.effective().keys())
            .unwrap_or_default()
    }

    pub fn len(&self, node: NodeId) -> usize {
        self.nodes.get(node).map_or(0, |d| d.effective().len())
    }

    pub fn is_empty(&self, node: NodeId) -> bool {
        self.len(node) == 0
    }

    pub fn shape(&self, node: NodeId) -> Option<Shape> {
        Some(self.nodes.get(node)?.children.shape())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parents(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|d| d.parents.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_dirty(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(NodeData::is_dirty)
    }

    /// `true` when writes to `node` can no longer reach any root: the node
    /// was reclaimed, replaced by a rebuild, or removed from every parent.
    pub fn is_detached(&self, node: NodeId) -> bool {
        match self.nodes.get(node) {
            None => true,
            Some(data) if data.successor.is_some() => true,
            Some(_) => !self.reaches_root(node),
        }
    }

    /// Plain copy of the node's current state, pending writes included.
    pub fn flatten(&self, node: NodeId) -> Option<Value> {
        let data = self.nodes.get(node)?;
        Some(match data.effective() {
            Children::Map(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, slot) in map {
                    out.insert(key.clone(), self.flatten_slot(slot));
                }
                Value::Object(out)
            }
            Children::Seq(seq) => Value::Array(seq.iter().map(|s| self.flatten_slot(s)).collect()),
        })
    }

    pub fn flatten_tree(&self, tree: TreeId) -> Option<Value> {
        self.flatten(self.root(tree)?)
    }

    fn flatten_slot(&self, slot: &Slot) -> Value {
        match slot {
            Slot::Leaf(v) => v.clone(),
            Slot::Node(id) => self.flatten(*id).unwrap_or(Value::Null),
        }
    }

    /// Borrowed handle exposing the node contract with chained navigation.
    pub fn node(&mut self, node: NodeId) -> NodeHandle<'_> {
        NodeHandle::new(self, node)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Writes `input` into `step` of `node`.
    ///
    /// Fatal errors are returned before anything changes: slot kind
    /// mismatches, indices past the allowed padding, loops, exclusive-parent
    /// violations and unknown nodes. Writes to a
    /// detached node and function values are reported as diagnostics and
    /// ignored.
    pub fn set(&mut self, node: NodeId, step: impl Into<PathStep>, input: impl Into<Input>) -> Result<(), TreeError> {
        let step = step.into();
        let Some(step) = self.writable(node, &step)? else {
            return Ok(());
        };
        if let PathStep::Index(index) = &step {
            let (index, len) = (*index, self.len(node));
            if index > len.saturating_add(self.config.max_index_gap) {
                return Err(TreeError::IndexOutOfRange { index, len });
            }
        }
        let slot = match input.into() {
            Input::Callable(_) => {
                self.report(Diagnostic::UnsupportedValue { node, step }, Some(node));
                return Ok(());
            }
            Input::Json(value) => self.wrap(value),
            Input::Opaque(value) => Slot::Leaf(value),
            Input::Node(child) => {
                self.check_attach(node, child)?;
                Slot::Node(child)
            }
        };
        self.write_slot(node, &step, Some(slot));
        self.after_write()
    }

    /// Removes `step` from `node`. Removing a missing slot does nothing.
    pub fn delete(&mut self, node: NodeId, step: impl Into<PathStep>) -> Result<(), TreeError> {
        let step = step.into();
        let Some(step) = self.writable(node, &step)? else {
            return Ok(());
        };
        let present = self
            .nodes
            .get(node)
            .is_some_and(|d| d.effective().get(&step).is_some());
        if !present {
            return Ok(());
        }
        self.write_slot(node, &step, None);
        self.after_write()
    }

    /// Appends `input` to a sequence node.
    pub fn push(&mut self, node: NodeId, input: impl Into<Input>) -> Result<(), TreeError> {
        self.set(node, PathStep::Append, input)
    }

    /// Resolves the target of a write. `Ok(None)` means the write must be
    /// dropped because the node is detached.
    fn writable(&mut self, node: NodeId, step: &PathStep) -> Result<Option<PathStep>, TreeError> {
        let attached = match self.nodes.get(node) {
            Some(data) => data.successor.is_none() && self.reaches_root(node),
            None => false,
        };
        if !attached {
            self.report(Diagnostic::DetachedMutation { node }, None);
            return Ok(None);
        }
        let Some(data) = self.nodes.get(node) else {
            return Ok(None);
        };
        data.effective().normalize(step).map(Some)
    }

    fn check_attach(&self, node: NodeId, child: NodeId) -> Result<(), TreeError> {
        let Some(data) = self.nodes.get(child) else {
            return Err(TreeError::UnknownNode { node: child });
        };
        if data.successor.is_some() {
            return Err(TreeError::UnknownNode { node: child });
        }
        if self.config.parent_policy == ParentPolicy::Exclusive && !data.parents.is_empty() {
            return Err(TreeError::AlreadyParented { node: child });
        }
        self.assert_no_loop(&self.ascendancy(node), child)
    }

    /// Writes into the pending copy and keeps back-references in step with it.
    fn write_slot(&mut self, node: NodeId, step: &PathStep, slot: Option<Slot>) {
        let added = slot.as_ref().and_then(Slot::as_node);
        let Some(data) = self.nodes.get_mut(node) else {
            return;
        };
        let children = data.effective_mut();
        let replaced = match slot {
            Some(slot) => children.write(step, slot),
            None => children.remove(step),
        };
        if let Some(child) = added {
            self.link(node, child);
        }
        if let Some(Slot::Node(old)) = replaced {
            self.unlink(node, old);
        }
        self.mark_dirty(node);
    }

    fn after_write(&mut self) -> Result<(), TreeError> {
        if self.config.flush_policy == FlushPolicy::Immediate && !self.in_turn {
            self.run_until_idle()?;
        }
        Ok(())
    }

    /// Builds nodes for a composite value, bypassing dirty tracking.
    fn wrap(&mut self, value: Value) -> Slot {
        let children = match value {
            Value::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, v) in map {
                    out.insert(key, self.wrap(v));
                }
                Children::Map(out)
            }
            Value::Array(items) => Children::Seq(items.into_iter().map(|v| self.wrap(v)).collect()),
            leaf => return Slot::Leaf(leaf),
        };
        let child_nodes = children.child_nodes();
        let id = self.nodes.insert(NodeData::new(children));
        for child in child_nodes {
            self.link(id, child);
        }
        Slot::Node(id)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(data) = self.nodes.get_mut(child) {
            data.add_parent(parent);
        }
        self.orphans.shift_remove(&child);
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        let Some(data) = self.nodes.get_mut(child) else {
            return;
        };
        if !data.remove_parent(parent) {
            return;
        }
        if data.parents.is_empty() && data.root.is_none() {
            self.orphans.insert(child);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.dirty_children.shift_remove(&child);
        }
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.entries()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    fn report(&mut self, diagnostic: Diagnostic, near: Option<NodeId>) {
        let tree = near.and_then(|n| self.tree_label(n));
        self.diagnostics.record(diagnostic, tree.as_deref());
    }

    /// Name of the first named tree reachable upwards from `node`.
    fn tree_label(&self, node: NodeId) -> Option<String> {
        self.ascendancy(node)
            .into_iter()
            .filter_map(|n| self.nodes.get(n)?.root)
            .find_map(|t| self.trees.get(&t)?.name.clone())
    }
}
