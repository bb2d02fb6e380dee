//! Borrowed, chainable view of one node.

use serde_json::Value;

use crate::arena::NodeId;
use crate::error::TreeError;
use crate::listener::Listener;
use crate::store::Store;
use crate::value::{Input, PathStep, Slot};

pub struct NodeHandle<'a> {
    store: &'a mut Store,
    node: NodeId,
}

impl<'a> NodeHandle<'a> {
    pub(crate) fn new(store: &'a mut Store, node: NodeId) -> Self {
        Self { store, node }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }

    /// Moves to the child node at `key`, if that slot holds a node.
    pub fn at_key(self, key: impl Into<String>) -> Option<Self> {
        self.at(PathStep::Key(key.into()))
    }

    pub fn at_index(self, index: usize) -> Option<Self> {
        self.at(PathStep::Index(index))
    }

    pub fn at(self, step: PathStep) -> Option<Self> {
        let child = self.store.child(self.node, &step)?;
        Some(Self {
            store: self.store,
            node: child,
        })
    }

    pub fn get(&self, step: impl Into<PathStep>) -> Option<Slot> {
        self.store.get(self.node, &step.into())
    }

    /// Reads a leaf slot.
    pub fn leaf(&self, step: impl Into<PathStep>) -> Option<Value> {
        match self.get(step)? {
            Slot::Leaf(v) => Some(v),
            Slot::Node(_) => None,
        }
    }

    pub fn set(&mut self, step: impl Into<PathStep>, input: impl Into<Input>) -> Result<&mut Self, TreeError> {
        self.store.set(self.node, step, input)?;
        Ok(self)
    }

    pub fn delete(&mut self, step: impl Into<PathStep>) -> Result<&mut Self, TreeError> {
        self.store.delete(self.node, step)?;
        Ok(self)
    }

    pub fn push(&mut self, input: impl Into<Input>) -> Result<&mut Self, TreeError> {
        self.store.push(self.node, input)?;
        Ok(self)
    }

    pub fn keys(&self) -> Vec<PathStep> {
        self.store.keys(self.node)
    }

    pub fn len(&self) -> usize {
        self.store.len(self.node)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flatten(&self) -> Option<Value> {
        self.store.flatten(self.node)
    }

    /// Registers `callback` and returns the listener so it can be removed.
    pub fn on_change<F>(&mut self, callback: F) -> Listener
    where
        F: Fn(&mut Store, NodeId) + 'static,
    {
        let listener = Listener::new(callback);
        self.store.add_change_listener(self.node, &listener);
        listener
    }

    pub fn off_change(&mut self, listener: &Listener) -> bool {
        self.store.remove_change_listener(self.node, listener)
    }
}
