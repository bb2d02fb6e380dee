//! Values stored in and written to a tree.
//!
//! A slot holds either a [`Slot::Leaf`] (any value the tree does not observe)
//! or a [`Slot::Node`] handle. Writers hand in an [`Input`]; composite JSON is
//! wrapped into fresh nodes, existing nodes are attached by reference.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::arena::NodeId;

/// Structural classification of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Not observed: scalars and opaque values.
    Leaf,
    /// Mapping of named slots.
    Map,
    /// Ordered sequence of slots.
    Seq,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Leaf => write!(f, "leaf"),
            Shape::Map => write!(f, "mapping"),
            Shape::Seq => write!(f, "sequence"),
        }
    }
}

/// Decides whether a JSON value becomes a leaf or a wrapped node.
pub fn classify(value: &Value) -> Shape {
    match value {
        Value::Object(_) => Shape::Map,
        Value::Array(_) => Shape::Seq,
        _ => Shape::Leaf,
    }
}

/// Committed content of one child position.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Leaf(Value),
    Node(NodeId),
}

impl Slot {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Slot::Node(id) => Some(*id),
            Slot::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Slot::Leaf(v) => Some(v),
            Slot::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Slot::Node(_))
    }
}

/// A function value. The tree never stores these; writing one is reported
/// as an unsupported value and the write is dropped.
pub type Callable = Rc<dyn Fn()>;

/// A value handed to a write operation.
#[derive(Clone)]
pub enum Input {
    /// Plain data. Objects and arrays are wrapped into fresh nodes.
    Json(Value),
    /// An existing node, attached by reference (structural sharing).
    Node(NodeId),
    /// Data stored as a leaf even when composite; never observed.
    Opaque(Value),
    /// A function value.
    Callable(Callable),
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Input::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Input::Opaque(v) => f.debug_tuple("Opaque").field(v).finish(),
            Input::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Json(value)
    }
}

impl From<NodeId> for Input {
    fn from(id: NodeId) -> Self {
        Input::Node(id)
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self {
        Input::Json(Value::from(s))
    }
}

impl From<String> for Input {
    fn from(s: String) -> Self {
        Input::Json(Value::from(s))
    }
}

impl From<bool> for Input {
    fn from(b: bool) -> Self {
        Input::Json(Value::from(b))
    }
}

impl From<i64> for Input {
    fn from(n: i64) -> Self {
        Input::Json(Value::from(n))
    }
}

impl From<i32> for Input {
    fn from(n: i32) -> Self {
        Input::Json(Value::from(n))
    }
}

impl From<u64> for Input {
    fn from(n: u64) -> Self {
        Input::Json(Value::from(n))
    }
}

impl From<f64> for Input {
    fn from(n: f64) -> Self {
        Input::Json(Value::from(n))
    }
}

/// Address of a slot.
///
/// `Key` addresses mapping slots, `Index` sequence slots, and `Append` the
/// position one past the end of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
    Append,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{i}"),
            PathStep::Append => f.write_str("-"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}
