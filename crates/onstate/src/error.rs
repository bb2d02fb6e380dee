use thiserror::Error;

use crate::arena::NodeId;
use crate::pointer::PointerError;
use crate::value::Shape;

/// Fatal errors. Every one of them is raised before the offending write
/// touches the tree, so a rejected operation leaves it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("loop not allowed: node {node} is already an ancestor of the attachment point")]
    Loop { node: NodeId },
    #[error("node {node} already has a parent")]
    AlreadyParented { node: NodeId },
    #[error("unknown or reclaimed node {node}")]
    UnknownNode { node: NodeId },
    #[error("tree root must be a mapping or a sequence")]
    NotComposite,
    #[error("slot `{step}` cannot address a {shape} node")]
    SlotKind { step: String, shape: Shape },
    #[error("index {index} is too far past the end of a sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("path not found")]
    PathNotFound,
    #[error("store did not settle after {turns} turns")]
    SettleLimit { turns: usize },
    #[error("invalid JSON pointer: {0}")]
    Pointer(#[from] PointerError),
}
