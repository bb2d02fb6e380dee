//! onstate: a reactive JSON state tree.
//!
//! A [`Store`] wraps nested mappings and sequences into observable nodes.
//! Writes are buffered per node, batched per turn, and materialized as new
//! node identities along the mutated paths only; untouched branches keep
//! their identity. Listeners registered on any node fire once per turn,
//! deepest node first.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use onstate::{Listener, Store, TreeOptions};
//! use serde_json::json;
//!
//! let mut store = Store::default();
//! let tree = store
//!     .create_tree(json!({"a": 1, "b": {"z": 0}, "c": [1, 2]}), TreeOptions::named("app"))
//!     .unwrap();
//! let root = store.root(tree).unwrap();
//! let c = store.child(root, &"c".into()).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! store.add_change_listener(root, &Listener::new(move |store, node| {
//!     sink.borrow_mut().push(store.flatten(node).unwrap());
//! }));
//!
//! let b = store.child(root, &"b".into()).unwrap();
//! store.set(b, "z", 10).unwrap();
//! store.set(root, "a", 13).unwrap();
//! store.run_turn();
//!
//! assert_eq!(*seen.borrow(), vec![json!({"a": 13, "b": {"z": 10}, "c": [1, 2]})]);
//! let new_root = store.root(tree).unwrap();
//! assert_ne!(new_root, root);
//! assert_eq!(store.child(new_root, &"c".into()), Some(c));
//! ```

pub mod arena;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod listener;
mod node;
pub mod pointer;
pub mod store;
pub mod value;

pub use arena::NodeId;
pub use config::{FlushPolicy, ParentPolicy, StoreConfig, TreeOptions};
pub use diagnostics::Diagnostic;
pub use error::TreeError;
pub use handle::NodeHandle;
pub use listener::Listener;
pub use store::{CallbackTurns, ManualTurns, Store, TreeId, TurnReport, TurnScheduler};
pub use value::{classify, Callable, Input, PathStep, Shape, Slot};

/// Creates a store holding a single tree built from `initial`.
pub fn create_tree(initial: serde_json::Value, options: TreeOptions) -> Result<(Store, TreeId), TreeError> {
    let mut store = Store::default();
    let tree = store.create_tree(initial, options)?;
    Ok((store, tree))
}
