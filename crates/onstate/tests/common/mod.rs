#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use onstate::{Listener, NodeId, Store, TreeId, TreeOptions};
use serde_json::{json, Value};

pub fn sample() -> Value {
    json!({
        "a": 1,
        "b": {"z": 0, "y": 1, "x": ["A", "B"]},
        "c": [1, 2, {"w": 3}],
        "d": null
    })
}

pub fn store_with(initial: Value) -> (Store, TreeId) {
    let mut store = Store::default();
    let tree = store
        .create_tree(initial, TreeOptions::named("test"))
        .expect("composite initial value");
    (store, tree)
}

pub fn at(store: &Store, node: NodeId, key: &str) -> NodeId {
    store
        .child(node, &key.into())
        .unwrap_or_else(|| panic!("no node at `{key}`"))
}

/// Records the flattened value of every node the listener is called with.
#[derive(Clone)]
pub struct Recorder {
    pub seen: Rc<RefCell<Vec<(NodeId, Value)>>>,
    pub listener: Listener,
}

impl Recorder {
    pub fn new() -> Self {
        let seen: Rc<RefCell<Vec<(NodeId, Value)>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let listener = Listener::new(move |store, node| {
            let value = store.flatten(node).unwrap_or(Value::Null);
            sink.borrow_mut().push((node, value));
        });
        Self { seen, listener }
    }

    pub fn attach(store: &mut Store, node: NodeId) -> Self {
        let recorder = Self::new();
        store.add_change_listener(node, &recorder.listener);
        recorder
    }

    pub fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn values(&self) -> Vec<Value> {
        self.seen.borrow().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.seen.borrow().iter().map(|(n, _)| *n).collect()
    }
}

/// Listener that appends `tag` to a shared log.
pub fn tagger(log: &Rc<RefCell<String>>, tag: &'static str) -> Listener {
    let log = Rc::clone(log);
    Listener::new(move |_, _| log.borrow_mut().push_str(tag))
}
