mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{at, sample, store_with, tagger, Recorder};
use onstate::{Diagnostic, Listener, Store, TreeOptions};
use serde_json::json;

#[test]
fn same_listener_registered_twice_is_removed_at_once() {
    let (mut store, tree) = store_with(sample());
    let root = store.root(tree).unwrap();
    let rec = Recorder::new();
    store.add_change_listener(root, &rec.listener);
    store.add_change_listener(root, &rec.listener);
    assert_eq!(store.listener_count(root), 2);

    assert!(store.remove_change_listener(root, &rec.listener));
    assert_eq!(store.listener_count(root), 0);

    store.set(root, "a", 2).unwrap();
    store.run_turn();
    assert_eq!(rec.count(), 0);
    assert!(store.take_diagnostics().is_empty());
}

#[test]
fn removing_a_missing_listener_warns() {
    let (mut store, tree) = store_with(sample());
    let root = store.root(tree).unwrap();
    let stranger = Listener::new(|_, _| {});

    assert!(!store.remove_change_listener(root, &stranger));
    assert_eq!(
        store.diagnostics().cloned().collect::<Vec<_>>(),
        vec![Diagnostic::ListenerNotFound { node: root }]
    );
}

#[test]
fn listener_on_superseded_node_warns() {
    let (mut store, tree) = store_with(sample());
    let root = store.root(tree).unwrap();
    store.set(root, "a", 2).unwrap();
    store.run_turn();

    let rec = Recorder::new();
    store.add_change_listener(root, &rec.listener);
    assert_eq!(
        store.take_diagnostics(),
        vec![Diagnostic::ListenerOnDetached { node: root }]
    );
}

#[test]
fn registration_order_is_emission_order() {
    let (mut store, tree) = store_with(sample());
    let root = store.root(tree).unwrap();
    let log = Rc::new(RefCell::new(String::new()));
    for tag in ["x", "y", "z"] {
        store.add_change_listener(root, &tagger(&log, tag));
    }
    store.set(root, "d", true).unwrap();
    store.run_turn();
    assert_eq!(log.borrow().as_str(), "xyz");
}

#[test]
fn node_shared_by_two_trees_notifies_both_roots() {
    let mut store = Store::default();
    let left = store
        .create_tree(json!({"shared": {"v": 0}}), TreeOptions::named("left"))
        .unwrap();
    let right = store.create_tree(json!({}), TreeOptions::named("right")).unwrap();
    let shared = at(&store, store.root(left).unwrap(), "shared");

    store.set(store.root(right).unwrap(), "s", shared).unwrap();
    store.run_turn();

    let (left_root, right_root) = (store.root(left).unwrap(), store.root(right).unwrap());
    let on_left = Recorder::attach(&mut store, left_root);
    let on_right = Recorder::attach(&mut store, right_root);
    let on_shared = Recorder::attach(&mut store, shared);

    store.set(shared, "v", 1).unwrap();
    let report = store.run_turn();

    assert_eq!(report.flushed_trees, 2);
    assert_eq!(on_left.values(), vec![json!({"shared": {"v": 1}})]);
    assert_eq!(on_right.values(), vec![json!({"s": {"v": 1}})]);
    assert_eq!(on_shared.count(), 1);

    let fresh = on_shared.nodes()[0];
    assert_eq!(at(&store, store.root(left).unwrap(), "shared"), fresh);
    assert_eq!(at(&store, store.root(right).unwrap(), "s"), fresh);
    assert_eq!(store.parents(fresh).len(), 2);
}

#[test]
fn dropping_a_tree_keeps_nodes_shared_elsewhere() {
    let mut store = Store::default();
    let left = store.create_tree(json!({"shared": {"v": 0}}), TreeOptions::default()).unwrap();
    let right = store.create_tree(json!({}), TreeOptions::default()).unwrap();
    let shared = at(&store, store.root(left).unwrap(), "shared");
    store.set(store.root(right).unwrap(), "s", shared).unwrap();
    store.run_turn();

    assert!(store.drop_tree(left));
    assert!(store.root(left).is_none());
    assert!(store.contains(shared));
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.flatten_tree(right).unwrap(), json!({"s": {"v": 0}}));
}

#[test]
fn handle_listeners_follow_the_node() {
    let (mut store, tree) = store_with(sample());
    let root = store.root(tree).unwrap();
    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);

    let listener = store
        .node(root)
        .at_key("c")
        .unwrap()
        .on_change(move |store, node| sink.borrow_mut().push(store.flatten(node).unwrap()));

    store.node(root).at_key("c").unwrap().at_index(2).unwrap().set("w", 4).unwrap();
    store.run_turn();
    assert_eq!(*hits.borrow(), vec![json!([1, 2, {"w": 4}])]);

    let root = store.root(tree).unwrap();
    assert!(store.node(root).at_key("c").unwrap().off_change(&listener));
}

#[test]
fn tree_mounted_inside_another_notifies_each_root_once() {
    let mut store = Store::default();
    let inner = store.create_tree(json!({"v": 0}), TreeOptions::named("inner")).unwrap();
    let host = store.create_tree(json!({}), TreeOptions::named("host")).unwrap();
    let inner_root = store.root(inner).unwrap();
    store.set(store.root(host).unwrap(), "mounted", inner_root).unwrap();
    store.run_turn();

    let host_root = store.root(host).unwrap();
    let on_inner = Recorder::attach(&mut store, inner_root);
    let on_host = Recorder::attach(&mut store, host_root);

    store.set(inner_root, "v", 1).unwrap();
    store.run_turn();

    assert_eq!(on_inner.count(), 1);
    assert_eq!(on_host.values(), vec![json!({"mounted": {"v": 1}})]);
    let new_inner = store.root(inner).unwrap();
    assert_eq!(at(&store, store.root(host).unwrap(), "mounted"), new_inner);
    assert_eq!(store.tree_of(new_inner), Some(inner));
}
