mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::store_with;
use indexmap::IndexMap;
use onstate::Listener;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z]{0,6}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn flatten_returns_the_initial_value(value in json_value()) {
        let initial = json!({"root": value});
        let (store, tree) = store_with(initial.clone());
        prop_assert_eq!(store.flatten_tree(tree), Some(initial));
    }

    #[test]
    fn batched_writes_emit_once_with_last_values(
        writes in prop::collection::vec((0usize..3, any::<i64>()), 1..20)
    ) {
        let (mut store, tree) = store_with(json!({"p": 0, "q": 0, "r": 0}));
        let root = store.root(tree).unwrap();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        store.add_change_listener(root, &Listener::new(move |_, _| counter.set(counter.get() + 1)));

        let keys = ["p", "q", "r"];
        let mut expected: IndexMap<&str, i64> = keys.iter().map(|k| (*k, 0)).collect();
        for (slot, n) in &writes {
            store.set(root, keys[*slot], *n).unwrap();
            expected.insert(keys[*slot], *n);
        }
        store.run_turn();

        prop_assert_eq!(calls.get(), 1);
        let expected: Value = expected.into_iter().map(|(k, v)| (k.to_string(), json!(v))).collect::<Map<_, _>>().into();
        prop_assert_eq!(store.flatten_tree(tree), Some(expected));
    }
}
