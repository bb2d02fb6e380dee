//! Path and JSON Pointer conveniences addressed from a tree root.

use super::{Store, TreeId};
use crate::arena::NodeId;
use crate::error::TreeError;
use crate::pointer::parse_pointer;
use crate::value::{Input, PathStep, Slot};

impl Store {
    /// Follows `path` from the root of `tree`.
    ///
    /// An empty path yields the root itself.
    pub fn find(&self, tree: TreeId, path: &[PathStep]) -> Option<Slot> {
        let mut current = Slot::Node(self.root(tree)?);
        for step in path {
            current = self.get(current.as_node()?, step)?;
        }
        Some(current)
    }

    pub fn find_node(&self, tree: TreeId, path: &[PathStep]) -> Option<NodeId> {
        self.find(tree, path)?.as_node()
    }

    pub fn get_in(&self, tree: TreeId, path: &[PathStep]) -> Option<Slot> {
        self.find(tree, path)
    }

    pub fn set_in(&mut self, tree: TreeId, path: &[PathStep], input: impl Into<Input>) -> Result<(), TreeError> {
        let (parent, step) = self.split(tree, path)?;
        self.set(parent, step, input)
    }

    pub fn delete_in(&mut self, tree: TreeId, path: &[PathStep]) -> Result<(), TreeError> {
        let (parent, step) = self.split(tree, path)?;
        self.delete(parent, step)
    }

    pub fn find_ptr(&self, tree: TreeId, pointer: &str) -> Result<Option<Slot>, TreeError> {
        Ok(self.find(tree, &parse_pointer(pointer)?))
    }

    pub fn set_ptr(&mut self, tree: TreeId, pointer: &str, input: impl Into<Input>) -> Result<(), TreeError> {
        let path = parse_pointer(pointer)?;
        self.set_in(tree, &path, input)
    }

    pub fn delete_ptr(&mut self, tree: TreeId, pointer: &str) -> Result<(), TreeError> {
        let path = parse_pointer(pointer)?;
        self.delete_in(tree, &path)
    }

    fn split(&self, tree: TreeId, path: &[PathStep]) -> Result<(NodeId, PathStep), TreeError> {
        let Some((last, init)) = path.split_last() else {
            return Err(TreeError::PathNotFound);
        };
        let parent = self.find_node(tree, init).ok_or(TreeError::PathNotFound)?;
        Ok((parent, last.clone()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{PathStep, Slot, Store, TreeError, TreeOptions};

    #[test]
    fn pointer_paths_cross_sequences() {
        let mut store = Store::default();
        let tree = store
            .create_tree(json!({"c": [1, 2, {"w": 3}]}), TreeOptions::default())
            .unwrap();
        assert_eq!(store.find_ptr(tree, "/c/2/w").unwrap(), Some(Slot::Leaf(json!(3))));
        assert_eq!(store.find_ptr(tree, "/c/9").unwrap(), None);

        store.set_ptr(tree, "/c/-", "tail").unwrap();
        store.set_ptr(tree, "/c/2/w", 4).unwrap();
        assert_eq!(store.flatten_tree(tree).unwrap(), json!({"c": [1, 2, {"w": 4}, "tail"]}));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let mut store = Store::default();
        let tree = store.create_tree(json!({"a": {}}), TreeOptions::default()).unwrap();
        let path = [PathStep::Key("nope".into()), PathStep::Key("x".into())];
        assert_eq!(store.set_in(tree, &path, 1), Err(TreeError::PathNotFound));
        assert_eq!(store.delete_in(tree, &[]), Err(TreeError::PathNotFound));
        assert!(matches!(store.set_ptr(tree, "a", 1), Err(TreeError::Pointer(_))));
    }
}
