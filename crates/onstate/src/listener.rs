//! Change listeners.

use std::fmt;
use std::rc::Rc;

use crate::arena::NodeId;
use crate::store::Store;

type Callback = dyn Fn(&mut Store, NodeId);

/// A change callback.
///
/// Cloning a listener yields the same listener: equality is identity of the
/// underlying callback, so the same `Listener` registered twice is removed
/// by a single [`Store::remove_change_listener`] call.
///
/// The callback receives the store and the node that changed (the rebuilt
/// node when fired by a flush) and may read or write the tree. Writes made
/// from a listener are flushed on the next turn.
#[derive(Clone)]
pub struct Listener(Rc<Callback>);

impl Listener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut Store, NodeId) + 'static,
    {
        Self(Rc::new(callback))
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub(crate) fn call(&self, store: &mut Store, node: NodeId) {
        (self.0)(store, node);
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_are_equal_distinct_closures_are_not() {
        let a = Listener::new(|_, _| {});
        let b = Listener::new(|_, _| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
