//! Generational arena holding every node of a [`Store`](crate::Store).
//!
//! Nodes never own each other. A parent refers to its children (and a child
//! to its parents) through [`NodeId`] handles, which are plain `u32` indices
//! into a `Vec`-backed arena plus a generation counter. Freed slots are
//! recycled with a bumped generation, so a handle to a reclaimed node never
//! resolves to the node that later reuses its slot.

use std::fmt;

/// Identity of a node inside a store.
///
/// Two handles denote the same node iff they compare equal. A rebuilt node
/// always receives a fresh handle; untouched nodes keep theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

#[derive(Debug)]
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Stores `value` and returns its handle, reusing a freed slot when one
    /// is available.
    ///
    /// # Panics
    ///
    /// Panics once every `u32` index is taken, the same way
    /// `Vec::push` panics on capacity overflow.
    pub fn insert(&mut self, value: T) -> NodeId {
        if let Some(index) = self.free_head {
            if let Some(entry) = self.entries.get_mut(index as usize) {
                if let Entry::Vacant {
                    generation,
                    next_free,
                } = *entry
                {
                    *entry = Entry::Occupied { generation, value };
                    self.free_head = next_free;
                    self.len += 1;
                    return NodeId { index, generation };
                }
            }
            debug_assert!(false, "free list points at an occupied slot");
            self.free_head = None;
        }
        self.push(value)
    }

    fn push(&mut self, value: T) -> NodeId {
        let Ok(index) = u32::try_from(self.entries.len()) else {
            panic!("node arena exhausted: every u32 index is taken");
        };
        self.entries.push(Entry::Occupied {
            generation: 0,
            value,
        });
        self.len += 1;
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.entries.get(id.index as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.entries.get_mut(id.index as usize)? {
            Entry::Occupied { generation, value } if *generation == id.generation => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let entry = self.entries.get_mut(id.index as usize)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == id.generation => {}
            _ => return None,
        }
        let vacant = Entry::Vacant {
            generation: id.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Entry::Occupied { value, .. } = std::mem::replace(entry, vacant) else {
            return None;
        };
        self.free_head = Some(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }
}
