//! Arena-backed red-black tree.
//!
//! Every node lives in a single `Vec` and links to its parent and children by index. Slot 0 is the
//! shared black nil terminator; it is never written to after construction.

extern crate alloc;

use core::cmp::Ordering;
use core::fmt;
use core::mem;
use core::str::FromStr;

use alloc::vec::Vec;
use log::{debug, trace};

pub mod console;

mod config;
mod error;
mod map;
mod traverse;
mod validate;

pub use config::TreeConfig;
pub use error::{StructuralViolation, TreeError};
pub use map::EmberwoodMap;
pub use traverse::{Order, Traversal, Visit};
pub use validate::{Mutation, Validator};

/*
freed cells are kept in a linked list threaded through their parent index, head stored in the tree:
- a new cell takes the head, new head is head = storage[head].parent
- a freed cell gets storage[cell].parent = head, and then head = cell
slot 0 can never be freed, so BLACK_NIL doubles as the end of the list.
*/

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    #[default]
    Red,
    Black,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => f.write_str("RED"),
            Color::Black => f.write_str("BLACK"),
        }
    }
}

/// One of the two child slots of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// End of the tree the [`Emberwood::boundary`] lookup descends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Lowest,
    Highest,
}

impl FromStr for Boundary {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest" | "min" => Ok(Boundary::Lowest),
            "highest" | "max" => Ok(Boundary::Highest),
            other => Err(TreeError::InvalidArgument(format!(
                "unknown boundary selector '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIndex(pub(crate) usize);

pub(crate) const BLACK_NIL: NodeIndex = NodeIndex(0);

#[derive(Debug, Clone)]
pub(crate) struct EmberwoodNode<K, V> {
    pub(crate) key: Option<K>,
    pub(crate) payload: Option<V>,
    pub(crate) color: Color,
    pub(crate) parent: NodeIndex,
    pub(crate) children: [NodeIndex; 2],
}

impl<K, V> EmberwoodNode<K, V> {
    const fn nil() -> Self {
        Self {
            key: None,
            payload: None,
            color: Color::Black,
            parent: BLACK_NIL,
            children: [BLACK_NIL; 2],
        }
    }

    fn new_isolated(key: K, payload: Option<V>, parent: NodeIndex) -> Self {
        Self {
            key: Some(key),
            payload,
            color: Color::default(),
            parent,
            children: [BLACK_NIL; 2],
        }
    }

    pub(crate) fn child(&self, side: Side) -> NodeIndex {
        self.children[side as usize]
    }

    pub(crate) fn left_child(&self) -> NodeIndex {
        self.child(Side::Left)
    }

    pub(crate) fn right_child(&self) -> NodeIndex {
        self.child(Side::Right)
    }

    /// Which slot holds `child`. Falls back to `Right` when it is not the left child.
    fn side_of(&self, child: NodeIndex) -> Side {
        if self.left_child() == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Direction `a` lies in relative to `b`, or `None` when both keys are equal.
    ///
    /// Fails when either node is keyless (a nil terminator or a freed slot).
    pub(crate) fn compare(a: &Self, b: &Self) -> Result<Option<Side>, TreeError>
    where
        K: Ord,
    {
        let (Some(a_key), Some(b_key)) = (a.key.as_ref(), b.key.as_ref()) else {
            return Err(TreeError::InvalidArgument(
                "cannot compare a keyless node".into(),
            ));
        };

        Ok(match a_key.cmp(b_key) {
            Ordering::Less => Some(Side::Left),
            Ordering::Greater => Some(Side::Right),
            Ordering::Equal => None,
        })
    }
}

/// Read-only view of a stored entry, as returned by [`Emberwood::find`].
#[derive(Debug)]
pub struct NodeView<'a, K, V> {
    pub key: &'a K,
    pub payload: Option<&'a V>,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Lookup,
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Occupied(NodeIndex),
    Vacant { parent: NodeIndex, side: Side },
}

#[derive(Debug, Clone)]
pub struct Emberwood<K, V = ()> {
    pub(crate) storage: Vec<EmberwoodNode<K, V>>,
    pub(crate) root: NodeIndex,
    free_head: NodeIndex,
    len: usize,
    validator: Option<Validator>,
}

impl<K, V> Emberwood<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    #[must_use]
    pub fn with_config(config: TreeConfig) -> Self {
        let mut storage = Vec::with_capacity(config.capacity + 1);
        storage.push(EmberwoodNode::nil());

        Self {
            storage,
            root: BLACK_NIL,
            free_head: BLACK_NIL,
            len: 0,
            validator: config.debug.then(Validator::new),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.storage.reserve(additional);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether this tree carries a [`Validator`], i.e. was built with `debug` set.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.validator.is_some()
    }

    /// Drops every entry. A debug tree's expected node count starts over at zero.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} nodes", self.len);

        self.storage.truncate(1);
        self.root = BLACK_NIL;
        self.free_head = BLACK_NIL;
        self.len = 0;

        if let Some(validator) = self.validator.as_mut() {
            validator.reset();
        }
    }

    /// Key at the far left or far right of the tree, `None` when empty.
    #[must_use]
    pub fn boundary(&self, which: Boundary) -> Option<&K> {
        if self.root == BLACK_NIL {
            return None;
        }

        let side = match which {
            Boundary::Lowest => Side::Left,
            Boundary::Highest => Side::Right,
        };

        self.node(self.extreme(self.root, side)).key.as_ref()
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &EmberwoodNode<K, V> {
        &self.storage[idx.0]
    }

    fn node_mut(&mut self, idx: NodeIndex) -> &mut EmberwoodNode<K, V> {
        &mut self.storage[idx.0]
    }

    pub(crate) fn is_nil(&self, idx: NodeIndex) -> bool {
        idx == BLACK_NIL
    }

    fn set_child(&mut self, parent: NodeIndex, side: Side, child: NodeIndex) {
        self.node_mut(parent).children[side as usize] = child;
    }

    fn extreme(&self, from: NodeIndex, side: Side) -> NodeIndex {
        let mut current = from;
        while !self.is_nil(self.node(current).child(side)) {
            current = self.node(current).child(side);
        }

        current
    }

    fn allocate(&mut self, node: EmberwoodNode<K, V>) -> NodeIndex {
        if self.is_nil(self.free_head) {
            self.storage.push(node);
            return NodeIndex(self.storage.len() - 1);
        }

        let idx = self.free_head;
        self.free_head = self.node(idx).parent;
        self.storage[idx.0] = node;

        idx
    }

    fn release(&mut self, idx: NodeIndex) -> EmberwoodNode<K, V> {
        let vacated = EmberwoodNode {
            parent: self.free_head,
            ..EmberwoodNode::nil()
        };
        self.free_head = idx;

        mem::replace(&mut self.storage[idx.0], vacated)
    }

    /// Promotes the child opposite to `side` into `center`'s position.
    fn rotate(&mut self, center: NodeIndex, side: Side) {
        let grandparent_idx = self.node(center).parent;
        let promoted_idx = self.node(center).child(side.opposite());

        let c_idx = self.node(promoted_idx).child(side);

        self.set_child(center, side.opposite(), c_idx);
        if !self.is_nil(c_idx) {
            self.node_mut(c_idx).parent = center;
        }

        self.set_child(promoted_idx, side, center);
        self.node_mut(center).parent = promoted_idx;
        self.node_mut(promoted_idx).parent = grandparent_idx;

        if self.is_nil(grandparent_idx) {
            self.root = promoted_idx;
        } else {
            let from_grandparent = self.node(grandparent_idx).side_of(center);
            self.set_child(grandparent_idx, from_grandparent, promoted_idx);
        }
    }
}

impl<K: Ord + fmt::Debug, V> Emberwood<K, V> {
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_ok()
    }

    pub fn find(&self, key: &K) -> Result<NodeView<'_, K, V>, TreeError> {
        let Slot::Occupied(idx) = self.locate(key, Intent::Lookup)? else {
            return Err(TreeError::NotFound(format!("{key:?}")));
        };

        let node = self.node(idx);
        Ok(NodeView {
            key: node.key.as_ref().ok_or(StructuralViolation::CorruptNil)?,
            payload: node.payload.as_ref(),
            color: node.color,
        })
    }

    /// Mutable access to the payload slot stored under `key`.
    pub fn payload_mut(&mut self, key: &K) -> Result<&mut Option<V>, TreeError> {
        let Slot::Occupied(idx) = self.locate(key, Intent::Lookup)? else {
            return Err(TreeError::NotFound(format!("{key:?}")));
        };

        Ok(&mut self.node_mut(idx).payload)
    }

    pub fn update(&mut self, key: &K, payload: Option<V>) -> Result<(), TreeError> {
        *self.payload_mut(key)? = payload;
        debug!("updated payload of key {key:?}");

        Ok(())
    }

    pub fn insert(&mut self, key: K, payload: Option<V>) -> Result<(), TreeError> {
        let Slot::Vacant { parent, side } = self.locate(&key, Intent::Insert)? else {
            return Err(TreeError::DuplicateKey(format!("{key:?}")));
        };

        debug!("inserting key {key:?}");
        let new_node_pos = self.allocate(EmberwoodNode::new_isolated(key, payload, parent));
        self.len += 1;

        if self.is_nil(parent) {
            self.root = new_node_pos;
        } else {
            self.set_child(parent, side, new_node_pos);
        }

        self.fix_red_violation(new_node_pos);

        Ok(())
    }

    pub fn delete(&mut self, key: &K) -> Result<(), TreeError> {
        self.remove(key).map(|_| ())
    }

    /// Removes `key`, handing back the stored key and payload.
    pub fn remove(&mut self, key: &K) -> Result<(K, Option<V>), TreeError> {
        let Slot::Occupied(target) = self.locate(key, Intent::Delete)? else {
            return Err(TreeError::NotFound(format!("{key:?}")));
        };

        debug!("deleting key {key:?}");
        let target_node = self.node(target);
        let excised = if !self.is_nil(target_node.left_child())
            && !self.is_nil(target_node.right_child())
        {
            self.extreme(target_node.right_child(), Side::Left)
        } else {
            target
        };

        let excised_node = self.node(excised);
        let parent = excised_node.parent;
        let excised_color = excised_node.color;
        let child = if self.is_nil(excised_node.left_child()) {
            excised_node.right_child()
        } else {
            excised_node.left_child()
        };

        if !self.is_nil(child) {
            self.node_mut(child).parent = parent;
        }
        if self.is_nil(parent) {
            self.root = child;
        } else {
            let side = self.node(parent).side_of(excised);
            self.set_child(parent, side, child);
        }

        let mut removed = self.release(excised);
        self.len -= 1;

        // the successor's entry moves into the target, the target's entry leaves the tree
        if excised != target {
            let target_node = self.node_mut(target);
            mem::swap(&mut target_node.key, &mut removed.key);
            mem::swap(&mut target_node.payload, &mut removed.payload);
        }

        if self.is_nil(parent) {
            if !self.is_nil(child) {
                self.node_mut(child).color = Color::Black;
            }
        } else if excised_color == Color::Black {
            self.fix_black_deficit(child, parent);
        }

        let key = removed.key.ok_or(StructuralViolation::CorruptNil)?;
        Ok((key, removed.payload))
    }

    fn locate(&self, key: &K, intent: Intent) -> Result<Slot, TreeError> {
        let mut current_node = self.root;
        let mut parent_node = BLACK_NIL;
        let mut side = Side::Left;

        while !self.is_nil(current_node) {
            let curr_node_storage = self.node(current_node);
            let stored = curr_node_storage
                .key
                .as_ref()
                .ok_or(StructuralViolation::CorruptNil)?;

            match key.cmp(stored) {
                Ordering::Less => side = Side::Left,
                Ordering::Greater => side = Side::Right,
                Ordering::Equal => {
                    return match intent {
                        Intent::Insert => Err(TreeError::DuplicateKey(format!("{key:?}"))),
                        Intent::Lookup | Intent::Delete => Ok(Slot::Occupied(current_node)),
                    };
                }
            }

            parent_node = current_node;
            current_node = curr_node_storage.child(side);
        }

        match intent {
            Intent::Insert => Ok(Slot::Vacant {
                parent: parent_node,
                side,
            }),
            Intent::Lookup | Intent::Delete => Err(TreeError::NotFound(format!("{key:?}"))),
        }
    }

    fn fix_red_violation(&mut self, start_node_idx: NodeIndex) {
        let mut curr_node = start_node_idx;
        while self.node(self.node(curr_node).parent).color == Color::Red {
            let mut parent_idx = self.node(curr_node).parent;
            let grandparent_idx = self.node(parent_idx).parent;

            if self.is_nil(grandparent_idx) {
                self.node_mut(parent_idx).color = Color::Black;
                break;
            }

            let parent_side = self.node(grandparent_idx).side_of(parent_idx);
            let uncle = self.node(grandparent_idx).child(parent_side.opposite());

            if self.node(uncle).color == Color::Red {
                trace!("insert fixup: red uncle, recoloring below {grandparent_idx:?}");
                self.node_mut(parent_idx).color = Color::Black;
                self.node_mut(uncle).color = Color::Black;
                self.node_mut(grandparent_idx).color = Color::Red;

                curr_node = grandparent_idx;
                continue;
            }

            if self.node(parent_idx).child(parent_side.opposite()) == curr_node {
                trace!("insert fixup: inner child, rotating {parent_idx:?}");
                self.rotate(parent_idx, parent_side);

                curr_node = parent_idx;
                parent_idx = self.node(curr_node).parent;
            }

            trace!("insert fixup: outer child, rotating {grandparent_idx:?}");
            self.node_mut(parent_idx).color = Color::Black;
            self.node_mut(grandparent_idx).color = Color::Red;
            self.rotate(grandparent_idx, parent_side.opposite());
        }

        let root = self.root;
        if !self.is_nil(root) {
            self.node_mut(root).color = Color::Black;
        }
    }

    /// Restores black heights after a black node was spliced out above `start`.
    ///
    /// `start` may be the nil terminator, so its parent is tracked here instead of being read
    /// back from the shared sentinel.
    fn fix_black_deficit(&mut self, start: NodeIndex, start_parent: NodeIndex) {
        let mut focus = start;
        let mut parent = start_parent;

        while focus != self.root && self.node(focus).color == Color::Black {
            let side = self.node(parent).side_of(focus);
            let far = side.opposite();
            let mut sibling = self.node(parent).child(far);

            if self.node(sibling).color == Color::Red {
                trace!("delete fixup: red sibling {sibling:?}");
                self.node_mut(sibling).color = Color::Black;
                self.node_mut(parent).color = Color::Red;
                self.rotate(parent, side);
                sibling = self.node(parent).child(far);
            }

            let near_child = self.node(sibling).child(side);
            let far_child = self.node(sibling).child(far);

            if self.node(near_child).color == Color::Black
                && self.node(far_child).color == Color::Black
            {
                trace!("delete fixup: black nephews, moving deficit to {parent:?}");
                self.node_mut(sibling).color = Color::Red;
                focus = parent;
                parent = self.node(focus).parent;
                continue;
            }

            if self.node(far_child).color == Color::Black {
                trace!("delete fixup: red near nephew, rotating {sibling:?}");
                self.node_mut(near_child).color = Color::Black;
                self.node_mut(sibling).color = Color::Red;
                self.rotate(sibling, far);
                sibling = self.node(parent).child(far);
            }

            trace!("delete fixup: red far nephew, rotating {parent:?}");
            let far_child = self.node(sibling).child(far);
            let parent_color = self.node(parent).color;
            self.node_mut(far_child).color = Color::Black;
            self.node_mut(sibling).color = parent_color;
            self.node_mut(parent).color = Color::Black;
            self.rotate(parent, side);

            focus = self.root;
        }

        if !self.is_nil(focus) {
            self.node_mut(focus).color = Color::Black;
        }
    }

    /// Checks the tree with its [`Validator`] after recording `mutation`.
    ///
    /// A tree built without `debug` has no validator and always passes.
    pub fn validate(&mut self, mutation: Option<Mutation>) -> Result<(), TreeError> {
        let Some(mut validator) = self.validator.take() else {
            return Ok(());
        };

        if let Some(mutation) = mutation {
            validator.record(mutation);
        }
        let outcome = validator.check(self);
        self.validator = Some(validator);

        Ok(outcome?)
    }
}

impl<K, V> Default for Emberwood<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
