use core::fmt;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use log::warn;

use crate::{
    BLACK_NIL, Color, Emberwood, EmberwoodNode, NodeIndex, Order, Side, StructuralViolation,
};

/// Kind of change made to the tree since the last validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Insert,
    Delete,
    Update,
}

/// Structural checker for [`Emberwood`].
///
/// Tracks how many nodes the tree should hold from the mutations it is told about, and compares
/// that against a full walk of the tree.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    reported: usize,
}

enum Frame<'a, K> {
    Enter {
        node: NodeIndex,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
    },
    Exit(NodeIndex),
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node count the next [`Validator::check`] expects to find.
    #[must_use]
    pub fn expected(&self) -> usize {
        self.reported
    }

    pub fn record(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Insert => self.reported += 1,
            Mutation::Delete => self.reported = self.reported.saturating_sub(1),
            Mutation::Update => {}
        }
    }

    pub(crate) fn reset(&mut self) {
        self.reported = 0;
    }

    /// Verifies every red-black and ordering invariant of `tree`, reporting the first violation.
    pub fn check<K: Ord + fmt::Debug, V>(
        &self,
        tree: &Emberwood<K, V>,
    ) -> Result<(), StructuralViolation> {
        let outcome = self.walk(tree);
        if let Err(violation) = &outcome {
            warn!("tree validation failed: {violation}");
        }

        outcome
    }

    fn walk<K: Ord + fmt::Debug, V>(
        &self,
        tree: &Emberwood<K, V>,
    ) -> Result<(), StructuralViolation> {
        let nil = tree.node(BLACK_NIL);
        if nil.color != Color::Black || nil.key.is_some() || nil.children != [BLACK_NIL; 2] {
            return Err(StructuralViolation::CorruptNil);
        }
        if tree.node(tree.root).color != Color::Black {
            return Err(StructuralViolation::RootNotBlack);
        }

        let mut visited = vec![false; tree.storage.len()];
        let mut black_heights: Vec<usize> = Vec::new();
        let mut actual = 0;

        let mut stack = vec![Frame::Enter {
            node: tree.root,
            lower: None,
            upper: None,
        }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter { node, lower, upper } => {
                    if tree.is_nil(node) {
                        black_heights.push(0);
                        continue;
                    }

                    let current = tree.node(node);
                    let key = current.key.as_ref().ok_or(StructuralViolation::CorruptNil)?;

                    if visited[node.0] {
                        return Err(StructuralViolation::CycleDetected(format!("{key:?}")));
                    }
                    visited[node.0] = true;
                    actual += 1;

                    if lower.is_some_and(|bound| key <= bound)
                        || upper.is_some_and(|bound| key >= bound)
                    {
                        return Err(StructuralViolation::OrderViolation(format!("{key:?}")));
                    }

                    for side in [Side::Left, Side::Right] {
                        Self::check_child(tree, node, current, side)?;
                    }

                    stack.push(Frame::Exit(node));
                    stack.push(Frame::Enter {
                        node: current.right_child(),
                        lower: Some(key),
                        upper,
                    });
                    stack.push(Frame::Enter {
                        node: current.left_child(),
                        lower,
                        upper: Some(key),
                    });
                }
                Frame::Exit(node) => {
                    // left subtree finished first, so its height sits below the right one
                    let right = black_heights.pop().unwrap_or_default();
                    let left = black_heights.pop().unwrap_or_default();
                    let current = tree.node(node);

                    if left != right {
                        return Err(StructuralViolation::BlackHeightMismatch(label(current)));
                    }

                    black_heights.push(left + usize::from(current.color == Color::Black));
                }
            }
        }

        if actual != self.reported {
            return Err(StructuralViolation::NodeCountMismatch {
                expected: self.reported,
                actual,
            });
        }

        Ok(())
    }

    fn check_child<K: Ord + fmt::Debug, V>(
        tree: &Emberwood<K, V>,
        idx: NodeIndex,
        node: &EmberwoodNode<K, V>,
        side: Side,
    ) -> Result<(), StructuralViolation> {
        let child_idx = node.child(side);
        if tree.is_nil(child_idx) {
            return Ok(());
        }

        let child = tree.node(child_idx);
        if node.color == Color::Red && child.color == Color::Red {
            return Err(StructuralViolation::RedRed(label(node)));
        }
        match EmberwoodNode::compare(child, node) {
            Ok(Some(found)) if found == side => {}
            Ok(_) => return Err(StructuralViolation::OrderViolation(label(node))),
            Err(_) => return Err(StructuralViolation::CorruptNil),
        }
        if child.parent != idx {
            return Err(StructuralViolation::ParentMismatch(label(node)));
        }

        Ok(())
    }
}

fn label<K: fmt::Debug, V>(node: &EmberwoodNode<K, V>) -> String {
    match &node.key {
        Some(key) => format!("{key:?}"),
        None => "nil".into(),
    }
}

impl<K, V> Emberwood<K, V> {
    /// In-order `(key, depth, color)` triples, for inspecting the tree's shape.
    #[must_use]
    pub fn display(&self) -> Vec<(&K, usize, Color)> {
        self.traversal(Order::InOrder)
            .map(|visit| (visit.key, visit.depth, visit.color))
            .collect()
    }
}
