use core::str::FromStr;

use crate::{Color, Emberwood, EmberwoodNode, NodeIndex, TreeError};

/// Point at which a node is reported relative to its subtrees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    PreOrder,
    #[default]
    InOrder,
    PostOrder,
}

impl FromStr for Order {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre" | "preorder" => Ok(Order::PreOrder),
            "in" | "inorder" => Ok(Order::InOrder),
            "post" | "postorder" => Ok(Order::PostOrder),
            other => Err(TreeError::InvalidArgument(format!(
                "unknown traversal order '{other}'"
            ))),
        }
    }
}

/// A node as seen by a traversal. `depth` is 1 at the root.
#[derive(Debug)]
pub struct Visit<'a, K, V> {
    pub key: &'a K,
    pub color: Color,
    pub payload: Option<&'a V>,
    pub depth: usize,
}

// how the walk arrived at a node: from its parent, or back up from one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Descended,
    LeftDone,
    RightDone,
}

/// Walks the tree through parent and child links only, without recursion or an auxiliary stack.
///
/// Whether the walk is going down into or coming back up from a subtree is inferred by comparing
/// the previously visited node against the current node's children. The traversal borrows the tree,
/// so it cannot be restructured while a walk is in progress.
#[derive(Debug)]
pub struct Traversal<'a, K, V> {
    tree: &'a Emberwood<K, V>,
    order: Order,
    curr: NodeIndex,
    prev: Option<NodeIndex>,
    depth: usize,
}

impl<'a, K, V> Traversal<'a, K, V> {
    fn stage(&self, node: &EmberwoodNode<K, V>) -> Stage {
        match self.prev {
            None => Stage::Descended,
            Some(prev) if self.tree.node(prev).children.contains(&self.curr) => Stage::Descended,
            Some(prev) if prev == node.left_child() => Stage::LeftDone,
            Some(_) => Stage::RightDone,
        }
    }

    /// Next node to move to from `node`, and whether `node` is reported on this step.
    fn advance(&self, node: &EmberwoodNode<K, V>, stage: Stage) -> (NodeIndex, bool) {
        let mut report = false;

        if stage == Stage::Descended {
            report |= self.order == Order::PreOrder;
            if !self.tree.is_nil(node.left_child()) {
                return (node.left_child(), report);
            }
        }

        if stage <= Stage::LeftDone {
            report |= self.order == Order::InOrder;
            if !self.tree.is_nil(node.right_child()) {
                return (node.right_child(), report);
            }
        }

        report |= self.order == Order::PostOrder;
        (node.parent, report)
    }
}

impl<'a, K, V> Iterator for Traversal<'a, K, V> {
    type Item = Visit<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;

        while !tree.is_nil(self.curr) {
            let node = tree.node(self.curr);
            let stage = self.stage(node);

            if stage == Stage::Descended {
                self.depth += 1;
            } else {
                self.depth -= 1;
            }
            self.prev = Some(self.curr);

            let (next, report) = self.advance(node, stage);
            self.curr = next;

            if let (true, Some(key)) = (report, node.key.as_ref()) {
                return Some(Visit {
                    key,
                    color: node.color,
                    payload: node.payload.as_ref(),
                    depth: self.depth,
                });
            }
        }

        None
    }
}

impl<K, V> Emberwood<K, V> {
    /// Starts a fresh walk from the root.
    #[must_use]
    pub fn traversal(&self, order: Order) -> Traversal<'_, K, V> {
        Traversal {
            tree: self,
            order,
            curr: self.root,
            prev: None,
            depth: 0,
        }
    }

    /// Calls `callback` once per node, in `order`.
    pub fn traverse<F>(&self, mut callback: F, order: Order)
    where
        F: FnMut(Visit<'_, K, V>),
    {
        for visit in self.traversal(order) {
            callback(visit);
        }
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.traversal(Order::InOrder).map(|visit| visit.key)
    }

    /// Number of nodes on the longest root-to-leaf path, 0 when empty.
    #[must_use]
    pub fn height(&self) -> usize {
        self.traversal(Order::InOrder)
            .map(|visit| visit.depth)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Color, Emberwood, Order, TreeError};

    //          40B
    //     20B          60R
    //   10R  30R    50B   70B
    //                        80R
    fn sample() -> Emberwood<i64, u8> {
        let mut tree = Emberwood::new();
        for key in [40, 20, 60, 10, 30, 50, 70, 80] {
            tree.insert(key, Some(1)).unwrap();
        }
        tree
    }

    fn walk(tree: &Emberwood<i64, u8>, order: Order) -> Vec<(i64, usize)> {
        tree.traversal(order).map(|v| (*v.key, v.depth)).collect()
    }

    #[test]
    pub fn in_order_is_sorted_with_depths() {
        let tree = sample();
        assert_eq!(
            walk(&tree, Order::InOrder),
            vec![
                (10, 3),
                (20, 2),
                (30, 3),
                (40, 1),
                (50, 3),
                (60, 2),
                (70, 3),
                (80, 4)
            ]
        );
    }

    #[test]
    pub fn pre_order_visits_parents_first() {
        let keys: Vec<i64> = walk(&sample(), Order::PreOrder)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![40, 20, 10, 30, 60, 50, 70, 80]);
    }

    #[test]
    pub fn post_order_visits_children_first() {
        let keys: Vec<i64> = walk(&sample(), Order::PostOrder)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![10, 30, 20, 50, 80, 70, 60, 40]);
    }

    #[test]
    pub fn callback_sees_colors_and_payloads() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.traverse(
            |visit| seen.push((*visit.key, visit.color, visit.payload.copied())),
            Order::PreOrder,
        );

        assert_eq!(seen[0], (40, Color::Black, Some(1)));
        assert_eq!(seen[1], (20, Color::Black, Some(1)));
        assert_eq!(seen[4], (60, Color::Red, Some(1)));
        assert_eq!(seen.len(), 8);
    }

    #[test]
    pub fn traversal_restarts_from_root() {
        let tree = sample();
        let mut first = tree.traversal(Order::InOrder);
        first.next();
        first.next();

        assert_eq!(tree.traversal(Order::InOrder).next().map(|v| *v.key), Some(10));
        assert_eq!(tree.height(), 4);
    }

    #[test]
    pub fn empty_and_single_node_trees() {
        let mut tree = Emberwood::<i64>::new();
        assert_eq!(tree.traversal(Order::PostOrder).count(), 0);
        assert_eq!(tree.height(), 0);

        tree.insert(7, None).unwrap();
        for order in [Order::PreOrder, Order::InOrder, Order::PostOrder] {
            let visits: Vec<_> = tree.traversal(order).map(|v| (*v.key, v.depth)).collect();
            assert_eq!(visits, vec![(7, 1)]);
        }
    }

    #[test]
    pub fn order_parsing() {
        assert_eq!("pre".parse::<Order>(), Ok(Order::PreOrder));
        assert_eq!("PostOrder".parse::<Order>(), Ok(Order::PostOrder));
        assert!(matches!(
            "sideways".parse::<Order>(),
            Err(TreeError::InvalidArgument(_))
        ));
    }
}
