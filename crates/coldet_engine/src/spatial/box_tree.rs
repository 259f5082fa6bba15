//! Box tree (bounding volume hierarchy) over a triangle list
//!
//! Every node carries a box that tightly bounds the triangles below it. Inner
//! nodes are split recursively around the mean triangle centroid until each
//! node holds a single triangle, or until a node cannot be split because all
//! of its triangles would land on the same side. Such a node keeps its
//! triangle list and is tested exhaustively during queries.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec3};
use crate::physics::collision::{BoundingBox, Triangle};

/// Rule used to choose the splitting axis of an inner node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitHeuristic {
    /// Split along the axis with the largest total centroid spread
    #[default]
    LargestSpread,
    /// Split along the axis that divides the triangles most evenly
    BestBalance,
}

/// A node of the box tree
#[derive(Debug, Clone)]
pub enum Node {
    /// Node with up to two children, or with a triangle list it could not split
    Inner {
        /// Box around all triangles below this node
        bounds: BoundingBox,
        /// Child holding triangles below the split point
        first: Option<Box<Node>>,
        /// Child holding the remaining triangles
        second: Option<Box<Node>>,
        /// Triangle indices, non-empty only when the node was not split
        triangles: Vec<u32>,
    },
    /// Node owning exactly one triangle
    Leaf {
        /// Box around the triangle
        bounds: BoundingBox,
        /// Index of the triangle in the model
        triangle: u32,
    },
}

impl Node {
    /// Box of this node
    pub fn bounds(&self) -> &BoundingBox {
        match self {
            Node::Inner { bounds, .. } | Node::Leaf { bounds, .. } => bounds,
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Triangles tested directly at this node
    pub fn triangles(&self) -> &[u32] {
        match self {
            Node::Inner { triangles, .. } => triangles,
            Node::Leaf { triangle, .. } => std::slice::from_ref(triangle),
        }
    }

    /// Present children in order, first before second
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        let (first, second) = match self {
            Node::Inner { first, second, .. } => (first.as_deref(), second.as_deref()),
            Node::Leaf { .. } => (None, None),
        };
        first.into_iter().chain(second)
    }

    /// Check if traversal can continue below this node
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            Node::Inner { first, second, .. } if first.is_some() || second.is_some()
        )
    }
}

/// Shape summary of a built tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total number of nodes
    pub nodes: usize,
    /// Number of single-triangle leaves
    pub leaves: usize,
    /// Number of inner nodes that kept a triangle list
    pub unsplit: usize,
    /// Longest root-to-leaf path, counted in nodes
    pub depth: usize,
}

/// Bounding volume hierarchy over the triangles of one model
#[derive(Debug, Clone)]
pub struct BoxTree {
    root: Node,
    heuristic: SplitHeuristic,
    stats: TreeStats,
}

impl BoxTree {
    /// Build the tree for `triangles`
    ///
    /// An empty triangle list gives a root with a degenerate box and nothing
    /// below it.
    pub fn build(triangles: &[Triangle], heuristic: SplitHeuristic) -> Self {
        let members: Vec<u32> = (0..triangles.len())
            .map(|i| u32::try_from(i).unwrap_or(u32::MAX))
            .collect();

        let (root, depth) = match members.len() {
            0 => (
                Node::Inner {
                    bounds: BoundingBox::default(),
                    first: None,
                    second: None,
                    triangles: Vec::new(),
                },
                0,
            ),
            1 => (leaf(triangles, 0), 1),
            _ => PendingNode::new(triangles, members).divide(triangles, heuristic),
        };

        let mut stats = TreeStats { depth, ..TreeStats::default() };
        walk(&root, &mut |node: &Node| {
            stats.nodes += 1;
            match node {
                Node::Leaf { .. } => stats.leaves += 1,
                Node::Inner { triangles, .. } if !triangles.is_empty() => stats.unsplit += 1,
                Node::Inner { .. } => {}
            }
        });

        log::debug!(
            "Built box tree over {} triangles ({:?}): {} nodes, {} leaves, {} unsplit, depth {}",
            triangles.len(),
            heuristic,
            stats.nodes,
            stats.leaves,
            stats.unsplit,
            stats.depth
        );

        Self { root, heuristic, stats }
    }

    /// Root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Heuristic the tree was built with
    pub fn heuristic(&self) -> SplitHeuristic {
        self.heuristic
    }

    /// Maximum depth reached while building
    pub fn depth(&self) -> usize {
        self.stats.depth
    }

    /// Shape summary
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Visit every node, parents before children
    pub fn visit<F: FnMut(&Node)>(&self, mut visitor: F) {
        walk(&self.root, &mut visitor);
    }
}

fn walk<F: FnMut(&Node)>(node: &Node, visitor: &mut F) {
    visitor(node);
    for child in node.children() {
        walk(child, visitor);
    }
}

fn leaf(triangles: &[Triangle], index: u32) -> Node {
    let triangle = &triangles[index as usize];
    Node::Leaf {
        bounds: BoundingBox::around([triangle]).unwrap_or_default(),
        triangle: index,
    }
}

/// Inner node under construction
struct PendingNode {
    bounds: BoundingBox,
    members: Vec<u32>,
    /// Mean centroid of `members`
    split_point: Vec3,
}

impl PendingNode {
    fn new(triangles: &[Triangle], members: Vec<u32>) -> Self {
        let bounds = BoundingBox::around(members.iter().map(|&i| &triangles[i as usize]))
            .unwrap_or_default();
        let sum = members
            .iter()
            .fold(Vec3::zeros(), |acc, &i| acc + triangles[i as usize].centroid());
        #[allow(clippy::cast_precision_loss)]
        let split_point = sum / members.len().max(1) as f64;

        Self { bounds, members, split_point }
    }

    /// Split this node recursively; returns the node and the depth reached
    fn divide(self, triangles: &[Triangle], heuristic: SplitHeuristic) -> (Node, usize) {
        let axis = match heuristic {
            SplitHeuristic::LargestSpread => Some(self.largest_spread_axis(triangles)),
            SplitHeuristic::BestBalance => self.best_balance_axis(triangles),
        };

        let Some(axis) = axis else {
            return self.unsplit();
        };

        let split = self.split_point[axis];
        let (below, above): (Vec<u32>, Vec<u32>) = self
            .members
            .iter()
            .partition(|&&i| triangles[i as usize].centroid()[axis] < split);

        if below.is_empty() || above.is_empty() {
            return self.unsplit();
        }

        let (first, first_depth) = child(triangles, below, heuristic);
        let (second, second_depth) = child(triangles, above, heuristic);

        // children on a flat axis are widened and may stick out of the tight box
        let bounds = first
            .iter()
            .chain(second.iter())
            .fold(self.bounds, |acc, node| acc.union(node.bounds()));

        let node = Node::Inner {
            bounds,
            first,
            second,
            triangles: Vec::new(),
        };
        (node, 1 + first_depth.max(second_depth))
    }

    fn unsplit(self) -> (Node, usize) {
        log::trace!(
            "Box tree node with {} triangles cannot be split",
            self.members.len()
        );
        let node = Node::Inner {
            bounds: self.bounds,
            first: None,
            second: None,
            triangles: self.members,
        };
        (node, 1)
    }

    /// Axis along which centroids spread the most from the split point
    fn largest_spread_axis(&self, triangles: &[Triangle]) -> usize {
        let spread = self.members.iter().fold(Vec3::zeros(), |acc, &i| {
            acc + (triangles[i as usize].centroid() - self.split_point).abs()
        });
        utils::dominant_axis(&spread)
    }

    /// Axis whose split is closest to half and half, `None` if no axis
    /// separates the triangles at all
    fn best_balance_axis(&self, triangles: &[Triangle]) -> Option<usize> {
        let total = self.members.len();
        let mut below = [0_usize; 3];
        for &i in &self.members {
            let centroid = triangles[i as usize].centroid();
            for (axis, count) in below.iter_mut().enumerate() {
                if centroid[axis] < self.split_point[axis] {
                    *count += 1;
                }
            }
        }

        let half = total / 2;
        (0..3)
            .filter(|&axis| below[axis] > 0 && below[axis] < total)
            .min_by_key(|&axis| below[axis].abs_diff(half))
    }
}

fn child(
    triangles: &[Triangle],
    members: Vec<u32>,
    heuristic: SplitHeuristic,
) -> (Option<Box<Node>>, usize) {
    match members.len() {
        0 => (None, 0),
        1 => (Some(Box::new(leaf(triangles, members[0]))), 1),
        _ => {
            let (node, depth) = PendingNode::new(triangles, members).divide(triangles, heuristic);
            (Some(Box::new(node)), depth)
        }
    }
}
