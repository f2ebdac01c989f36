//! Barnes-Hut quadtree.
//!
//! Rebuilt from scratch every step over the massive nodes, then walked by
//! the repulsion solvers. Branches are stored in a flat arena and addressed
//! by index, so a rebuild reuses the allocation from the previous step.
//!
//! Aggregates (mass, center of mass, widest member) are maintained
//! incrementally along the insertion path rather than in a separate
//! bottom-up pass.

use crate::rng::SolverRng;
use lodestone_core::{GraphView, NodeId};

/// Lower bound on the root region's side, guarding the reciprocal against
/// a zero-area bounding box.
const MIN_TREE_SIZE: f64 = 1e-5;

/// Index of a branch in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchIx(pub usize);

/// What a branch currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// No node in this region yet.
    Empty,
    /// Exactly one node; its id is kept so a later arrival can displace it
    /// into a child.
    Single(NodeId),
    /// Subdivided into four children, ordered NW, NE, SW, SE.
    Split([BranchIx; 4]),
}

/// One square region of the tree.
#[derive(Debug, Clone)]
pub struct Branch {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Side length of the region.
    pub size: f64,
    /// Reciprocal of `size`, precomputed for the admissibility test.
    pub calc_size: f64,
    /// Total mass of the nodes in this region.
    pub mass: f64,
    /// Center of mass, valid whenever `mass > 0`.
    pub com_x: f64,
    pub com_y: f64,
    /// Widest node seen in this region, for overlap avoidance.
    pub max_width: f64,
    /// Depth below the root.
    pub level: u32,
    pub occupancy: Occupancy,
}

impl Branch {
    fn new(min_x: f64, min_y: f64, size: f64, level: u32) -> Self {
        Self {
            min_x,
            max_x: min_x + size,
            min_y,
            max_y: min_y + size,
            size,
            calc_size: 1.0 / size,
            mass: 0.0,
            com_x: 0.0,
            com_y: 0.0,
            max_width: 0.0,
            level,
            occupancy: Occupancy::Empty,
        }
    }

    #[cfg(test)]
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// The assembled tree. `build` is the only way to get a populated one.
#[derive(Debug, Default)]
pub struct BarnesHutTree {
    arena: Vec<Branch>,
}

impl BarnesHutTree {
    /// Root branch, if the tree holds anything.
    pub fn root(&self) -> Option<&Branch> {
        self.arena.first()
    }

    /// Branch by arena index.
    pub fn branch(&self, ix: BranchIx) -> &Branch {
        &self.arena[ix.0]
    }

    /// Number of branches in the arena.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Build the tree over `ids`. Nodes with zero mass are skipped; they
    /// feel repulsion but exert none.
    ///
    /// Takes the graph mutably because a node landing on the exact
    /// coordinates of an already-placed node is jittered to a nearby
    /// position instead of being inserted. It participates again on the
    /// next rebuild from its new spot.
    pub fn build(graph: &mut GraphView, ids: &[NodeId], rng: &mut SolverRng) -> Self {
        let mut tree = Self::default();

        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        let mut massive = 0usize;
        for id in ids {
            let Some(node) = graph.node(*id) else { continue };
            if !node.is_massive() {
                continue;
            }
            massive += 1;
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }
        if massive == 0 {
            return tree;
        }

        // Pad the shorter axis so the root region is square. Extreme nodes
        // sit exactly on the boundary; quadrant routing compares against
        // midlines only, so they still land in a child.
        let size_diff = (max_x - min_x) - (max_y - min_y);
        if size_diff > 0.0 {
            min_y -= 0.5 * size_diff;
            max_y += 0.5 * size_diff;
        } else {
            min_x += 0.5 * size_diff;
            max_x -= 0.5 * size_diff;
        }
        let root_size = MIN_TREE_SIZE.max(max_x - min_x);
        let half = 0.5 * root_size;
        let center_x = 0.5 * (min_x + max_x);
        let center_y = 0.5 * (min_y + max_y);

        let mut root = Branch::new(center_x - half, center_y - half, root_size, 0);
        // The root always starts subdivided; insertion then only ever deals
        // with child regions.
        root.occupancy = Occupancy::Split([BranchIx(0); 4]);
        tree.arena.push(root);
        let children = tree.split(BranchIx(0));
        tree.arena[0].occupancy = Occupancy::Split(children);

        for id in ids {
            if graph.node(*id).is_some_and(|node| node.is_massive()) {
                tree.place_in_tree(BranchIx(0), *id, graph, rng, true);
            }
        }
        tree
    }

    /// Allocate four equal child regions for `parent` and return their
    /// indices. Does not change the parent's occupancy.
    fn split(&mut self, parent: BranchIx) -> [BranchIx; 4] {
        let (min_x, min_y, size, level) = {
            let b = &self.arena[parent.0];
            (b.min_x, b.min_y, b.size, b.level)
        };
        // Children halve freely: any two distinct f64 coordinates are
        // eventually separated by a bisecting midpoint, and exact
        // coincidences take the jitter path before splitting. Flooring the
        // child size here would freeze the midpoint and recurse forever.
        let child_size = 0.5 * size;
        let mid_x = min_x + 0.5 * size;
        let mid_y = min_y + 0.5 * size;
        let base = self.arena.len();
        // NW, NE, SW, SE.
        self.arena.push(Branch::new(min_x, mid_y, child_size, level + 1));
        self.arena.push(Branch::new(mid_x, mid_y, child_size, level + 1));
        self.arena.push(Branch::new(min_x, min_y, child_size, level + 1));
        self.arena.push(Branch::new(mid_x, min_y, child_size, level + 1));
        [
            BranchIx(base),
            BranchIx(base + 1),
            BranchIx(base + 2),
            BranchIx(base + 3),
        ]
    }

    /// Fold a node's mass into a branch's aggregates.
    fn update_branch_mass(&mut self, ix: BranchIx, graph: &GraphView, id: NodeId) {
        let Some(node) = graph.node(id) else { return };
        let branch = &mut self.arena[ix.0];
        let total = branch.mass + node.mass;
        branch.com_x = (branch.com_x * branch.mass + node.x * node.mass) / total;
        branch.com_y = (branch.com_y * branch.mass + node.y * node.mass) / total;
        branch.mass = total;
        branch.max_width = branch.max_width.max(node.width);
    }

    /// Route a node into the correct quadrant of a split branch, updating
    /// the branch's aggregates on the way down unless `update_mass` is off
    /// (it is off when re-routing the displaced occupant of a freshly split
    /// branch, whose mass is already counted).
    fn place_in_tree(
        &mut self,
        ix: BranchIx,
        id: NodeId,
        graph: &mut GraphView,
        rng: &mut SolverRng,
        update_mass: bool,
    ) {
        if update_mass {
            self.update_branch_mass(ix, graph, id);
        }
        let Occupancy::Split(children) = self.arena[ix.0].occupancy else {
            return;
        };
        let (x, y) = {
            let Some(node) = graph.node(id) else { return };
            (node.x, node.y)
        };
        // The NW child's max bounds are the midlines of the parent region.
        let (mid_x, mid_y) = {
            let nw = &self.arena[children[0].0];
            (nw.max_x, nw.min_y)
        };
        let quadrant = if x < mid_x {
            if y >= mid_y {
                children[0]
            } else {
                children[2]
            }
        } else if y >= mid_y {
            children[1]
        } else {
            children[3]
        };
        self.place_in_region(quadrant, id, graph, rng);
    }

    fn place_in_region(
        &mut self,
        ix: BranchIx,
        id: NodeId,
        graph: &mut GraphView,
        rng: &mut SolverRng,
    ) {
        match self.arena[ix.0].occupancy {
            Occupancy::Empty => {
                self.update_branch_mass(ix, graph, id);
                self.arena[ix.0].occupancy = Occupancy::Single(id);
            }
            Occupancy::Single(resident) => {
                let same_spot = {
                    let new = graph.node(id);
                    let old = graph.node(resident);
                    match (new, old) {
                        (Some(n), Some(o)) => n.x == o.x && n.y == o.y,
                        _ => false,
                    }
                };
                if same_spot {
                    // Identical coordinates cannot be separated by
                    // subdivision. Nudge the newcomer off the spot and leave
                    // it out of this build.
                    let size = self.arena[ix.0].size;
                    if let Some(node) = graph.node_mut(id) {
                        node.x += rng.jitter(size.max(MIN_TREE_SIZE) * 0.1);
                        node.y += rng.jitter(size.max(MIN_TREE_SIZE) * 0.1);
                    }
                    return;
                }
                let children = self.split(ix);
                // Re-derive the resident's aggregates in the children; its
                // contribution at this level stays as-is.
                self.arena[ix.0].occupancy = Occupancy::Split(children);
                self.place_in_tree(ix, resident, graph, rng, false);
                self.place_in_tree(ix, id, graph, rng, true);
            }
            Occupancy::Split(_) => {
                self.place_in_tree(ix, id, graph, rng, true);
            }
        }
    }

    /// Walk the tree for `node_id` at `(x, y)`, invoking `apply` with the
    /// branch (or leaf node) aggregates for every admissible region. A
    /// branch is admissible when it is far enough away relative to its size:
    /// `distance * calc_size > theta_inverted`.
    ///
    /// `apply` receives `(mass, com_x, com_y, max_width)`; for a leaf these
    /// are the node's own mass, position, and width.
    pub fn for_each_interaction<F>(&self, node_id: NodeId, x: f64, y: f64, theta_inverted: f64, apply: &mut F)
    where
        F: FnMut(f64, f64, f64, f64),
    {
        if self.arena.is_empty() {
            return;
        }
        let mut stack = vec![BranchIx(0)];
        while let Some(ix) = stack.pop() {
            let branch = &self.arena[ix.0];
            if branch.mass <= 0.0 {
                continue;
            }
            match branch.occupancy {
                Occupancy::Empty => {}
                Occupancy::Single(resident) => {
                    if resident != node_id {
                        apply(branch.mass, branch.com_x, branch.com_y, branch.max_width);
                    }
                }
                Occupancy::Split(children) => {
                    let dx = branch.com_x - x;
                    let dy = branch.com_y - y;
                    let distance = (dx * dx + dy * dy).sqrt();
                    if distance * branch.calc_size > theta_inverted {
                        apply(branch.mass, branch.com_x, branch.com_y, branch.max_width);
                    } else {
                        stack.extend_from_slice(&children);
                    }
                }
            }
        }
    }
}
