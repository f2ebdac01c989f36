//! Directed level fill and its cyclic fallback.

use std::collections::HashMap;

use tracing::warn;

use lodestone_core::{GraphView, NodeId};

/// The slice of edge state level assignment needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEdgeView {
    pub connected: bool,
    pub from: NodeId,
    pub to: NodeId,
}

impl LevelEdgeView {
    fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// A node plus its incident edges, as seen by the level fill. The caller
/// decides which nodes are visible by which entries it puts in the map.
#[derive(Debug, Clone)]
pub struct LevelNodeView {
    pub id: NodeId,
    pub edges: Vec<LevelEdgeView>,
}

/// Build level views for every node of a graph.
pub fn level_views(graph: &GraphView) -> HashMap<NodeId, LevelNodeView> {
    graph
        .node_ids()
        .map(|id| {
            let edges = graph
                .edges_of(id)
                .iter()
                .filter_map(|edge_id| graph.edge(*edge_id))
                .map(|edge| LevelEdgeView {
                    connected: edge.connected,
                    from: edge.from,
                    to: edge.to,
                })
                .collect();
            (id, LevelNodeView { id, edges })
        })
        .collect()
}

/// Assign levels downward from the roots. Roots are nodes with no incoming
/// visible edge; they sit at level 0 and levels grow along edge direction.
/// A node reachable over several paths keeps the highest level found, so it
/// sits as far from the roots as its longest path demands.
///
/// Cyclic graphs fall back to [`fill_levels_cyclic`].
pub fn assign_levels_from_roots(
    nodes: &HashMap<NodeId, LevelNodeView>,
) -> HashMap<NodeId, i64> {
    fill_levels_by_direction(
        nodes,
        |node, nodes| visible_edges(node, nodes).all(|edge| edge.from == node.id),
        |edge, at| (edge.from == at).then_some(edge.to),
        |existing, candidate| existing.is_none_or(|level| candidate > level),
    )
}

/// Assign levels upward from the leaves. Leaves are nodes with no outgoing
/// visible edge; they sit at level 0 and levels grow against edge
/// direction. A node reachable over several paths keeps the lowest level,
/// pulling leaves onto a common bottom row.
pub fn assign_levels_from_leaves(
    nodes: &HashMap<NodeId, LevelNodeView>,
) -> HashMap<NodeId, i64> {
    fill_levels_by_direction(
        nodes,
        |node, nodes| visible_edges(node, nodes).all(|edge| edge.to == node.id),
        |edge, at| (edge.to == at).then_some(edge.from),
        |existing, candidate| existing.is_none_or(|level| candidate < level),
    )
}

/// An edge participates in the fill only if it is connected, is not a self
/// loop, and both endpoints are in the visible set.
fn visible_edges<'a>(
    node: &'a LevelNodeView,
    nodes: &'a HashMap<NodeId, LevelNodeView>,
) -> impl Iterator<Item = &'a LevelEdgeView> {
    node.edges.iter().filter(|edge| {
        edge.connected
            && !edge.is_self_loop()
            && nodes.contains_key(&edge.from)
            && nodes.contains_key(&edge.to)
    })
}

/// The shared directed fill. `is_entry` selects the starting nodes,
/// `target_of` maps an edge to the node it leads to from `at` (or `None`
/// when the edge points the wrong way), and `should_replace` decides
/// whether a freshly computed level wins over an existing one.
///
/// The walk carries a step budget of `Σ (1 + edge_count)` over the visible
/// nodes, a generous bound for any acyclic traversal. Exceeding it, or
/// finishing with unassigned nodes (a cycle unreachable from any entry),
/// abandons the directed result and reruns as [`fill_levels_cyclic`].
fn fill_levels_by_direction<E, T, R>(
    nodes: &HashMap<NodeId, LevelNodeView>,
    is_entry: E,
    target_of: T,
    should_replace: R,
) -> HashMap<NodeId, i64>
where
    E: Fn(&LevelNodeView, &HashMap<NodeId, LevelNodeView>) -> bool,
    T: Fn(&LevelEdgeView, NodeId) -> Option<NodeId>,
    R: Fn(Option<i64>, i64) -> bool,
{
    let budget: usize = nodes.values().map(|node| 1 + node.edges.len()).sum();
    let mut steps = 0usize;
    let mut levels: HashMap<NodeId, i64> = HashMap::new();

    let mut entry_ids: Vec<NodeId> = nodes
        .values()
        .filter(|node| is_entry(node, nodes))
        .map(|node| node.id)
        .collect();
    entry_ids.sort_unstable();

    for entry_id in entry_ids {
        levels.insert(entry_id, 0);
        let mut stack = vec![entry_id];
        while let Some(at) = stack.pop() {
            steps += 1;
            if steps > budget {
                warn!("level fill exceeded its step budget, treating graph as cyclic");
                return fill_levels_cyclic(nodes);
            }
            let candidate = levels[&at] + 1;
            let Some(node) = nodes.get(&at) else { continue };
            for edge in visible_edges(node, nodes) {
                let Some(target) = target_of(edge, at) else {
                    continue;
                };
                if should_replace(levels.get(&target).copied(), candidate) {
                    levels.insert(target, candidate);
                    stack.push(target);
                }
            }
        }
    }

    if levels.len() < nodes.len() {
        warn!(
            assigned = levels.len(),
            visible = nodes.len(),
            "level fill left nodes unreached, treating graph as cyclic"
        );
        return fill_levels_cyclic(nodes);
    }
    levels
}

/// Cycle-tolerant pass: visit every connected, visible, non-self edge once
/// (at its target side, targets in id order) and enforce only
/// `level[to] >= level[from] + 1` per visited edge.
/// Unassigned sources start at 0. No uniqueness or minimality is promised;
/// cyclic graphs have no well-defined level structure.
fn fill_levels_cyclic(nodes: &HashMap<NodeId, LevelNodeView>) -> HashMap<NodeId, i64> {
    let mut levels: HashMap<NodeId, i64> = HashMap::new();

    let mut ids: Vec<NodeId> = nodes.keys().copied().collect();
    ids.sort_unstable();

    for id in &ids {
        let Some(node) = nodes.get(id) else { continue };
        for edge in visible_edges(node, nodes) {
            // Each edge appears in both endpoints' lists; take it only at
            // its target.
            if edge.to != *id {
                continue;
            }
            let source_level = *levels.entry(edge.from).or_insert(0);
            let floor = source_level + 1;
            levels
                .entry(edge.to)
                .and_modify(|level| *level = (*level).max(floor))
                .or_insert(floor);
        }
    }

    // Nodes with no visible edges still get a level.
    for id in ids {
        levels.entry(id).or_insert(0);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn views(edges: &[(u64, u64)], extra_nodes: &[u64]) -> HashMap<NodeId, LevelNodeView> {
        let mut nodes: HashMap<NodeId, LevelNodeView> = HashMap::new();
        let mut ensure = |map: &mut HashMap<NodeId, LevelNodeView>, id: NodeId| {
            map.entry(id).or_insert(LevelNodeView {
                id,
                edges: Vec::new(),
            });
        };
        for &(from, to) in edges {
            let (from, to) = (NodeId(from), NodeId(to));
            let edge = LevelEdgeView {
                connected: true,
                from,
                to,
            };
            ensure(&mut nodes, from);
            ensure(&mut nodes, to);
            nodes.get_mut(&from).unwrap().edges.push(edge);
            nodes.get_mut(&to).unwrap().edges.push(edge);
        }
        for &id in extra_nodes {
            ensure(&mut nodes, NodeId(id));
        }
        nodes
    }

    fn level(levels: &HashMap<NodeId, i64>, id: u64) -> i64 {
        levels[&NodeId(id)]
    }

    #[test]
    fn chain_from_roots() {
        let levels = assign_levels_from_roots(&views(&[(1, 2), (2, 3)], &[]));
        assert_eq!(level(&levels, 1), 0);
        assert_eq!(level(&levels, 2), 1);
        assert_eq!(level(&levels, 3), 2);
    }

    #[test]
    fn chain_from_leaves_reverses_direction() {
        let levels = assign_levels_from_leaves(&views(&[(1, 2), (2, 3)], &[]));
        assert_eq!(level(&levels, 3), 0);
        assert_eq!(level(&levels, 2), 1);
        assert_eq!(level(&levels, 1), 2);
    }

    #[test]
    fn diamond_keeps_the_longest_path_from_roots() {
        // 1 -> 2 -> 4 and 1 -> 4 directly: node 4 sits below node 2.
        let levels = assign_levels_from_roots(&views(&[(1, 2), (2, 4), (1, 4)], &[]));
        assert_eq!(level(&levels, 1), 0);
        assert_eq!(level(&levels, 2), 1);
        assert_eq!(level(&levels, 4), 2);
    }

    #[test]
    fn diamond_keeps_the_shortest_path_from_leaves() {
        let levels = assign_levels_from_leaves(&views(&[(1, 2), (2, 4), (1, 4)], &[]));
        assert_eq!(level(&levels, 4), 0);
        assert_eq!(level(&levels, 2), 1);
        // Reached at 2 via the chain and at 1 via the direct edge.
        assert_eq!(level(&levels, 1), 1);
    }

    #[test]
    fn two_node_cycle_terminates_via_the_fallback() {
        let levels = assign_levels_from_roots(&views(&[(1, 2), (2, 1)], &[]));
        assert_eq!(levels.len(), 2);
        assert!(level(&levels, 2) >= level(&levels, 1) + 1);
    }

    #[test]
    fn cycle_reachable_from_an_entry_terminates() {
        // 9 -> 1 -> 2 -> 1: the walk would climb forever without the
        // budget.
        let levels = assign_levels_from_roots(&views(&[(9, 1), (1, 2), (2, 1)], &[]));
        assert_eq!(levels.len(), 3);
        assert!(level(&levels, 2) >= level(&levels, 1) + 1);
    }

    #[test]
    fn isolated_nodes_sit_at_level_zero() {
        let levels = assign_levels_from_roots(&views(&[(1, 2)], &[7]));
        assert_eq!(level(&levels, 7), 0);
        let levels = assign_levels_from_leaves(&views(&[(1, 2)], &[7]));
        assert_eq!(level(&levels, 7), 0);
    }

    #[test]
    fn disconnected_and_self_loop_edges_are_ignored() {
        let mut nodes = views(&[(1, 2), (2, 3)], &[]);
        let loop_edge = LevelEdgeView {
            connected: true,
            from: NodeId(2),
            to: NodeId(2),
        };
        nodes.get_mut(&NodeId(2)).unwrap().edges.push(loop_edge);
        let dead = LevelEdgeView {
            connected: false,
            from: NodeId(3),
            to: NodeId(1),
        };
        nodes.get_mut(&NodeId(3)).unwrap().edges.push(dead);
        nodes.get_mut(&NodeId(1)).unwrap().edges.push(dead);

        let levels = assign_levels_from_roots(&nodes);
        assert_eq!(level(&levels, 1), 0);
        assert_eq!(level(&levels, 2), 1);
        assert_eq!(level(&levels, 3), 2);
    }

    #[test]
    fn hidden_endpoint_makes_an_edge_invisible() {
        // Node 3 is not in the visible set; 2 -> 3 must not count as an
        // outgoing edge of node 2, so node 2 is still assigned.
        let mut nodes = views(&[(1, 2)], &[]);
        let half_hidden = LevelEdgeView {
            connected: true,
            from: NodeId(2),
            to: NodeId(3),
        };
        nodes.get_mut(&NodeId(2)).unwrap().edges.push(half_hidden);
        let levels = assign_levels_from_roots(&nodes);
        assert_eq!(levels.len(), 2);
        assert_eq!(level(&levels, 2), 1);
    }
}
