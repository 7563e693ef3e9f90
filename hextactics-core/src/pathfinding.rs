//! Generic shortest-path search
//!
//! Uniform-cost / A* graph search over any [`SearchDomain`]. Nodes live in an
//! arena and refer to their parent by index.
//!
//! A state is marked explored as soon as it is generated, not when it is
//! expanded. A cheaper route to a state still waiting in the frontier
//! replaces it, but a state that has already been expanded is never
//! reopened. With an admissible but inconsistent heuristic the search can
//! therefore keep a costlier path.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::grid::Grid;
use crate::hex::HexCoord;

/// Adapter describing a shortest path problem
pub trait SearchDomain {
    type State: Clone + Eq + Hash;
    type Action: Clone + PartialEq;

    /// Estimate of the remaining cost. Must never overestimate.
    fn heuristic(&self, from: &Self::State, to: &Self::State) -> f32;

    /// Legal actions from a state
    fn expand(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Cost of taking `action` in `state`
    fn actual_cost(&self, state: &Self::State, action: &Self::Action) -> f32;

    /// State reached by taking `action` in `state`
    fn apply_action(&self, state: &Self::State, action: &Self::Action) -> Self::State;

    /// Goal test
    fn same_state(&self, a: &Self::State, b: &Self::State) -> bool;

    /// Sentinel action of the root node. Never part of a returned path.
    fn default_action(&self) -> Self::Action;
}

// ============================================================================
// SEARCH NODES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug)]
struct SearchNode<S, A> {
    parent: Option<NodeId>,
    /// Cost so far
    g: f32,
    /// g + heuristic
    f: f32,
    state: S,
    action: A,
}

/// Frontier entry, ordered so the heap pops the lowest `f` first and
/// breaks ties in insertion order
#[derive(Debug)]
struct FrontierEntry {
    f: f32,
    seq: u64,
    node: NodeId,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================================
// SEARCH
// ============================================================================

/// Shortest path search over a domain adapter
pub struct ShortestPathSearch<D> {
    domain: D,
}

impl<D: SearchDomain> ShortestPathSearch<D> {
    pub fn new(domain: D) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    /// Actions leading from `from` to `to`, oldest first.
    ///
    /// Returns `None` when the goal cannot be reached and an empty path when
    /// `from` already is the goal.
    pub fn shortest_path(&self, from: &D::State, to: &D::State) -> Option<Vec<D::Action>> {
        let mut nodes: Vec<SearchNode<D::State, D::Action>> = Vec::new();
        let mut frontier = BinaryHeap::new();
        let mut in_frontier: FxHashMap<D::State, NodeId> = FxHashMap::default();
        let mut explored: FxHashSet<D::State> = FxHashSet::default();
        let mut seq = 0u64;

        nodes.push(SearchNode {
            parent: None,
            g: 0.0,
            f: 0.0,
            state: from.clone(),
            action: self.domain.default_action(),
        });
        frontier.push(FrontierEntry { f: 0.0, seq, node: NodeId(0) });
        in_frontier.insert(from.clone(), NodeId(0));

        while let Some(entry) = frontier.pop() {
            let node_id = entry.node;
            let state = nodes[node_id.0].state.clone();

            // Replaced by a cheaper node, or already expanded
            if in_frontier.get(&state) != Some(&node_id) {
                continue;
            }
            in_frontier.remove(&state);

            if self.domain.same_state(&state, to) {
                return Some(self.build_solution(&nodes, node_id));
            }
            explored.insert(state.clone());

            for action in self.domain.expand(&state) {
                let child = self.domain.apply_action(&state, &action);
                let frontier_node = in_frontier.get(&child).copied();

                let candidate = match frontier_node {
                    None if explored.contains(&child) => continue,
                    None => None,
                    Some(existing) => Some(existing),
                };

                let node = self.create_node(&nodes, node_id, action, child.clone(), to);
                if let Some(existing) = candidate {
                    if nodes[existing.0].f <= node.f {
                        continue;
                    }
                }

                seq += 1;
                let id = NodeId(nodes.len());
                frontier.push(FrontierEntry { f: node.f, seq, node: id });
                nodes.push(node);
                in_frontier.insert(child.clone(), id);
                explored.insert(child);
            }
        }

        None
    }

    fn create_node(
        &self,
        nodes: &[SearchNode<D::State, D::Action>],
        parent: NodeId,
        action: D::Action,
        child: D::State,
        goal: &D::State,
    ) -> SearchNode<D::State, D::Action> {
        let parent_node = &nodes[parent.0];
        let g = parent_node.g + self.domain.actual_cost(&parent_node.state, &action);
        let f = g + self.domain.heuristic(&child, goal);
        SearchNode {
            parent: Some(parent),
            g,
            f,
            state: child,
            action,
        }
    }

    fn build_solution(
        &self,
        nodes: &[SearchNode<D::State, D::Action>],
        goal: NodeId,
    ) -> Vec<D::Action> {
        let sentinel = self.domain.default_action();
        let mut path = Vec::new();
        let mut current = Some(goal);
        while let Some(id) = current {
            let node = &nodes[id.0];
            if node.action != sentinel {
                path.push(node.action.clone());
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Summed cost of applying `path` starting at `from`
    pub fn path_cost(&self, from: &D::State, path: &[D::Action]) -> f32 {
        let mut state = from.clone();
        let mut total = 0.0;
        for action in path {
            total += self.domain.actual_cost(&state, action);
            state = self.domain.apply_action(&state, action);
        }
        total
    }
}

// ============================================================================
// HEX GRID ADAPTER
// ============================================================================

/// Walks passable tiles of a grid. Actions are the coordinates stepped onto.
pub struct HexPathDomain<'a> {
    grid: &'a Grid,
}

impl<'a> HexPathDomain<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }
}

impl SearchDomain for HexPathDomain<'_> {
    type State = HexCoord;
    type Action = HexCoord;

    fn heuristic(&self, from: &HexCoord, to: &HexCoord) -> f32 {
        from.distance_to(*to) as f32
    }

    fn expand(&self, state: &HexCoord) -> Vec<HexCoord> {
        state
            .neighbors()
            .into_iter()
            .filter(|n| self.grid.get_tile(*n).is_some_and(|t| t.is_passable()))
            .collect()
    }

    fn actual_cost(&self, _state: &HexCoord, action: &HexCoord) -> f32 {
        self.grid
            .get_tile(*action)
            .map_or(f32::INFINITY, |t| t.movement_cost() as f32)
    }

    fn apply_action(&self, _state: &HexCoord, action: &HexCoord) -> HexCoord {
        *action
    }

    fn same_state(&self, a: &HexCoord, b: &HexCoord) -> bool {
        a == b
    }

    fn default_action(&self) -> HexCoord {
        HexCoord::INVALID
    }
}

/// Shortest walk across `grid`, excluding the start hex
pub fn find_hex_path(grid: &Grid, from: HexCoord, to: HexCoord) -> Option<Vec<HexCoord>> {
    ShortestPathSearch::new(HexPathDomain::new(grid)).shortest_path(&from, &to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_three_by_three_straight_path() {
        let grid = Grid::new(3, 3);
        let path = find_hex_path(&grid, HexCoord::new(0, 0), HexCoord::new(2, 0)).unwrap();
        assert_eq!(path, vec![HexCoord::new(1, 0), HexCoord::new(2, 0)]);

        let search = ShortestPathSearch::new(HexPathDomain::new(&grid));
        assert_eq!(search.path_cost(&HexCoord::new(0, 0), &path), 2.0);
    }

    #[test]
    fn test_path_to_self_is_empty() {
        let grid = Grid::new(3, 3);
        let path = find_hex_path(&grid, HexCoord::new(1, 1), HexCoord::new(1, 1));
        assert_eq!(path, Some(vec![]));
    }

    #[test]
    fn test_no_path() {
        let mut grid = Grid::new(4, 4);
        for n in HexCoord::new(0, 0).neighbors() {
            if grid.is_valid(n) {
                grid.set_passable(n, false).unwrap();
            }
        }
        assert_eq!(find_hex_path(&grid, HexCoord::new(0, 0), HexCoord::new(2, 2)), None);
        // Goal off the board
        assert_eq!(find_hex_path(&grid, HexCoord::new(2, 2), HexCoord::new(9, 9)), None);
    }

    #[test]
    fn test_path_avoids_occupied() {
        let mut grid = Grid::new(5, 3);
        grid.set_occupant(HexCoord::new(1, 0), crate::unit::UnitId(0)).unwrap();
        let path = find_hex_path(&grid, HexCoord::new(0, 0), HexCoord::new(2, 0)).unwrap();
        assert!(!path.contains(&HexCoord::new(1, 0)));
        assert_eq!(path.last(), Some(&HexCoord::new(2, 0)));
        // Consecutive steps are adjacent
        let mut previous = HexCoord::new(0, 0);
        for step in &path {
            assert!(previous.is_adjacent(*step));
            previous = *step;
        }
    }

    #[test]
    fn test_cost_matches_exhaustive_search() {
        for seed in 0..40u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let config = GridConfig {
                width: 5,
                height: 5,
                roadblock_chance: 0.35,
                hex_size: 1.0,
            };
            let mut grid = Grid::generate(&config, &mut rng);
            let coords: Vec<HexCoord> = grid.tiles().map(|t| t.coord()).collect();
            if seed % 2 == 1 {
                for c in &coords {
                    grid.set_movement_cost(*c, rng.gen_range(1..=3)).unwrap();
                }
            }
            let search = ShortestPathSearch::new(HexPathDomain::new(&grid));
            let from = coords[0];
            let best = exhaustive_costs(&grid, from);

            for to in &coords {
                match search.shortest_path(&from, to) {
                    Some(path) => {
                        let cost = search.path_cost(&from, &path);
                        let optimum = best.get(to).copied().expect("reachable by brute force");
                        assert!(cost <= optimum + 1e-4, "seed {} to {}: {} > {}", seed, to, cost, optimum);
                    }
                    None => assert!(!best.contains_key(to), "seed {} missed {}", seed, to),
                }
            }
        }
    }

    /// Relax every edge until nothing improves
    fn exhaustive_costs(grid: &Grid, from: HexCoord) -> FxHashMap<HexCoord, f32> {
        let mut best = FxHashMap::default();
        best.insert(from, 0.0f32);
        loop {
            let mut changed = false;
            let known: Vec<(HexCoord, f32)> = best.iter().map(|(k, v)| (*k, *v)).collect();
            for (coord, cost) in known {
                for n in coord.neighbors() {
                    let Some(tile) = grid.get_tile(n) else { continue };
                    if !tile.is_passable() {
                        continue;
                    }
                    let candidate = cost + tile.movement_cost() as f32;
                    if best.get(&n).map_or(true, |c| candidate < *c) {
                        best.insert(n, candidate);
                        changed = true;
                    }
                }
            }
            if !changed {
                return best;
            }
        }
    }

    /// Tiny graph with an admissible but inconsistent heuristic
    struct Detour;

    impl SearchDomain for Detour {
        type State = char;
        type Action = char;

        fn heuristic(&self, from: &char, _to: &char) -> f32 {
            match from {
                'B' => 4.0,
                _ => 0.0,
            }
        }

        fn expand(&self, state: &char) -> Vec<char> {
            match state {
                'S' => vec!['A', 'B'],
                'B' => vec!['A'],
                'A' => vec!['G'],
                _ => vec![],
            }
        }

        fn actual_cost(&self, state: &char, action: &char) -> f32 {
            match (state, action) {
                ('S', 'A') => 4.0,
                ('S', 'B') => 1.0,
                ('B', 'A') => 1.0,
                ('A', 'G') => 4.0,
                _ => f32::INFINITY,
            }
        }

        fn apply_action(&self, _state: &char, action: &char) -> char {
            *action
        }

        fn same_state(&self, a: &char, b: &char) -> bool {
            a == b
        }

        fn default_action(&self) -> char {
            '\0'
        }
    }

    #[test]
    fn test_expanded_states_are_not_reopened() {
        // S->B->A->G costs 6, but A is expanded through S->A before B is,
        // so the search keeps S->A->G at cost 8.
        let search = ShortestPathSearch::new(Detour);
        let path = search.shortest_path(&'S', &'G').unwrap();
        assert_eq!(path, vec!['A', 'G']);
        assert_eq!(search.path_cost(&'S', &path), 8.0);
    }

    /// Same graph with a consistent heuristic finds the cheap route
    struct DetourConsistent;

    impl SearchDomain for DetourConsistent {
        type State = char;
        type Action = char;

        fn heuristic(&self, _from: &char, _to: &char) -> f32 {
            0.0
        }

        fn expand(&self, state: &char) -> Vec<char> {
            Detour.expand(state)
        }

        fn actual_cost(&self, state: &char, action: &char) -> f32 {
            Detour.actual_cost(state, action)
        }

        fn apply_action(&self, state: &char, action: &char) -> char {
            Detour.apply_action(state, action)
        }

        fn same_state(&self, a: &char, b: &char) -> bool {
            a == b
        }

        fn default_action(&self) -> char {
            '\0'
        }
    }

    #[test]
    fn test_frontier_node_replaced_by_cheaper_route() {
        let search = ShortestPathSearch::new(DetourConsistent);
        let path = search.shortest_path(&'S', &'G').unwrap();
        assert_eq!(path, vec!['B', 'A', 'G']);
        assert_eq!(search.path_cost(&'S', &path), 6.0);
    }
}
