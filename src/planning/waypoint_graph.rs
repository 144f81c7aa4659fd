//! Shortest paths over an authored waypoint graph.
//!
//! Corridors are described by waypoints (map-local positions) joined by
//! undirected edges weighted with their Euclidean length. A query snaps the
//! start and goal to their nearest waypoints within `snap_radius` and runs
//! Dijkstra between them. If the goal is unreachable, the path to the
//! reachable waypoint closest to the goal is returned as a partial result.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use anyhow::{Result, bail};
use nalgebra::Vector3;
use tracing::debug;

use super::{PathPlanner, PlanOutcome};

/// Corners closer than this are merged when stitching start/goal onto the graph.
const MERGE_DISTANCE: f64 = 1e-6;

/// Priority queue entry (min-heap on cost).
#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    cost: f64,
    node: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.node == other.node
    }
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Waypoints and their adjacency.
#[derive(Debug, Clone, Default)]
pub struct WaypointGraph {
    nodes: Vec<Vector3<f64>>,
    /// adjacency[i] = [(neighbor, length), ...]
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl WaypointGraph {
    /// Build from waypoint positions and undirected edges given as index pairs.
    pub fn new(nodes: Vec<Vector3<f64>>, edges: &[(usize, usize)]) -> Result<Self> {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for &(a, b) in edges {
            if a >= nodes.len() || b >= nodes.len() {
                bail!(
                    "Edge ({}, {}) references a missing waypoint ({} waypoints)",
                    a,
                    b,
                    nodes.len()
                );
            }
            if a == b {
                continue;
            }
            let length = (nodes[b] - nodes[a]).norm();
            adjacency[a].push((b, length));
            adjacency[b].push((a, length));
        }
        Ok(Self { nodes, adjacency })
    }

    pub fn nodes(&self) -> &[Vector3<f64>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Nearest waypoint to `p` within `radius`.
    pub fn nearest(&self, p: &Vector3<f64>, radius: f64) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, (n - p).norm()))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
    }

    /// Single-source shortest distances and predecessors from `start`.
    fn search(&self, start: usize, goal: usize) -> (Vec<f64>, Vec<Option<usize>>) {
        let n = self.nodes.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        dist[start] = 0.0;

        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry {
            cost: 0.0,
            node: start,
        });

        while let Some(QueueEntry { cost, node }) = heap.pop() {
            if cost > dist[node] {
                continue;
            }
            if node == goal {
                break;
            }
            for &(neighbor, length) in &self.adjacency[node] {
                let candidate = cost + length;
                if candidate < dist[neighbor] {
                    dist[neighbor] = candidate;
                    prev[neighbor] = Some(node);
                    heap.push(QueueEntry {
                        cost: candidate,
                        node: neighbor,
                    });
                }
            }
        }
        (dist, prev)
    }

    /// Waypoint indices from `start` to `goal`, or `None` if disconnected.
    pub fn shortest_path(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        if start >= self.nodes.len() || goal >= self.nodes.len() {
            return None;
        }
        let (dist, prev) = self.search(start, goal);
        if !dist[goal].is_finite() {
            return None;
        }
        Some(walk_back(&prev, start, goal))
    }
}

/// Rebuild the node sequence from the predecessor array.
fn walk_back(prev: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match prev[current] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

fn push_corner(corners: &mut Vec<Vector3<f64>>, p: Vector3<f64>) {
    if corners
        .last()
        .is_none_or(|last| (last - p).norm() > MERGE_DISTANCE)
    {
        corners.push(p);
    }
}

/// [`PathPlanner`] over a [`WaypointGraph`].
#[derive(Debug, Clone)]
pub struct WaypointGraphPlanner {
    graph: WaypointGraph,
    snap_radius: f64,
}

impl WaypointGraphPlanner {
    pub fn new(graph: WaypointGraph, snap_radius: f64) -> Self {
        Self { graph, snap_radius }
    }

    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    pub fn snap_radius(&self) -> f64 {
        self.snap_radius
    }

    fn stitch(&self, start: &Vector3<f64>, nodes: &[usize], goal: Option<&Vector3<f64>>) -> Vec<Vector3<f64>> {
        let mut corners = Vec::with_capacity(nodes.len() + 2);
        push_corner(&mut corners, *start);
        for &i in nodes {
            push_corner(&mut corners, self.graph.nodes[i]);
        }
        if let Some(goal) = goal {
            push_corner(&mut corners, *goal);
        }
        corners
    }
}

impl PathPlanner for WaypointGraphPlanner {
    fn plan(&self, start: &Vector3<f64>, goal: &Vector3<f64>) -> PlanOutcome {
        let Some(from) = self.graph.nearest(start, self.snap_radius) else {
            debug!("Start is farther than {} m from any waypoint", self.snap_radius);
            return PlanOutcome::Failed;
        };
        let Some(to) = self.graph.nearest(goal, self.snap_radius) else {
            debug!("Goal is farther than {} m from any waypoint", self.snap_radius);
            return PlanOutcome::Failed;
        };

        let (dist, prev) = self.graph.search(from, to);
        if dist[to].is_finite() {
            let nodes = walk_back(&prev, from, to);
            return PlanOutcome::Complete(self.stitch(start, &nodes, Some(goal)));
        }

        // Goal unreachable: head for the reachable waypoint nearest to it.
        let closest = dist
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_finite())
            .map(|(i, _)| (i, (self.graph.nodes[i] - goal).norm()))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(from);
        let nodes = walk_back(&prev, from, closest);
        PlanOutcome::Partial(self.stitch(start, &nodes, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two corridors joined at a corner, plus an isolated room.
    ///
    /// ```text
    ///  3 (0,0,10) --- 2 (10,0,10)
    ///                 |
    ///  0 (0,0,0) ---- 1 (10,0,0)        4 (30,0,0)
    /// ```
    fn graph() -> WaypointGraph {
        WaypointGraph::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(10.0, 0.0, 10.0),
                Vector3::new(0.0, 0.0, 10.0),
                Vector3::new(30.0, 0.0, 0.0),
            ],
            &[(0, 1), (1, 2), (2, 3)],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_dangling_edge() {
        assert!(WaypointGraph::new(vec![Vector3::zeros()], &[(0, 3)]).is_err());
        assert_eq!(graph().edge_count(), 3);
    }

    #[test]
    fn test_shortest_path_follows_corridors() {
        assert_eq!(graph().shortest_path(0, 3), Some(vec![0, 1, 2, 3]));
        assert_eq!(graph().shortest_path(2, 2), Some(vec![2]));
        assert_eq!(graph().shortest_path(0, 4), None);
    }

    #[test]
    fn test_prefers_shorter_branch() {
        let g = WaypointGraph::new(
            vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(5.0, 0.0, 5.0),
                Vector3::new(10.0, 0.0, 0.0),
                Vector3::new(5.0, 0.0, 0.5),
            ],
            &[(0, 1), (1, 2), (0, 3), (3, 2)],
        )
        .unwrap();
        assert_eq!(g.shortest_path(0, 2), Some(vec![0, 3, 2]));
    }

    #[test]
    fn test_plan_stitches_start_and_goal() {
        let planner = WaypointGraphPlanner::new(graph(), 2.0);
        let start = Vector3::new(0.5, 0.0, 0.5);
        let goal = Vector3::new(1.0, 0.0, 10.0);

        let PlanOutcome::Complete(corners) = planner.plan(&start, &goal) else {
            panic!("expected a complete path");
        };
        assert_eq!(corners.first(), Some(&start));
        assert_eq!(corners.last(), Some(&goal));
        assert_eq!(corners.len(), 6);
    }

    #[test]
    fn test_plan_merges_coincident_corners() {
        let planner = WaypointGraphPlanner::new(graph(), 2.0);
        let start = Vector3::new(0.0, 0.0, 0.0);
        let goal = Vector3::new(10.0, 0.0, 0.0);

        assert_eq!(
            planner.plan(&start, &goal),
            PlanOutcome::Complete(vec![start, goal])
        );
    }

    #[test]
    fn test_plan_outside_snap_radius_fails() {
        let planner = WaypointGraphPlanner::new(graph(), 2.0);
        let far = Vector3::new(-20.0, 0.0, -20.0);
        assert_eq!(planner.plan(&far, &Vector3::zeros()), PlanOutcome::Failed);
    }

    #[test]
    fn test_unreachable_goal_is_partial() {
        let planner = WaypointGraphPlanner::new(graph(), 2.0);
        let start = Vector3::new(0.0, 0.0, 0.5);
        let goal = Vector3::new(30.0, 0.0, 1.0);

        let outcome = planner.plan(&start, &goal);
        assert!(outcome.usable_corners().is_none());
        let PlanOutcome::Partial(corners) = outcome else {
            panic!("expected a partial path");
        };
        // Node 1 is the reachable waypoint closest to the goal.
        assert_eq!(corners.last(), Some(&Vector3::new(10.0, 0.0, 0.0)));
    }
}
