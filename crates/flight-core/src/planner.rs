//! 3-D grid route planner.
//!
//! Space is cut into cubic cells of `resolution_m`. Spherical obstacles are rasterized into a
//! set of occupied cells when added; no-fly zones stay as continuous boxes. A* runs over the
//! 26-connected cell lattice, generating neighbors as the frontier reaches them, inside a cube
//! of half-width `grid_size_m` around the origin.

use crate::config::PlannerConfig;
use crate::models::{NoFlyZone, Obstacle, PlanOutcome, RoutePlan};
use crate::spatial::{cross, norm, path_length, sub, Point3};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::{debug, warn};

/// Integer grid coordinate: `floor(coord / resolution)` per axis.
pub type Cell = (i64, i64, i64);

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cell: Cell,
    g_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // Ties on f go to the deeper node so straight corridors are followed without fanning out.
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| self.cell.cmp(&other.cell))
    }
}

struct SearchResult {
    cells: Option<Vec<Cell>>,
    nodes_visited: usize,
}

/// Obstacle-aware route planner. Obstacles and zones are permanent once added.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    config: PlannerConfig,
    obstacles: Vec<Obstacle>,
    occupied: HashSet<Cell>,
    no_fly_zones: Vec<NoFlyZone>,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl PathPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            obstacles: Vec::new(),
            occupied: HashSet::new(),
            no_fly_zones: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn no_fly_zones(&self) -> &[NoFlyZone] {
        &self.no_fly_zones
    }

    /// Number of distinct cells blocked by obstacles.
    pub fn occupied_cell_count(&self) -> usize {
        self.occupied.len()
    }

    pub fn to_cell(&self, point: Point3) -> Cell {
        let res = self.config.resolution_m;
        (
            (point.0 / res).floor() as i64,
            (point.1 / res).floor() as i64,
            (point.2 / res).floor() as i64,
        )
    }

    pub fn cell_to_point(&self, cell: Cell) -> Point3 {
        let res = self.config.resolution_m;
        (cell.0 as f64 * res, cell.1 as f64 * res, cell.2 as f64 * res)
    }

    /// Rasterize a sphere into the occupied set.
    ///
    /// Marks every cell whose integer offset from the center cell lies within
    /// `round(radius / resolution)` cells. Re-adding the same sphere changes nothing.
    ///
    /// Only cells inside the search cube are stored; the search never enters the rest.
    pub fn add_obstacle(&mut self, x: f64, y: f64, z: f64, radius_m: f64) {
        let center = self.to_cell((x, y, z));
        let r = i128::from((radius_m.max(0.0) / self.config.resolution_m).round() as i64);
        let r2 = r.saturating_mul(r);
        let limit = i128::from(self.grid_limit());
        let axis = |c: i64| (i128::from(c) - r).max(-limit)..=(i128::from(c) + r).min(limit);
        let before = self.occupied.len();

        for cx in axis(center.0) {
            let dx = cx - i128::from(center.0);
            for cy in axis(center.1) {
                let dy = cy - i128::from(center.1);
                for cz in axis(center.2) {
                    let dz = cz - i128::from(center.2);
                    if (dx * dx).saturating_add(dy * dy).saturating_add(dz * dz) > r2 {
                        continue;
                    }
                    // Bounded by the grid limit, so the casts are lossless.
                    let cell = (cx as i64, cy as i64, cz as i64);
                    if self.in_bounds(cell) {
                        self.occupied.insert(cell);
                    }
                }
            }
        }

        let obstacle = Obstacle {
            center: (x, y, z),
            radius_m,
        };
        if !self.obstacles.contains(&obstacle) {
            self.obstacles.push(obstacle);
        }
        debug!(
            "Obstacle at ({}, {}, {}) r={} occupies {} new cells",
            x,
            y,
            z,
            radius_m,
            self.occupied.len() - before
        );
    }

    pub fn add_no_fly_zone(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    ) {
        self.no_fly_zones.push(NoFlyZone {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        });
        debug!(
            "No-fly zone X[{},{}] Y[{},{}] Z[{},{}]",
            min_x, max_x, min_y, max_y, min_z, max_z
        );
    }

    /// True if the point's cell is occupied or the point lies inside any no-fly zone.
    pub fn is_obstacle(&self, x: f64, y: f64, z: f64) -> bool {
        self.occupied.contains(&self.to_cell((x, y, z))) || self.in_no_fly_zone(x, y, z)
    }

    pub fn in_no_fly_zone(&self, x: f64, y: f64, z: f64) -> bool {
        self.no_fly_zones
            .iter()
            .any(|zone| zone.contains_point(x, y, z))
    }

    /// Waypoints from `start` to `goal`, falling back to the direct line when no route exists.
    ///
    /// The fallback is not checked against obstacles; use [`PathPlanner::plan_route`] to tell
    /// the two cases apart.
    pub fn plan_path(&self, start: Point3, goal: Point3) -> Vec<Point3> {
        self.plan_route(start, goal).waypoints
    }

    pub fn plan_route(&self, start: Point3, goal: Point3) -> RoutePlan {
        let start_cell = self.to_cell(start);
        let goal_cell = self.to_cell(goal);

        let search = self.search(start_cell, goal_cell);
        let Some(cells) = search.cells else {
            warn!(
                "No route from {:?} to {:?} after {} nodes, using direct path",
                start, goal, search.nodes_visited
            );
            return RoutePlan {
                outcome: PlanOutcome::Unreachable,
                waypoints: vec![start, goal],
                nodes_visited: search.nodes_visited,
                length_m: path_length(&[start, goal]),
            };
        };

        let waypoints = if cells.len() < 2 {
            // Start and goal share a cell.
            vec![start, goal]
        } else {
            let points: Vec<Point3> = cells.iter().map(|&c| self.cell_to_point(c)).collect();
            simplify_path(&points, self.config.simplify_tolerance)
        };

        debug!(
            "Route {:?} -> {:?}: {} cells, {} waypoints, {} nodes visited",
            start,
            goal,
            cells.len(),
            waypoints.len(),
            search.nodes_visited
        );
        RoutePlan {
            outcome: PlanOutcome::Found,
            length_m: path_length(&waypoints),
            waypoints,
            nodes_visited: search.nodes_visited,
        }
    }

    /// Cell index bound per axis, one past the largest that can pass `in_bounds`.
    fn grid_limit(&self) -> i64 {
        (self.config.grid_size_m / self.config.resolution_m).floor() as i64 + 1
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        let res = self.config.resolution_m;
        let limit = self.config.grid_size_m;
        [cell.0, cell.1, cell.2]
            .iter()
            .all(|&n| (n as f64 * res).abs() <= limit)
    }

    fn is_traversable(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) || self.occupied.contains(&cell) {
            return false;
        }
        if self.config.respect_no_fly_zones {
            let (x, y, z) = self.cell_to_point(cell);
            if self.in_no_fly_zone(x, y, z) {
                return false;
            }
        }
        true
    }

    fn heuristic(&self, from: Cell, to: Cell) -> f64 {
        cell_distance(from, to) * self.config.resolution_m
    }

    fn search(&self, start: Cell, goal: Cell) -> SearchResult {
        let unreachable = |nodes_visited| SearchResult {
            cells: None,
            nodes_visited,
        };
        if self.occupied.contains(&start) {
            return unreachable(0);
        }
        if start == goal {
            return SearchResult {
                cells: Some(vec![start]),
                nodes_visited: 1,
            };
        }
        // A goal the frontier can never enter would otherwise exhaust the whole cube.
        if !self.is_traversable(goal) {
            return unreachable(0);
        }

        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        let mut closed_set: HashSet<Cell> = HashSet::new();
        let mut g_score: HashMap<Cell, f64> = HashMap::new();
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();

        g_score.insert(start, 0.0);
        open_set.push(Reverse(OpenNode {
            cell: start,
            g_score: FloatOrd(0.0),
            f_score: FloatOrd(self.heuristic(start, goal)),
        }));

        let mut nodes_visited = 0usize;

        while let Some(Reverse(current)) = open_set.pop() {
            if !closed_set.insert(current.cell) {
                continue;
            }
            nodes_visited += 1;

            if current.cell == goal {
                let mut cells = vec![goal];
                let mut cursor = goal;
                while let Some(&prev) = came_from.get(&cursor) {
                    cells.push(prev);
                    cursor = prev;
                }
                cells.reverse();
                return SearchResult {
                    cells: Some(cells),
                    nodes_visited,
                };
            }

            let current_g = current.g_score.0;
            for offset in NEIGHBOR_OFFSETS.iter() {
                let next = (
                    current.cell.0 + offset.0,
                    current.cell.1 + offset.1,
                    current.cell.2 + offset.2,
                );
                if closed_set.contains(&next) || !self.is_traversable(next) {
                    continue;
                }

                let step = cell_distance((0, 0, 0), *offset) * self.config.resolution_m;
                let tentative_g = current_g + step;
                if tentative_g < g_score.get(&next).copied().unwrap_or(f64::INFINITY) {
                    came_from.insert(next, current.cell);
                    g_score.insert(next, tentative_g);
                    open_set.push(Reverse(OpenNode {
                        cell: next,
                        g_score: FloatOrd(tentative_g),
                        f_score: FloatOrd(tentative_g + self.heuristic(next, goal)),
                    }));
                }
            }
        }

        unreachable(nodes_visited)
    }
}

/// Full 3x3x3 neighborhood minus the center.
const NEIGHBOR_OFFSETS: [Cell; 26] = {
    let mut offsets = [(0, 0, 0); 26];
    let mut i = 0;
    let mut dx = -1;
    while dx <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dz = -1;
            while dz <= 1 {
                if dx != 0 || dy != 0 || dz != 0 {
                    offsets[i] = (dx, dy, dz);
                    i += 1;
                }
                dz += 1;
            }
            dy += 1;
        }
        dx += 1;
    }
    offsets
};

fn cell_distance(a: Cell, b: Cell) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    let dz = (a.2 - b.2) as f64;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Drop interior points that continue the previous kept segment in a straight line.
///
/// A point survives only when both adjoining segments are non-degenerate and their cross
/// product exceeds `tolerance`. First and last points are always kept.
pub fn simplify_path(path: &[Point3], tolerance: f64) -> Vec<Point3> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut simplified = vec![path[0]];
    for i in 1..path.len() - 1 {
        let prev = simplified[simplified.len() - 1];
        let curr = path[i];
        let next = path[i + 1];

        let v1 = sub(curr, prev);
        let v2 = sub(next, curr);
        if norm(v1) > 0.0 && norm(v2) > 0.0 && norm(cross(v1, v2)) > tolerance {
            simplified.push(curr);
        }
    }
    simplified.push(path[path.len() - 1]);
    simplified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_planner() -> PathPlanner {
        PathPlanner::new(PlannerConfig {
            grid_size_m: 40.0,
            ..PlannerConfig::default()
        })
    }

    #[test]
    fn neighborhood_has_26_distinct_offsets() {
        let unique: HashSet<Cell> = NEIGHBOR_OFFSETS.iter().copied().collect();
        assert_eq!(unique.len(), 26);
        assert!(!unique.contains(&(0, 0, 0)));
    }

    #[test]
    fn cells_floor_toward_negative_infinity() {
        let planner = PathPlanner::default();
        assert_eq!(planner.to_cell((4.9, 5.0, -0.1)), (0, 1, -1));
        assert_eq!(planner.cell_to_point((2, -3, 0)), (10.0, -15.0, 0.0));
    }

    #[test]
    fn obstacle_rasterizes_sphere_of_cells() {
        let mut planner = PathPlanner::default();
        planner.add_obstacle(50.0, 0.0, 0.0, 5.0);
        // radius of one cell: center plus six face neighbors
        assert_eq!(planner.occupied_cell_count(), 7);
        assert!(planner.is_obstacle(50.0, 0.0, 0.0));
        assert!(planner.is_obstacle(55.0, 0.0, 0.0));
        assert!(!planner.is_obstacle(55.0, 5.0, 0.0));
    }

    #[test]
    fn huge_obstacle_is_clipped_to_grid() {
        let mut planner = small_planner();
        planner.add_obstacle(0.0, 0.0, 0.0, 1e12);
        // grid_size 40 / resolution 5: indices -8..=8 on each axis
        assert_eq!(planner.occupied_cell_count(), 17 * 17 * 17);
        assert!(planner.is_obstacle(40.0, -40.0, 40.0));
        assert!(!planner.is_obstacle(45.0, 0.0, 0.0));

        let plan = planner.plan_route((0.0, 0.0, 0.0), (20.0, 0.0, 0.0));
        assert_eq!(plan.outcome, PlanOutcome::Unreachable);
    }

    #[test]
    fn obstacle_far_outside_grid_adds_no_cells() {
        let mut planner = small_planner();
        planner.add_obstacle(1e15, 0.0, 0.0, 50.0);
        assert_eq!(planner.occupied_cell_count(), 0);
        assert_eq!(planner.obstacles().len(), 1);
    }

    #[test]
    fn re_adding_obstacle_is_idempotent() {
        let mut planner = PathPlanner::default();
        planner.add_obstacle(20.0, 20.0, 20.0, 10.0);
        let count = planner.occupied_cell_count();
        planner.add_obstacle(20.0, 20.0, 20.0, 10.0);
        assert_eq!(planner.occupied_cell_count(), count);
        assert_eq!(planner.obstacles().len(), 1);
    }

    #[test]
    fn is_obstacle_includes_no_fly_zones() {
        let mut planner = PathPlanner::default();
        planner.add_no_fly_zone(10.0, 20.0, -5.0, 5.0, 0.0, 30.0);
        assert!(planner.is_obstacle(15.0, 0.0, 10.0));
        assert!(planner.is_obstacle(20.0, 5.0, 30.0));
        assert!(!planner.is_obstacle(21.0, 0.0, 10.0));
        assert_eq!(planner.occupied_cell_count(), 0);
    }

    #[test]
    fn open_grid_returns_straight_line() {
        let planner = PathPlanner::default();
        let plan = planner.plan_route((0.0, 0.0, 0.0), (100.0, 0.0, 0.0));

        assert!(plan.is_found());
        assert_eq!(plan.waypoints, vec![(0.0, 0.0, 0.0), (100.0, 0.0, 0.0)]);
        assert!((plan.length_m - 100.0).abs() < 1e-9);
    }

    #[test]
    fn diagonal_route_is_optimal_length() {
        let planner = PathPlanner::default();
        let plan = planner.plan_route((0.0, 0.0, 10.0), (50.0, 50.0, 10.0));
        assert!(plan.is_found());
        let expected = (50.0f64 * 50.0 * 2.0).sqrt();
        assert!((plan.length_m - expected).abs() < 1e-9);
        assert_eq!(plan.waypoints.len(), 2);
    }

    #[test]
    fn route_detours_around_obstacle() {
        let mut planner = PathPlanner::default();
        planner.add_obstacle(50.0, 0.0, 0.0, 10.0);
        assert!(planner.is_obstacle(50.0, 0.0, 0.0));

        let plan = planner.plan_route((0.0, 0.0, 0.0), (100.0, 0.0, 0.0));
        assert!(plan.is_found());
        assert!(plan.waypoints.len() > 2);
        assert!(plan.length_m > 100.0);
        for &(x, y, z) in &plan.waypoints {
            assert!(!planner.is_obstacle(x, y, z), "waypoint ({x}, {y}, {z}) blocked");
        }
    }

    #[test]
    fn enclosed_goal_falls_back_to_direct_path() {
        let mut planner = small_planner();
        // Shell of obstacles around the goal cell (4, 0, 0) with the goal itself left free.
        let goal_cell = (4, 0, 0);
        for offset in NEIGHBOR_OFFSETS.iter() {
            let c = (goal_cell.0 + offset.0, goal_cell.1 + offset.1, goal_cell.2 + offset.2);
            let (x, y, z) = planner.cell_to_point(c);
            planner.add_obstacle(x, y, z, 0.0);
        }

        let start = (1.0, 2.0, 3.0);
        let goal = (21.0, 1.0, 1.0);
        let plan = planner.plan_route(start, goal);
        assert_eq!(plan.outcome, PlanOutcome::Unreachable);
        assert!(plan.nodes_visited > 0);
        assert_eq!(planner.plan_path(start, goal), vec![start, goal]);
    }

    #[test]
    fn goal_inside_obstacle_is_unreachable() {
        let mut planner = PathPlanner::default();
        planner.add_obstacle(50.0, 0.0, 0.0, 10.0);
        let plan = planner.plan_route((0.0, 0.0, 0.0), (50.0, 0.0, 0.0));
        assert_eq!(plan.outcome, PlanOutcome::Unreachable);
        assert_eq!(plan.waypoints, vec![(0.0, 0.0, 0.0), (50.0, 0.0, 0.0)]);
    }

    #[test]
    fn goal_outside_grid_is_unreachable() {
        let planner = small_planner();
        let plan = planner.plan_route((0.0, 0.0, 0.0), (100.0, 0.0, 0.0));
        assert_eq!(plan.outcome, PlanOutcome::Unreachable);
        assert_eq!(plan.waypoints.len(), 2);
    }

    #[test]
    fn same_cell_returns_two_waypoints() {
        let planner = PathPlanner::default();
        let plan = planner.plan_route((1.0, 1.0, 1.0), (2.0, 2.0, 2.0));
        assert!(plan.is_found());
        assert_eq!(plan.waypoints, vec![(1.0, 1.0, 1.0), (2.0, 2.0, 2.0)]);
    }

    #[test]
    fn no_fly_zones_are_ignored_by_default() {
        let mut planner = PathPlanner::default();
        planner.add_no_fly_zone(40.0, 60.0, -20.0, 20.0, -20.0, 20.0);
        let plan = planner.plan_route((0.0, 0.0, 0.0), (100.0, 0.0, 0.0));
        assert!(plan.is_found());
        assert_eq!(plan.waypoints.len(), 2);
        assert!(planner.is_obstacle(50.0, 0.0, 0.0));
    }

    #[test]
    fn no_fly_zones_block_search_when_enabled() {
        let mut planner = PathPlanner::new(PlannerConfig {
            respect_no_fly_zones: true,
            ..PlannerConfig::default()
        });
        planner.add_no_fly_zone(40.0, 60.0, -20.0, 20.0, -20.0, 20.0);
        let plan = planner.plan_route((0.0, 0.0, 0.0), (100.0, 0.0, 0.0));

        assert!(plan.is_found());
        assert!(plan.length_m > 100.0);
        for &(x, y, z) in &plan.waypoints {
            assert!(!planner.in_no_fly_zone(x, y, z));
        }
    }

    #[test]
    fn simplify_keeps_corners_only() {
        let path = vec![
            (0.0, 0.0, 0.0),
            (5.0, 0.0, 0.0),
            (10.0, 0.0, 0.0),
            (10.0, 5.0, 0.0),
            (10.0, 10.0, 0.0),
        ];
        assert_eq!(
            simplify_path(&path, 0.1),
            vec![(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (10.0, 10.0, 0.0)]
        );
    }

    #[test]
    fn simplify_drops_duplicate_points() {
        let path = vec![(0.0, 0.0, 0.0), (0.0, 0.0, 0.0), (0.0, 5.0, 0.0)];
        assert_eq!(
            simplify_path(&path, 0.1),
            vec![(0.0, 0.0, 0.0), (0.0, 5.0, 0.0)]
        );
    }
}
