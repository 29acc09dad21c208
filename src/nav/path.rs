//! A* pathfinding over the navigation grid

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec3;
use rustc_hash::FxHashMap;

use super::NavGrid;

/// Result of a path query
#[derive(Debug, Clone, Default)]
pub struct PathResult {
    /// Corner points in world coordinates, start cell first
    pub corners: Vec<Vec3>,
    /// Total path length
    pub length: f32,
}

impl PathResult {
    /// Check whether the query failed to produce a path
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }
}

/// A* node for the priority queue
#[derive(Debug, Clone, Copy)]
struct Node {
    x: usize,
    z: usize,
    /// g_cost + heuristic
    f_cost: f32,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.z == other.z
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two world positions using A*.
///
/// Returns an empty result when either endpoint is off the grid or
/// unwalkable, or when no route exists.
#[must_use]
pub fn find_path(grid: &NavGrid, start: Vec3, goal: Vec3) -> PathResult {
    let (start_x, start_z) = grid.world_to_cell(start);
    let (goal_x, goal_z) = grid.world_to_cell(goal);

    if start_x < 0 || start_z < 0 || goal_x < 0 || goal_z < 0 {
        return PathResult::default();
    }

    let start_x = start_x as usize;
    let start_z = start_z as usize;
    let goal_x = goal_x as usize;
    let goal_z = goal_z as usize;

    if !grid.is_walkable(start_x, start_z) || !grid.is_walkable(goal_x, goal_z) {
        return PathResult::default();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<(usize, usize), (usize, usize)> = FxHashMap::default();
    let mut g_score: FxHashMap<(usize, usize), f32> = FxHashMap::default();

    let heuristic = |x: usize, z: usize| -> f32 {
        let dx = (x as f32 - goal_x as f32).abs();
        let dz = (z as f32 - goal_z as f32).abs();
        dx + dz // Manhattan distance
    };

    g_score.insert((start_x, start_z), 0.0);
    open_set.push(Node {
        x: start_x,
        z: start_z,
        f_cost: heuristic(start_x, start_z),
    });

    while let Some(current) = open_set.pop() {
        if current.x == goal_x && current.z == goal_z {
            // Reconstruct path
            let mut cells = vec![(goal_x, goal_z)];
            let mut curr = (goal_x, goal_z);

            while let Some(&prev) = came_from.get(&curr) {
                cells.push(prev);
                curr = prev;
            }

            cells.reverse();

            let corners: Vec<Vec3> = cells
                .iter()
                .map(|&(x, z)| grid.cell_to_world(x, z))
                .collect();

            let length = path_length(&corners);

            return PathResult { corners, length };
        }

        for (nx, nz) in grid.neighbors(current.x, current.z) {
            let tentative_g = g_score.get(&(current.x, current.z)).unwrap_or(&f32::MAX) + 1.0;

            if tentative_g < *g_score.get(&(nx, nz)).unwrap_or(&f32::MAX) {
                came_from.insert((nx, nz), (current.x, current.z));
                g_score.insert((nx, nz), tentative_g);

                open_set.push(Node {
                    x: nx,
                    z: nz,
                    f_cost: tentative_g + heuristic(nx, nz),
                });
            }
        }
    }

    // No route
    PathResult::default()
}

fn path_length(corners: &[Vec3]) -> f32 {
    let mut length = 0.0;
    for i in 1..corners.len() {
        length += corners[i].distance(corners[i - 1]);
    }
    length
}
