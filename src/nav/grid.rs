//! Walkable-cell navigation grid
//!
//! The world is navigated on the XZ plane; cells carry a single walkable
//! flag and the grid projects world positions onto a fixed surface height.

use glam::{Vec2, Vec3};

/// A 2D navigation grid over the XZ plane
#[derive(Debug, Clone)]
pub struct NavGrid {
    /// Width in cells (world X axis)
    pub width: usize,
    /// Height in cells (world Z axis)
    pub height: usize,
    /// Cell size in world units
    pub cell_size: f32,
    /// Walkable cells (true = walkable)
    cells: Vec<bool>,
    /// World origin offset (XZ)
    pub origin: Vec2,
    /// Y coordinate of the walkable surface
    pub surface_height: f32,
}

impl NavGrid {
    /// Create a new grid (all cells walkable by default)
    #[must_use]
    pub fn new(width: usize, height: usize, cell_size: f32) -> Self {
        Self {
            width,
            height,
            cell_size,
            cells: vec![true; width * height],
            origin: Vec2::ZERO,
            surface_height: 0.0,
        }
    }

    /// Set a cell's walkability
    pub fn set_walkable(&mut self, x: usize, z: usize, walkable: bool) {
        if x < self.width && z < self.height {
            self.cells[z * self.width + x] = walkable;
        }
    }

    /// Check if a cell is walkable
    #[must_use]
    pub fn is_walkable(&self, x: usize, z: usize) -> bool {
        if x >= self.width || z >= self.height {
            return false;
        }
        self.cells[z * self.width + x]
    }

    /// Mark every cell touched by a world-space box footprint as unwalkable.
    ///
    /// Used when placing obstacles: the box is projected onto the XZ plane
    /// and all overlapped cells are blocked.
    pub fn block_footprint(&mut self, center: Vec3, half_extents: Vec3) {
        let (min_x, min_z) = self.world_to_cell(center - half_extents);
        let (max_x, max_z) = self.world_to_cell(center + half_extents);

        for z in min_z.max(0)..=max_z {
            for x in min_x.max(0)..=max_x {
                self.set_walkable(x as usize, z as usize, false);
            }
        }
    }

    /// Convert a world position to grid coordinates
    #[must_use]
    pub fn world_to_cell(&self, pos: Vec3) -> (i32, i32) {
        let local = Vec2::new(pos.x, pos.z) - self.origin;
        (
            (local.x / self.cell_size).floor() as i32,
            (local.y / self.cell_size).floor() as i32,
        )
    }

    /// Convert grid coordinates to a world position (center of cell)
    #[must_use]
    pub fn cell_to_world(&self, x: usize, z: usize) -> Vec3 {
        let flat = self.origin
            + Vec2::new(
                (x as f32 + 0.5) * self.cell_size,
                (z as f32 + 0.5) * self.cell_size,
            );
        Vec3::new(flat.x, self.surface_height, flat.y)
    }

    /// Check whether a world position sits on a walkable cell
    #[must_use]
    pub fn is_on_navigable(&self, pos: Vec3) -> bool {
        let (x, z) = self.world_to_cell(pos);
        if x < 0 || z < 0 {
            return false;
        }
        self.is_walkable(x as usize, z as usize)
    }

    /// Find the nearest navigable point within `radius` of `point`.
    ///
    /// Returns the point itself (projected to the surface) when it already
    /// sits on a walkable cell, otherwise the nearest walkable cell center.
    /// `None` when no walkable cell lies within the radius.
    #[must_use]
    pub fn sample_nearest(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        if self.is_on_navigable(point) {
            return Some(Vec3::new(point.x, self.surface_height, point.z));
        }

        let (cx, cz) = self.world_to_cell(point);
        let span = (radius / self.cell_size).ceil() as i32 + 1;
        let flat = Vec2::new(point.x, point.z);

        let mut best: Option<(f32, Vec3)> = None;
        for z in (cz - span)..=(cz + span) {
            for x in (cx - span)..=(cx + span) {
                if x < 0 || z < 0 {
                    continue;
                }
                let (x, z) = (x as usize, z as usize);
                if !self.is_walkable(x, z) {
                    continue;
                }
                let center = self.cell_to_world(x, z);
                let dist = Vec2::new(center.x, center.z).distance(flat);
                if dist <= radius && best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, center));
                }
            }
        }

        best.map(|(_, center)| center)
    }

    /// Get walkable neighbors of a cell (4-directional)
    pub(crate) fn neighbors(&self, x: usize, z: usize) -> Vec<(usize, usize)> {
        let mut result = Vec::with_capacity(4);

        if x > 0 && self.is_walkable(x - 1, z) {
            result.push((x - 1, z));
        }
        if x + 1 < self.width && self.is_walkable(x + 1, z) {
            result.push((x + 1, z));
        }
        if z > 0 && self.is_walkable(x, z - 1) {
            result.push((x, z - 1));
        }
        if z + 1 < self.height && self.is_walkable(x, z + 1) {
            result.push((x, z + 1));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_walkable_by_default() {
        let grid = NavGrid::new(4, 4, 1.0);
        assert!(grid.is_walkable(0, 0));
        assert!(grid.is_walkable(3, 3));
        // Out of bounds is never walkable
        assert!(!grid.is_walkable(4, 0));
    }

    #[test]
    fn test_world_cell_round_trip_with_origin() {
        let mut grid = NavGrid::new(10, 10, 2.0);
        grid.origin = Vec2::new(-10.0, -10.0);
        grid.surface_height = 0.5;

        let center = grid.cell_to_world(3, 7);
        assert_eq!(grid.world_to_cell(center), (3, 7));
        assert_eq!(center.y, 0.5);
    }

    #[test]
    fn test_block_footprint_covers_box() {
        let mut grid = NavGrid::new(10, 10, 1.0);
        grid.block_footprint(Vec3::new(5.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 1.0));

        // Cells under the box (4..6 on both axes) are blocked
        assert!(!grid.is_walkable(4, 4));
        assert!(!grid.is_walkable(5, 5));
        assert!(!grid.is_walkable(6, 6));
        assert!(grid.is_walkable(3, 5));
        assert!(grid.is_walkable(7, 5));
    }

    #[test]
    fn test_sample_nearest_prefers_exact_point() {
        let mut grid = NavGrid::new(10, 10, 1.0);
        grid.surface_height = 1.0;

        let sampled = grid.sample_nearest(Vec3::new(2.3, 0.0, 4.7), 5.0);
        assert_eq!(sampled, Some(Vec3::new(2.3, 1.0, 4.7)));
    }

    #[test]
    fn test_sample_nearest_snaps_to_walkable() {
        let mut grid = NavGrid::new(10, 10, 1.0);
        grid.set_walkable(5, 5, false);

        let sampled = grid
            .sample_nearest(Vec3::new(5.5, 0.0, 5.5), 3.0)
            .expect("a walkable neighbor exists");
        assert!(grid.is_on_navigable(sampled));
        assert!(sampled.distance(Vec3::new(5.5, 0.0, 5.5)) <= 1.5);
    }

    #[test]
    fn test_sample_nearest_respects_radius() {
        let mut grid = NavGrid::new(6, 6, 1.0);
        for z in 0..6 {
            for x in 0..6 {
                grid.set_walkable(x, z, false);
            }
        }
        grid.set_walkable(5, 5, true);

        // Nearest walkable cell is ~6 units away, outside the radius
        assert_eq!(grid.sample_nearest(Vec3::new(0.5, 0.0, 0.5), 2.0), None);
    }
}
