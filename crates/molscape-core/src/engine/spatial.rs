use nalgebra::Point3;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Uniform spatial hash grid for neighbor queries.
///
/// Space is divided into cubic cells of `cell_size`; each cell stores the indices
/// of the points inside it. A neighbor query visits the 3×3×3 block of cells around
/// the query point, so every point within `cell_size` of it is found.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cells: HashMap<CellKey, Vec<usize>>,
    cell_size: f64,
}

impl SpatialGrid {
    pub fn with_capacity(cell_size: f64, expected_points: usize) -> Self {
        Self {
            cells: HashMap::with_capacity(expected_points),
            cell_size,
        }
    }

    /// Builds a grid over `points`, using each point's slice index as its id.
    pub fn from_points(cell_size: f64, points: &[Point3<f64>]) -> Self {
        let mut grid = Self::with_capacity(cell_size, points.len());
        for (index, point) in points.iter().enumerate() {
            grid.insert(point, index);
        }
        grid
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn cell_key(&self, pos: &Point3<f64>) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
            (pos.z / self.cell_size).floor() as i64,
        )
    }

    pub fn insert(&mut self, pos: &Point3<f64>, index: usize) {
        let key = self.cell_key(pos);
        self.cells.entry(key).or_default().push(index);
    }

    /// Collects every index in the 3×3×3 neighborhood of `pos`, in ascending order.
    pub fn query_neighbors(&self, pos: &Point3<f64>, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy, cz) = self.cell_key(pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    if let Some(indices) = self.cells.get(&key) {
                        out.extend_from_slice(indices);
                    }
                }
            }
        }
        out.sort_unstable();
    }
}
