use crate::core::models::snapshot::AtomSnapshot;
use crate::core::utils::geometry::{DEGENERATE_EPSILON, is_finite_point, random_unit_vector};
use crate::engine::cancel::CancellationToken;
use crate::engine::config::RelaxationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::spatial::SpatialGrid;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Relaxed positions keyed by atom index, to be used in place of the parsed ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RelaxedPositions {
    positions: BTreeMap<usize, Point3<f64>>,
}

impl RelaxedPositions {
    pub fn get(&self, index: usize) -> Option<&Point3<f64>> {
        self.positions.get(&index)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Point3<f64>)> {
        self.positions.iter().map(|(&i, p)| (i, p))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Point3<f64>> {
        self.positions.values_mut()
    }

    /// A copy of `atoms` with overridden positions applied.
    pub fn apply_to(&self, atoms: &[AtomSnapshot]) -> Vec<AtomSnapshot> {
        atoms
            .iter()
            .enumerate()
            .map(|(slot, atom)| {
                let key = atom.index.unwrap_or(slot);
                AtomSnapshot {
                    position: self.positions.get(&key).copied().unwrap_or(atom.position),
                    ..*atom
                }
            })
            .collect()
    }
}

fn nudge_rng(iteration_seed: u64, atom: usize) -> StdRng {
    StdRng::seed_from_u64(iteration_seed ^ (atom as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

struct Frame<'a> {
    positions: &'a [Point3<f64>],
    radii: &'a [f64],
    grid: &'a SpatialGrid,
    overlap: f64,
    iteration_seed: u64,
    config: &'a RelaxationConfig,
}

impl Frame<'_> {
    /// Averaged displacement of atom `i` against its grid neighbors.
    fn displacement(&self, i: usize) -> Vector3<f64> {
        let config = self.config;
        let p = self.positions[i];
        let mut neighbors = Vec::new();
        self.grid.query_neighbors(&p, &mut neighbors);

        let mut force = Vector3::zeros();
        let mut contributions = 0usize;
        for j in neighbors {
            if j == i {
                continue;
            }
            let offset = p - self.positions[j];
            let distance = offset.norm();
            let ideal = (self.radii[i] + self.radii[j]) * self.overlap;

            if !(distance > DEGENERATE_EPSILON) {
                let mut rng = nudge_rng(self.iteration_seed, i);
                force += random_unit_vector(&mut rng) * config.nudge_distance;
                contributions += 1;
                continue;
            }

            let direction = offset / distance;
            if distance < ideal * (1.0 - config.tolerance) {
                force += direction * (ideal - distance) * config.repulsion_strength;
                contributions += 1;
            } else if distance > ideal * (1.0 + config.tolerance)
                && distance <= ideal * config.attraction_range
            {
                force -= direction * (distance - ideal) * config.attraction_strength;
                contributions += 1;
            }
        }

        if contributions == 0 {
            Vector3::zeros()
        } else {
            force / contributions as f64
        }
    }
}

/// Relaxes sphere positions so scaled van der Waals spheres neither gap nor
/// interpenetrate excessively.
///
/// Runs a fixed number of Jacobi iterations over a uniform hash grid rebuilt every
/// iteration; each iteration reads only the previous iteration's positions. The
/// input is never modified. Coincident atoms are separated by a random nudge drawn
/// from a per-atom generator seeded from `rng`, so a seeded `rng` gives reproducible
/// output. Cancellation is checked between batches; a cancelled run returns
/// [`EngineError::Cancelled`] and no positions.
#[instrument(skip_all, name = "relaxation_task")]
pub fn relax<R: RngCore + ?Sized>(
    atoms: &[AtomSnapshot],
    config: &RelaxationConfig,
    rng: &mut R,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<RelaxedPositions, EngineError> {
    let radii: Vec<f64> = atoms
        .iter()
        .map(|a| a.element.vdw_radius() * config.radius_scale)
        .collect();
    let mut current: Vec<Point3<f64>> = atoms.iter().map(|a| a.position).collect();
    let indices: Vec<usize> = (0..atoms.len()).collect();
    let batch_size = config.batch_size.max(1);
    let batches = indices.len().div_ceil(batch_size);

    reporter.report(Progress::TaskStart {
        total_steps: (config.iterations * batches) as u64,
    });

    for iteration in 0..config.iterations {
        cancel.check("relaxation")?;
        let grid = SpatialGrid::from_points(config.cell_size, &current);
        let frame = Frame {
            positions: &current,
            radii: &radii,
            grid: &grid,
            overlap: config.overlap_at(iteration),
            iteration_seed: rng.next_u64(),
            config,
        };

        let mut next = current.clone();
        for batch in indices.chunks(batch_size) {
            cancel.check("relaxation")?;

            #[cfg(not(feature = "parallel"))]
            let deltas: Vec<Vector3<f64>> = batch.iter().map(|&i| frame.displacement(i)).collect();

            #[cfg(feature = "parallel")]
            let deltas: Vec<Vector3<f64>> = batch.par_iter().map(|&i| frame.displacement(i)).collect();

            for (&i, delta) in batch.iter().zip(deltas) {
                let moved = next[i] + delta;
                if is_finite_point(&moved) {
                    next[i] = moved;
                }
            }
            reporter.report(Progress::TaskAdvance(1));
        }

        let max_shift = current
            .iter()
            .zip(&next)
            .map(|(a, b)| nalgebra::distance(a, b))
            .fold(0.0, f64::max);
        trace!(iteration, overlap = frame.overlap, max_shift, "Relaxation iteration complete");
        current = next;
    }
    reporter.report(Progress::TaskFinish);

    let positions = atoms
        .iter()
        .enumerate()
        .zip(current)
        .map(|((slot, atom), position)| (atom.index.unwrap_or(slot), position))
        .collect();
    info!(atoms = atoms.len(), iterations = config.iterations, "Relaxation complete.");
    Ok(RelaxedPositions { positions })
}
