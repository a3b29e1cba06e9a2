use super::backbone::BackboneChain;
use crate::core::models::chain::ChainLabel;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::utils::geometry::normalize_or;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::RibbonConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use itertools::Itertools;
use nalgebra::{Point3, Vector3};
use serde::Serialize;
use tracing::{debug, info, instrument, trace};

/// One continuous stretch of the dense ribbon curve with a single structure type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RibbonSegment {
    pub chain: ChainLabel,
    pub secondary: SecondaryStructure,
    pub points: Vec<Point3<f64>>,
    /// Unit normal per point, perpendicular to the local tangent.
    pub normals: Vec<Vector3<f64>>,
    /// Source residue number each point is keyed to.
    pub residue_numbers: Vec<i32>,
    /// Set for helix segments too short to render as a helical tube.
    pub simplified: bool,
}

/// Reassigns structure runs shorter than `min_run` residues.
///
/// A short run takes the type of its longer non-loop neighbor (the preceding one on
/// a tie) or becomes loop when both neighbors are loop or absent. Runs are merged
/// shortest-first until every run reaches `min_run` or the chain is a single run.
pub fn merge_short_runs(ss: &[SecondaryStructure], min_run: usize) -> Vec<SecondaryStructure> {
    let mut result = ss.to_vec();

    loop {
        let runs = runs_of(&result);
        if runs.len() < 2 {
            break;
        }

        let candidate = runs
            .iter()
            .enumerate()
            .filter(|(_, run)| run.len < min_run)
            .filter_map(|(k, run)| merge_target(&runs, k).map(|target| (run.len, k, target)))
            .filter(|&(_, k, target)| target != runs[k].kind)
            .min_by_key(|&(len, k, _)| (len, k));

        let Some((_, k, target)) = candidate else {
            break;
        };
        let run = runs[k];
        for slot in &mut result[run.start..run.start + run.len] {
            *slot = target;
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Run {
    start: usize,
    len: usize,
    kind: SecondaryStructure,
}

fn runs_of(ss: &[SecondaryStructure]) -> Vec<Run> {
    let mut start = 0;
    ss.iter()
        .chunk_by(|&&kind| kind)
        .into_iter()
        .map(|(kind, group)| {
            let len = group.count();
            let run = Run { start, len, kind };
            start += len;
            run
        })
        .collect()
}

fn merge_target(runs: &[Run], k: usize) -> Option<SecondaryStructure> {
    let prev = k.checked_sub(1).map(|p| runs[p]);
    let next = runs.get(k + 1).copied();
    let non_loop = |run: Option<Run>| run.filter(|r| !r.kind.is_loop());

    match (non_loop(prev), non_loop(next)) {
        (Some(p), Some(n)) => Some(if n.len > p.len { n.kind } else { p.kind }),
        (Some(p), None) => Some(p.kind),
        (None, Some(n)) => Some(n.kind),
        (None, None) => Some(SecondaryStructure::Loop),
    }
}

/// Endpoint-preserving Laplacian smoothing, `p[i] = 0.25 p[i-1] + 0.5 p[i] + 0.25 p[i+1]`.
pub fn laplacian_smooth(points: &[Point3<f64>], iterations: usize) -> Vec<Point3<f64>> {
    let mut current = points.to_vec();
    if current.len() < 3 {
        return current;
    }
    let mut next = current.clone();
    for _ in 0..iterations {
        for i in 1..current.len() - 1 {
            next[i] = Point3::from(
                current[i - 1].coords * 0.25 + current[i].coords * 0.5 + current[i + 1].coords * 0.25,
            );
        }
        std::mem::swap(&mut current, &mut next);
    }
    current
}

fn spacing_for(ss: SecondaryStructure, config: &RibbonConfig) -> f64 {
    match ss {
        SecondaryStructure::Helix => config.helix_spacing,
        SecondaryStructure::Sheet => config.sheet_spacing,
        SecondaryStructure::Loop => config.loop_spacing,
    }
}

/// Pushes each point forward along its incoming step by the structure multiplier.
pub fn respace(
    points: &[Point3<f64>],
    ss: &[SecondaryStructure],
    config: &RibbonConfig,
) -> Vec<Point3<f64>> {
    let mut out: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        let next = match out.last() {
            None => *point,
            Some(prev) => {
                let kind = ss.get(i).copied().unwrap_or_default();
                *prev + (*point - points[i - 1]) * spacing_for(kind, config)
            }
        };
        out.push(next);
    }
    out
}

/// A dense curve sample and the index of the control point it is keyed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    pub position: Point3<f64>,
    pub source: usize,
}

/// Cardinal Hermite interpolation through every control point.
///
/// Produces `samples_per_span` samples per span plus the final control point. The
/// first half of a span's samples is keyed to its start point, the rest to its end.
pub fn cardinal_spline(points: &[Point3<f64>], tension: f64, samples_per_span: usize) -> Vec<CurveSample> {
    let n = points.len();
    match n {
        0 => return Vec::new(),
        1 => {
            return vec![CurveSample {
                position: points[0],
                source: 0,
            }];
        }
        _ => {}
    }
    let samples_per_span = samples_per_span.max(1);

    let control = |i: isize| -> Point3<f64> {
        if i < 0 {
            Point3::from(points[0].coords * 2.0 - points[1].coords)
        } else if i as usize >= n {
            Point3::from(points[n - 1].coords * 2.0 - points[n - 2].coords)
        } else {
            points[i as usize]
        }
    };
    let scale = (1.0 - tension) * 0.5;
    let tangent = |i: usize| (control(i as isize + 1) - control(i as isize - 1)) * scale;

    let mut samples = Vec::with_capacity((n - 1) * samples_per_span + 1);
    for i in 0..n - 1 {
        let (p0, p1) = (points[i], points[i + 1]);
        let (m0, m1) = (tangent(i), tangent(i + 1));
        for j in 0..samples_per_span {
            let t = j as f64 / samples_per_span as f64;
            let (t2, t3) = (t * t, t * t * t);
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            let position =
                Point3::from(p0.coords * h00 + m0 * h10 + p1.coords * h01 + m1 * h11);
            let source = if 2 * j < samples_per_span { i } else { i + 1 };
            samples.push(CurveSample { position, source });
        }
    }
    samples.push(CurveSample {
        position: points[n - 1],
        source: n - 1,
    });
    samples
}

/// Per-sample normals from the tangent crossed with a fixed up vector.
///
/// Falls back to the X axis where the tangent is parallel to up, and to the
/// previous normal where the tangent vanishes.
pub fn compute_normals(points: &[Point3<f64>]) -> Vec<Vector3<f64>> {
    let n = points.len();
    let up = Vector3::y();
    let mut normals = Vec::with_capacity(n);
    let mut previous = Vector3::z();

    for i in 0..n {
        let tangent = match (i.checked_sub(1), points.get(i + 1)) {
            (Some(p), Some(next)) => *next - points[p],
            (None, Some(next)) => *next - points[i],
            (Some(p), None) => points[i] - points[p],
            (None, None) => Vector3::zeros(),
        };
        let normal = if tangent.norm() <= 1e-9 {
            previous
        } else {
            let fallback = normalize_or(&tangent.cross(&Vector3::x()), previous);
            normalize_or(&tangent.cross(&up), fallback)
        };
        normals.push(normal);
        previous = normal;
    }
    normals
}

fn blend_seams(normals: &mut [Vector3<f64>], boundaries: &[usize], window: usize) {
    let half = window / 2;
    for &b in boundaries {
        let lo = b.saturating_sub(half);
        let hi = (b + half).min(normals.len() - 1);
        let sum: Vector3<f64> = normals[lo..=hi].iter().sum();
        let blended = normalize_or(&sum, normals[b]);
        for normal in &mut normals[lo..=hi] {
            *normal = blended;
        }
    }
}

/// Builds ribbon segments for one backbone trace.
pub fn chain_ribbon(chain: &BackboneChain, config: &RibbonConfig) -> Vec<RibbonSegment> {
    if chain.len() < 2 {
        return Vec::new();
    }

    let ss = merge_short_runs(&chain.secondary, config.min_run_length);
    let smoothed = laplacian_smooth(&chain.positions, config.smoothing_iterations);
    let spaced = respace(&smoothed, &ss, config);
    let samples = cardinal_spline(&spaced, config.tension, config.samples_per_span);

    let points: Vec<Point3<f64>> = samples.iter().map(|s| s.position).collect();
    let kinds: Vec<SecondaryStructure> = samples.iter().map(|s| ss[s.source]).collect();
    let boundaries: Vec<usize> = (1..kinds.len()).filter(|&k| kinds[k] != kinds[k - 1]).collect();

    let mut normals = compute_normals(&points);
    blend_seams(&mut normals, &boundaries, config.transition_window);

    let mut starts = vec![0];
    starts.extend(&boundaries);
    let mut segments = Vec::with_capacity(starts.len());
    for (s, &start) in starts.iter().enumerate() {
        // Every segment but the last shares its final sample with the next one.
        let end = starts.get(s + 1).copied().unwrap_or(points.len() - 1);
        let secondary = kinds[start];
        let range = start..=end;
        let segment_points = points[range.clone()].to_vec();
        let simplified = secondary == SecondaryStructure::Helix
            && segment_points.len() < config.simplified_helix_samples;
        segments.push(RibbonSegment {
            chain: chain.chain.clone(),
            secondary,
            normals: normals[range.clone()].to_vec(),
            residue_numbers: samples[range]
                .iter()
                .map(|s| chain.residue_numbers[s.source])
                .collect(),
            points: segment_points,
            simplified,
        });
    }
    trace!(chain = %chain.chain, segments = segments.len(), samples = points.len(), "Chain ribbon built");
    segments
}

/// Builds ribbon segments for every backbone trace, checking for cancellation
/// between chains.
#[instrument(skip_all, name = "ribbon_task")]
pub fn build_ribbons(
    chains: &[BackboneChain],
    config: &RibbonConfig,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<Vec<RibbonSegment>, EngineError> {
    reporter.report(Progress::TaskStart {
        total_steps: chains.len() as u64,
    });

    let mut segments = Vec::new();
    for chain in chains {
        cancel.check("ribbon")?;
        segments.extend(chain_ribbon(chain, config));
        reporter.report(Progress::TaskAdvance(1));
    }
    reporter.report(Progress::TaskFinish);

    let simplified = segments.iter().filter(|s| s.simplified).count();
    if simplified > 0 {
        debug!(simplified, "Short helix segments flagged for simplified rendering");
    }
    info!(chains = chains.len(), segments = segments.len(), "Ribbon construction complete.");
    Ok(segments)
}
