use super::element::Element;
use nalgebra::Point3;
use serde::Serialize;

/// A lightweight, copyable view of one atom as consumed by the geometry algorithms.
///
/// `index` points back into the source model's atom sequence. It is `None` when the
/// snapshot was built from positions whose mapping to parsed atoms was lost (for
/// example positions handed back by a renderer); consumers that need residue
/// metadata then fall back to position matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AtomSnapshot {
    pub index: Option<usize>,
    pub element: Element,
    pub position: Point3<f64>,
}

impl AtomSnapshot {
    pub fn new(index: usize, element: Element, position: Point3<f64>) -> Self {
        Self {
            index: Some(index),
            element,
            position,
        }
    }

    pub fn detached(element: Element, position: Point3<f64>) -> Self {
        Self {
            index: None,
            element,
            position,
        }
    }
}
