//! Swept segment collision detection.
//!
//! Detects where the straight segment travelled by a particle in one
//! (sub-)step first leaves the valid side of a boundary facet.

use crate::boundary::Boundary;
use crate::types::Vec3;

/// The earliest facet crossing found on a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub facet: usize,
    pub point: Vec3,
    /// Inward facet normal at `point`
    pub normal: Vec3,
    /// Time from the start of the segment until `point` is reached
    pub time: f64,
}

/// Collision detector for segments against a [`Boundary`].
pub struct CollisionDetector;

impl CollisionDetector {
    /// Detect the first crossing of the segment `from → to` travelled in `duration`.
    ///
    /// # Arguments
    /// * `boundary` - Containment geometry
    /// * `from` - Position at the start of the segment
    /// * `to` - Tentative position at the end of the segment
    /// * `duration` - Time taken to travel the segment
    ///
    /// # Returns
    /// The crossing nearest to `from`, or `None` if `to` is valid for every
    /// facet or the particle barely moved. Equidistant crossings keep the
    /// facet that comes first in enumeration order.
    pub fn detect(boundary: &Boundary, from: Vec3, to: Vec3, duration: f64) -> Option<Crossing> {
        let displacement = from.distance(&to);
        if displacement <= f64::EPSILON || duration <= 0.0 {
            return None;
        }

        let speed = displacement / duration;
        let mut earliest: Option<(f64, Crossing)> = None;

        for facet in 0..boundary.facet_count() {
            let Some(point) = boundary.crossing(facet, from, to) else {
                continue;
            };

            let dist = from.distance(&point);
            if earliest.as_ref().is_some_and(|(best, _)| dist >= *best) {
                continue;
            }

            earliest = Some((
                dist,
                Crossing {
                    facet,
                    point,
                    normal: boundary.normal(facet, point),
                    time: (dist / speed).min(duration),
                },
            ));
        }

        earliest.map(|(_, crossing)| crossing)
    }
}

// =============================================================================
// Tests
// =============================================================================
