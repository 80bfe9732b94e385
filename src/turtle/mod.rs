//! Turtle kinematics: pose, pen and the recorded path a renderer draws.
//!
//! Two motion models share the [`Turtle`] surface the interpreter drives:
//! [`PlanarTurtle`] keeps a single heading angle, [`SpatialTurtle`] keeps an
//! orthonormal body frame rotated by roll, pitch and yaw.

use serde::Serialize;
use tracing::warn;

mod planar;
mod spatial;

pub use glam::{DVec2, DVec3};
pub use planar::{Heading, PlanarTurtle};
pub use spatial::SpatialTurtle;

/// Motion primitives consumed by the interpreter. Angles are degrees.
pub trait Turtle {
    type Point: Copy;

    fn penup(&mut self);
    fn pendown(&mut self);
    fn forward(&mut self, distance: f64);
    fn left(&mut self, deg: f64);
    fn right(&mut self, deg: f64);
    fn reset(&mut self);

    fn up(&mut self, deg: f64) {
        warn!(deg, "'up' has no effect on a planar turtle");
    }
    fn down(&mut self, deg: f64) {
        warn!(deg, "'down' has no effect on a planar turtle");
    }
    fn roll_cw(&mut self, deg: f64) {
        warn!(deg, "'roll_cw' has no effect on a planar turtle");
    }
    fn roll_ccw(&mut self, deg: f64) {
        warn!(deg, "'roll_ccw' has no effect on a planar turtle");
    }

    fn is_pen_down(&self) -> bool;
    fn position(&self) -> Self::Point;
    fn path(&self) -> &Path<Self::Point>;
}

/// One recorded path entry. A `Break` serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathEntry<P> {
    Point(P),
    Break,
}

/// Recorded trail of the pen.
///
/// Breaks mark pen-up travel so a renderer draws separate strokes. The path
/// never starts with a break and never holds two breaks in a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Path<P> {
    entries: Vec<PathEntry<P>>,
}

impl<P> Default for Path<P> {
    fn default() -> Self {
        Path {
            entries: Vec::new(),
        }
    }
}

impl<P: Copy> Path<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PathEntry<P>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True when the next drawn point has to start a new stroke.
    pub fn needs_start(&self) -> bool {
        matches!(self.entries.last(), None | Some(PathEntry::Break))
    }

    pub fn push_point(&mut self, p: P) {
        self.entries.push(PathEntry::Point(p));
    }

    pub fn push_break(&mut self) {
        if !self.needs_start() {
            self.entries.push(PathEntry::Break);
        }
    }

    /// Record a straight move from `from` to `to`.
    pub fn record_move(&mut self, from: P, to: P, pen_down: bool) {
        if pen_down {
            if self.needs_start() {
                self.push_point(from);
            }
            self.push_point(to);
        } else {
            self.push_break();
        }
    }

    pub fn break_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, PathEntry::Break))
            .count()
    }

    /// Polylines between breaks.
    pub fn strokes(&self) -> Vec<Vec<P>> {
        let mut out: Vec<Vec<P>> = Vec::new();
        let mut current = Vec::new();
        for entry in &self.entries {
            match entry {
                PathEntry::Point(p) => current.push(*p),
                PathEntry::Break => {
                    if !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

/// Splits one logical forward motion into fixed-size increments plus a final
/// remainder, so it can be animated over several ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stride {
    step: f64,
    full_steps: u64,
    taken: u64,
    tail: f64,
    sign: f64,
}

impl Stride {
    /// `step` must be finite and positive.
    pub fn new(distance: f64, step: f64) -> Stride {
        let sign = if distance < 0.0 { -1.0 } else { 1.0 };
        let magnitude = distance.abs();
        // absorb rounding so that e.g. 1.0 / 0.2 counts five steps, not four
        let slack = step * 1e-9;
        let full_steps = ((magnitude + slack) / step).floor() as u64;
        let tail = magnitude - full_steps as f64 * step;
        Stride {
            step,
            full_steps,
            taken: 0,
            tail: if tail > slack { tail } else { 0.0 },
            sign,
        }
    }

    pub fn is_done(&self) -> bool {
        self.taken >= self.full_steps && self.tail == 0.0
    }

    /// Distance still to travel, signed.
    pub fn remaining(&self) -> f64 {
        let full = (self.full_steps - self.taken.min(self.full_steps)) as f64 * self.step;
        (full + self.tail) * self.sign
    }
}

impl Iterator for Stride {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.taken < self.full_steps {
            self.taken += 1;
            Some(self.step * self.sign)
        } else if self.tail > 0.0 {
            let t = self.tail;
            self.tail = 0.0;
            Some(t * self.sign)
        } else {
            None
        }
    }
}
