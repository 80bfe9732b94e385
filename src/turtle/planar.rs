use glam::DVec2;
use serde::{Serialize, Serializer};

use super::{Path, Turtle};

/// Heading angle kept as a compensated (Neumaier) sum of degrees.
///
/// Many small turns would otherwise drift with plain `f64` accumulation; the
/// running compensation term carries the low-order bits lost by each add.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Heading {
    sum: f64,
    carry: f64,
}

impl Heading {
    pub fn turn(&mut self, deg: f64) {
        let t = self.sum + deg;
        if self.sum.abs() >= deg.abs() {
            self.carry += (self.sum - t) + deg;
        } else {
            self.carry += (deg - t) + self.sum;
        }
        self.sum = t;
    }

    /// Heading in degrees, folded into `[0, 360)`.
    pub fn degrees(&self) -> f64 {
        let d = (self.sum + self.carry).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0, or give -0.0
        if d >= 360.0 || d == 0.0 {
            0.0
        } else {
            d
        }
    }

    pub fn radians(&self) -> f64 {
        self.degrees().to_radians()
    }
}

impl Serialize for Heading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.degrees())
    }
}

/// Turtle on the plane: position, heading and pen.
#[derive(Debug, Clone, Serialize)]
pub struct PlanarTurtle {
    position: DVec2,
    heading: Heading,
    pen_down: bool,
    path: Path<DVec2>,
}

impl Default for PlanarTurtle {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanarTurtle {
    /// A turtle at the origin facing +x with the pen down.
    pub fn new() -> Self {
        let mut t = PlanarTurtle {
            position: DVec2::ZERO,
            heading: Heading::default(),
            pen_down: false,
            path: Path::new(),
        };
        t.pendown();
        t
    }

    pub fn heading(&self) -> &Heading {
        &self.heading
    }
}

impl Turtle for PlanarTurtle {
    type Point = DVec2;

    fn penup(&mut self) {
        self.pen_down = false;
    }

    fn pendown(&mut self) {
        self.pen_down = true;
        if self.path.needs_start() {
            self.path.push_point(self.position);
        }
    }

    fn forward(&mut self, distance: f64) {
        let from = self.position;
        self.position = from + DVec2::from_angle(self.heading.radians()) * distance;
        self.path.record_move(from, self.position, self.pen_down);
    }

    fn left(&mut self, deg: f64) {
        self.heading.turn(deg);
    }

    fn right(&mut self, deg: f64) {
        self.heading.turn(-deg);
    }

    fn reset(&mut self) {
        self.position = DVec2::ZERO;
        self.heading = Heading::default();
        self.path.clear();
        if self.pen_down {
            self.path.push_point(self.position);
        }
    }

    fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    fn position(&self) -> DVec2 {
        self.position
    }

    fn path(&self) -> &Path<DVec2> {
        &self.path
    }
}
