use glam::{DQuat, DVec3};
use serde::Serialize;

use super::{Path, Turtle};

/// Rotate `v` by `rad` radians about `axis`, which must be a unit vector.
fn rotate(v: DVec3, axis: DVec3, rad: f64) -> DVec3 {
    DQuat::from_axis_angle(axis, rad) * v
}

/// Turtle in space. Orientation is a body frame: `roll_axis` points forward,
/// `pitch_axis` to the left and `yaw_axis` up.
#[derive(Debug, Clone, Serialize)]
pub struct SpatialTurtle {
    position: DVec3,
    roll_axis: DVec3,
    pitch_axis: DVec3,
    yaw_axis: DVec3,
    pen_down: bool,
    path: Path<DVec3>,
}

impl Default for SpatialTurtle {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialTurtle {
    pub fn new() -> Self {
        let mut t = SpatialTurtle {
            position: DVec3::ZERO,
            roll_axis: DVec3::X,
            pitch_axis: DVec3::Y,
            yaw_axis: DVec3::Z,
            pen_down: false,
            path: Path::new(),
        };
        t.pendown();
        t
    }

    pub fn roll_axis(&self) -> DVec3 {
        self.roll_axis
    }

    pub fn pitch_axis(&self) -> DVec3 {
        self.pitch_axis
    }

    pub fn yaw_axis(&self) -> DVec3 {
        self.yaw_axis
    }

    /// Rotate the pitch and yaw axes about the forward axis.
    pub fn roll(&mut self, deg: f64) {
        self.roll_axis = self.roll_axis.normalize();
        let rad = deg.to_radians();
        self.pitch_axis = rotate(self.pitch_axis, self.roll_axis, rad);
        self.yaw_axis = rotate(self.yaw_axis, self.roll_axis, rad);
    }

    pub fn pitch(&mut self, deg: f64) {
        self.pitch_axis = self.pitch_axis.normalize();
        let rad = deg.to_radians();
        self.roll_axis = rotate(self.roll_axis, self.pitch_axis, rad);
        self.yaw_axis = rotate(self.yaw_axis, self.pitch_axis, rad);
    }

    pub fn yaw(&mut self, deg: f64) {
        self.yaw_axis = self.yaw_axis.normalize();
        let rad = deg.to_radians();
        self.roll_axis = rotate(self.roll_axis, self.yaw_axis, rad);
        self.pitch_axis = rotate(self.pitch_axis, self.yaw_axis, rad);
    }

    /// Rebuild an exact orthonormal frame (Gram-Schmidt, forward axis kept).
    /// Rotations alone only renormalize the axis they turn about, so callers
    /// running very long programs may call this to remove accumulated skew.
    pub fn orthonormalize(&mut self) {
        let roll = self.roll_axis.normalize();
        let pitch = (self.pitch_axis - roll * roll.dot(self.pitch_axis)).normalize();
        self.roll_axis = roll;
        self.pitch_axis = pitch;
        self.yaw_axis = roll.cross(pitch);
    }

    /// Largest pairwise dot product between the frame axes.
    pub fn skew(&self) -> f64 {
        let (r, p, y) = (self.roll_axis, self.pitch_axis, self.yaw_axis);
        r.dot(p).abs().max(r.dot(y).abs()).max(p.dot(y).abs())
    }
}

impl Turtle for SpatialTurtle {
    type Point = DVec3;

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
        self.position = from + self.roll_axis.normalize() * distance;
        self.path.record_move(from, self.position, self.pen_down);
    }

    fn left(&mut self, deg: f64) {
        self.yaw(deg);
    }

    fn right(&mut self, deg: f64) {
        self.yaw(-deg);
    }

    fn up(&mut self, deg: f64) {
        self.pitch(-deg);
    }

    fn down(&mut self, deg: f64) {
        self.pitch(deg);
    }

    fn roll_cw(&mut self, deg: f64) {
        self.roll(deg);
    }

    fn roll_ccw(&mut self, deg: f64) {
        self.roll(-deg);
    }

    fn reset(&mut self) {
        self.position = DVec3::ZERO;
        self.roll_axis = DVec3::X;
        self.pitch_axis = DVec3::Y;
        self.yaw_axis = DVec3::Z;
        self.path.clear();
        if self.pen_down {
            self.path.push_point(self.position);
        }
    }

    fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    fn position(&self) -> DVec3 {
        self.position
    }

    fn path(&self) -> &Path<DVec3> {
        &self.path
    }
}
