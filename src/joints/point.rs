//! Local anchor points and the uniform scale factor applied to them.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// A point in a body's local space, measured from the body's transform origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(&mut self, factor: ScaleFactor) {
        self.x *= factor.get();
        self.y *= factor.get();
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl From<Vec2> for Point {
    fn from(value: Vec2) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vec2 {
    fn from(value: Point) -> Self {
        value.to_vec2()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// A uniform scale factor that is known to be usable.
///
/// Zero, negative and non-finite values all mean "no scale provided"
/// and never produce a `ScaleFactor`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactor(f32);

impl ScaleFactor {
    pub fn new(factor: f32) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}
