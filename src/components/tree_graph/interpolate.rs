//! Animated values and the interpolators that produce them.

use super::easing::EasingFunction;
use super::types::Point;

/// A value emitted by an animation for one named property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatedValue {
	Number(f64),
	Point(Point),
}

impl AnimatedValue {
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Number(v) => Some(*v),
			Self::Point(_) => None,
		}
	}

	pub fn as_point(&self) -> Option<Point> {
		match self {
			Self::Point(p) => Some(*p),
			Self::Number(_) => None,
		}
	}
}

impl From<f64> for AnimatedValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<Point> for AnimatedValue {
	fn from(value: Point) -> Self {
		Self::Point(value)
	}
}

/// Types that can be blended between two values.
pub trait Interpolate: Sized {
	/// `t = 0` yields `self`, `t = 1` yields `to`.
	fn interpolate(&self, to: &Self, t: f64) -> Self;
}

impl Interpolate for f64 {
	fn interpolate(&self, to: &Self, t: f64) -> Self {
		self + (to - self) * t
	}
}

impl Interpolate for Point {
	fn interpolate(&self, to: &Self, t: f64) -> Self {
		Point::new(self.x.interpolate(&to.x, t), self.y.interpolate(&to.y, t))
	}
}

/// Interpolator from `from` to `to` with `easing` applied to the progress.
pub fn tween<T>(from: T, to: T, easing: EasingFunction) -> impl Fn(f64) -> AnimatedValue + 'static
where
	T: Interpolate + Into<AnimatedValue> + 'static,
{
	move |t| from.interpolate(&to, easing.evaluate(t)).into()
}
