//! Easing functions for animation timing.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingFunction {
	/// No easing.
	Linear,
	/// Sinusoidal ease-in-out, the default for tree transitions.
	#[default]
	SinInOut,
	/// Cubic ease-in-out.
	CubicInOut,
	/// Cubic ease-out.
	CubicOut,
}

impl EasingFunction {
	/// Evaluate at `t`, clamped to `[0, 1]`.
	pub fn evaluate(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Self::Linear => t,
			Self::SinInOut => (1.0 - (PI * t).cos()) / 2.0,
			Self::CubicInOut => {
				let t2 = t * 2.0;
				if t2 <= 1.0 {
					t2 * t2 * t2 / 2.0
				} else {
					let t2 = t2 - 2.0;
					(t2 * t2 * t2 + 2.0) / 2.0
				}
			}
			Self::CubicOut => 1.0 - (1.0 - t).powi(3),
		}
	}
}
