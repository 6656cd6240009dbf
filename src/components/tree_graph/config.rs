use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;
use super::error::{Result, TreeGraphError};
use super::types::{Margin, Orientation, Size};

/// Viewer and layout settings for a tree graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeGraphConfig {
	/// Viewer width before margins.
	pub width: f64,
	/// Viewer height before margins.
	pub height: f64,
	pub margin: Margin,
	/// Size of one layout cell; depth spacing is `width` for left-to-right trees.
	pub node_size: Size,
	pub orientation: Orientation,
	/// Duration of every node and link transition in milliseconds.
	pub transition_ms: f64,
	pub easing: EasingFunction,
}

impl Default for TreeGraphConfig {
	fn default() -> Self {
		Self {
			width: 200.0,
			height: 200.0,
			margin: Margin::default(),
			node_size: Size::new(150.0, 60.0),
			orientation: Orientation::LeftToRight,
			transition_ms: 200.0,
			easing: EasingFunction::SinInOut,
		}
	}
}

impl TreeGraphConfig {
	pub fn from_json_str(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if !(is_positive(self.width) && is_positive(self.height)) {
			return Err(TreeGraphError::InvalidConfig(format!(
				"viewer size must be positive, got {}x{}",
				self.width, self.height
			)));
		}
		let m = &self.margin;
		if ![m.top, m.left, m.bottom, m.right]
			.iter()
			.all(|v| v.is_finite() && *v >= 0.0)
		{
			return Err(TreeGraphError::InvalidConfig(format!(
				"margins must be non-negative, got {m:?}"
			)));
		}
		if !(is_positive(self.node_size.width) && is_positive(self.node_size.height)) {
			return Err(TreeGraphError::InvalidNodeSize {
				width: self.node_size.width,
				height: self.node_size.height,
			});
		}
		if !(self.transition_ms.is_finite() && self.transition_ms >= 0.0) {
			return Err(TreeGraphError::InvalidConfig(format!(
				"transition_ms must be non-negative, got {}",
				self.transition_ms
			)));
		}
		Ok(())
	}

	/// Viewer size including margins.
	pub fn viewer_size(&self) -> Size {
		Size::new(
			self.width + self.margin.horizontal(),
			self.height + self.margin.vertical(),
		)
	}
}

fn is_positive(v: f64) -> bool {
	v.is_finite() && v > 0.0
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_are_valid() {
		let config = TreeGraphConfig::default();
		assert!(config.validate().is_ok());
		assert_eq!(config.viewer_size(), Size::new(200.0, 200.0));
	}

	#[test]
	fn test_partial_json_keeps_defaults() {
		let config = TreeGraphConfig::from_json_str(
			r#"{ "margin": { "top": 40, "left": 40 }, "orientation": "top_to_bottom" }"#,
		)
		.unwrap();
		assert_eq!(config.margin.bottom, 0.0);
		assert_eq!(config.viewer_size(), Size::new(240.0, 240.0));
		assert_eq!(config.orientation, Orientation::TopToBottom);
		assert_eq!(config.transition_ms, 200.0);
		assert_eq!(config.easing, EasingFunction::SinInOut);
	}

	#[test]
	fn test_rejects_negative_margin() {
		let err = TreeGraphConfig::from_json_str(r#"{ "margin": { "left": -1 } }"#);
		assert!(matches!(err, Err(TreeGraphError::InvalidConfig(_))));
	}

	#[test]
	fn test_rejects_bad_node_size() {
		let config = TreeGraphConfig {
			node_size: Size::new(150.0, 0.0),
			..TreeGraphConfig::default()
		};
		assert!(matches!(
			config.validate(),
			Err(TreeGraphError::InvalidNodeSize { .. })
		));
	}

	#[test]
	fn test_rejects_bad_json() {
		let err = TreeGraphConfig::from_json_str("{ width: }");
		assert!(matches!(err, Err(TreeGraphError::Json(_))));
	}
}
