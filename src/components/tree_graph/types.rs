use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROOT_ID: &str = "root";

/// Stable path identifier of a tree node (`root`, `root.0`, `root.0.1`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
	pub fn root() -> Self {
		Self(ROOT_ID.to_owned())
	}

	/// Identifier of the `index`-th child of this node.
	pub fn child(&self, index: usize) -> Self {
		Self(format!("{}.{}", self.0, index))
	}

	pub fn is_root(&self) -> bool {
		self.0 == ROOT_ID
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
	pub top: f64,
	pub left: f64,
	pub bottom: f64,
	pub right: f64,
}

impl Margin {
	pub const fn uniform(value: f64) -> Self {
		Self {
			top: value,
			left: value,
			bottom: value,
			right: value,
		}
	}

	pub fn horizontal(&self) -> f64 {
		self.left + self.right
	}

	pub fn vertical(&self) -> f64 {
		self.top + self.bottom
	}
}

/// Which screen axis the tree grows along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
	/// Root on the left, depth along x.
	#[default]
	LeftToRight,
	/// Root on top, depth along y.
	TopToBottom,
}
