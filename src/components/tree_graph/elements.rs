//! Drawable node and link props plus their animation presets.

use std::rc::Rc;

use serde_json::Value;

use super::animation::Animation;
use super::easing::EasingFunction;
use super::interpolate::{AnimatedValue, tween};
use super::model::{TreeNode, TreeStructure};
use super::transition::{Animatable, PropsEqual, SelectAnimation, TransitionKind};
use super::types::{NodeId, Point};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeProps {
	pub id: NodeId,
	/// Where the node animates from.
	pub initial: Point,
	pub position: Point,
	pub scale: f64,
	pub label: String,
	pub data: Rc<Value>,
	pub has_children: bool,
	pub expanded: bool,
}

impl NodeProps {
	pub fn from_node(node: &TreeNode) -> Self {
		Self {
			id: node.id.clone(),
			initial: node.origin(),
			position: node.position(),
			scale: 1.0,
			label: node.label.clone(),
			data: Rc::clone(&node.data),
			has_children: node.has_children(),
			expanded: node.expanded,
		}
	}
}

impl Animatable for NodeProps {
	fn apply(&mut self, key: &str, value: &AnimatedValue) {
		let Some(v) = value.as_f64() else {
			return;
		};
		match key {
			"x" => self.position.x = v,
			"y" => self.position.y = v,
			"scale" => self.scale = v,
			_ => {}
		}
	}
}

/// Connector from a child (`source`) to its parent (`target`).
#[derive(Clone, Debug, PartialEq)]
pub struct LinkProps {
	/// Identifier of the child end; links are keyed by it.
	pub id: NodeId,
	pub source: Point,
	pub target: Point,
	pub source_initial: Point,
	pub target_initial: Point,
}

impl LinkProps {
	/// Link into `node` from its parent; `None` for the root.
	pub fn for_node(structure: &TreeStructure, node: &TreeNode) -> Option<Self> {
		let parent = structure.get(node.parent_id.as_ref()?)?;
		Some(Self {
			id: node.id.clone(),
			source: node.position(),
			target: parent.position(),
			source_initial: node.origin(),
			target_initial: parent.origin(),
		})
	}
}

impl Animatable for LinkProps {
	fn apply(&mut self, key: &str, value: &AnimatedValue) {
		let Some(p) = value.as_point() else {
			return;
		};
		match key {
			"source" => self.source = p,
			"target" => self.target = p,
			_ => {}
		}
	}
}

/// Nodes slide from `initial` to `position` and scale in on enter, out on exit.
pub fn node_animation(
	props: &NodeProps,
	kind: TransitionKind,
	duration_ms: f64,
	easing: EasingFunction,
) -> Animation {
	let (from_scale, to_scale) = match kind {
		TransitionKind::Enter => (0.0, 1.0),
		TransitionKind::Exit => (1.0, 0.0),
		TransitionKind::Change => (1.0, 1.0),
	};
	Animation::new()
		.animate_property("x", duration_ms, tween(props.initial.x, props.position.x, easing))
		.animate_property("y", duration_ms, tween(props.initial.y, props.position.y, easing))
		.animate_property("scale", duration_ms, tween(from_scale, to_scale, easing))
}

pub fn link_animation(props: &LinkProps, duration_ms: f64, easing: EasingFunction) -> Animation {
	Animation::new()
		.animate_property("source", duration_ms, tween(props.source_initial, props.source, easing))
		.animate_property("target", duration_ms, tween(props.target_initial, props.target, easing))
}

pub fn node_selector(duration_ms: f64, easing: EasingFunction) -> SelectAnimation<NodeProps> {
	Rc::new(move |props: &NodeProps, kind: TransitionKind| {
		Some(node_animation(props, kind, duration_ms, easing))
	})
}

pub fn link_selector(duration_ms: f64, easing: EasingFunction) -> SelectAnimation<LinkProps> {
	Rc::new(move |props: &LinkProps, _: TransitionKind| {
		Some(link_animation(props, duration_ms, easing))
	})
}

/// Node props only animate when the coordinates moved.
pub fn node_props_equal() -> PropsEqual<NodeProps> {
	Rc::new(|a: &NodeProps, b: &NodeProps| a.initial == b.initial && a.position == b.position)
}

pub fn link_props_equal() -> PropsEqual<LinkProps> {
	Rc::new(|a: &LinkProps, b: &LinkProps| {
		a.source == b.source
			&& a.target == b.target
			&& a.source_initial == b.source_initial
			&& a.target_initial == b.target_initial
	})
}
