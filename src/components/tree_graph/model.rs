//! Tree state model: a flat arena of node records keyed by path identifiers.
//!
//! The configuration tree is owned and immutable. [`TreeStructure::build`] flattens it into a
//! map from [`NodeId`] to [`TreeNode`], keeping collapsed subtrees around as inactive entries so
//! they can be animated back in later. Updates never mutate a node in place: they produce a new
//! structure that shares every untouched record with the old one.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Result, TreeGraphError};
use super::types::{NodeId, Point};

/// One node of the caller-supplied configuration tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
	pub label: String,
	#[serde(default)]
	pub data: Value,
	#[serde(default)]
	pub children: Vec<ConfigNode>,
	#[serde(default)]
	pub expanded: bool,
}

impl ConfigNode {
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			..Self::default()
		}
	}

	pub fn with_data(mut self, data: Value) -> Self {
		self.data = data;
		self
	}

	pub fn with_children(mut self, children: Vec<ConfigNode>) -> Self {
		self.children = children;
		self
	}

	pub fn expanded(mut self, expanded: bool) -> Self {
		self.expanded = expanded;
		self
	}

	/// Parse a configuration tree, reporting the path of the first bad node.
	pub fn from_value(value: Value) -> Result<Self> {
		parse_node(value, &NodeId::root())
	}

	pub fn from_json_str(json: &str) -> Result<Self> {
		Self::from_value(serde_json::from_str(json)?)
	}
}

#[derive(Deserialize)]
struct RawNode {
	label: String,
	#[serde(default)]
	data: Value,
	#[serde(default)]
	children: Vec<Value>,
	#[serde(default)]
	expanded: Option<bool>,
}

fn parse_node(value: Value, id: &NodeId) -> Result<ConfigNode> {
	let raw = RawNode::deserialize(value).map_err(|e| TreeGraphError::MalformedConfig {
		path: id.to_string(),
		reason: e.to_string(),
	})?;
	let children = raw
		.children
		.into_iter()
		.enumerate()
		.map(|(i, child)| parse_node(child, &id.child(i)))
		.collect::<Result<Vec<_>>>()?;
	Ok(ConfigNode {
		label: raw.label,
		data: raw.data,
		children,
		expanded: raw.expanded.unwrap_or(false),
	})
}

/// Derived per-node state.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
	pub id: NodeId,
	/// `None` only for the root.
	pub parent_id: Option<NodeId>,
	pub label: String,
	pub data: Rc<Value>,
	pub child_ids: Vec<NodeId>,
	pub expanded: bool,
	/// Part of the visible subtree as of the last layout.
	pub active: bool,
	pub x: f64,
	pub y: f64,
	/// Where the node animates from.
	pub x0: f64,
	pub y0: f64,
	/// Height of this node's subtree in the visible tree.
	pub height: usize,
	pub depth: usize,
}

impl TreeNode {
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	pub fn origin(&self) -> Point {
		Point::new(self.x0, self.y0)
	}

	pub fn has_children(&self) -> bool {
		!self.child_ids.is_empty()
	}
}

/// The keyed node map for one configuration tree.
#[derive(Clone, Debug)]
pub struct TreeStructure {
	nodes: HashMap<NodeId, Rc<TreeNode>>,
	/// All identifiers in pre-order; fixed for the lifetime of the configuration.
	order: Rc<[NodeId]>,
}

impl TreeStructure {
	pub fn build(config: &ConfigNode) -> Self {
		let mut nodes = HashMap::new();
		let mut order = Vec::new();
		insert_config(config, NodeId::root(), None, 0, &mut nodes, &mut order);
		debug!("built tree structure with {} nodes", order.len());
		Self {
			nodes,
			order: order.into(),
		}
	}

	pub fn get(&self, id: &NodeId) -> Option<&TreeNode> {
		self.nodes.get(id).map(Rc::as_ref)
	}

	pub(crate) fn get_rc(&self, id: &NodeId) -> Option<&Rc<TreeNode>> {
		self.nodes.get(id)
	}

	pub fn root(&self) -> &TreeNode {
		&self.nodes[&self.order[0]]
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Every node in pre-order, visible or not.
	pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> + '_ {
		self.order.iter().map(|id| self.nodes[id].as_ref())
	}

	/// Active nodes in pre-order.
	pub fn visible(&self) -> impl Iterator<Item = &TreeNode> + '_ {
		self.nodes().filter(|n| n.active)
	}

	/// Closest ancestor of `id` accepted by `accept`, walking towards the root.
	pub fn nearest_ancestor_where(
		&self,
		id: &NodeId,
		mut accept: impl FnMut(&TreeNode) -> bool,
	) -> Option<&TreeNode> {
		let mut parent = self.get(id)?.parent_id.as_ref();
		while let Some(pid) = parent {
			let node = self.get(pid)?;
			if accept(node) {
				return Some(node);
			}
			parent = node.parent_id.as_ref();
		}
		None
	}

	/// Closest active ancestor of `id`, by the `active` flags currently stored.
	pub fn nearest_active_ancestor(&self, id: &NodeId) -> Option<&TreeNode> {
		self.nearest_ancestor_where(id, |node| node.active)
	}

	/// Returns a copy with `id`'s expansion set to `value`; all other records are shared.
	pub fn set_expanded(&self, id: &NodeId, value: bool) -> Result<Self> {
		let node = self
			.nodes
			.get(id)
			.ok_or_else(|| TreeGraphError::UnknownNode(id.clone()))?;
		let mut next = self.clone();
		if node.expanded != value {
			debug!("{} node {}", if value { "expanding" } else { "collapsing" }, id);
			let updated = TreeNode {
				expanded: value,
				..TreeNode::clone(node)
			};
			next.nodes.insert(id.clone(), Rc::new(updated));
		}
		Ok(next)
	}

	pub fn toggle(&self, id: &NodeId) -> Result<Self> {
		let expanded = self
			.get(id)
			.ok_or_else(|| TreeGraphError::UnknownNode(id.clone()))?
			.expanded;
		self.set_expanded(id, !expanded)
	}

	pub(crate) fn replace(&mut self, node: TreeNode) {
		self.nodes.insert(node.id.clone(), Rc::new(node));
	}
}

fn insert_config(
	config: &ConfigNode,
	id: NodeId,
	parent_id: Option<NodeId>,
	depth: usize,
	nodes: &mut HashMap<NodeId, Rc<TreeNode>>,
	order: &mut Vec<NodeId>,
) {
	let child_ids: Vec<NodeId> = (0..config.children.len()).map(|i| id.child(i)).collect();
	let node = TreeNode {
		id: id.clone(),
		active: parent_id.is_none(),
		parent_id,
		label: config.label.clone(),
		data: Rc::new(config.data.clone()),
		child_ids: child_ids.clone(),
		expanded: config.expanded,
		x: 0.0,
		y: 0.0,
		x0: 0.0,
		y0: 0.0,
		height: 0,
		depth,
	};
	nodes.insert(id.clone(), Rc::new(node));
	order.push(id.clone());
	for (child, child_id) in config.children.iter().zip(child_ids) {
		insert_config(child, child_id, Some(id.clone()), depth + 1, nodes, order);
	}
}
