//! Layout of the visible subtree plus reconciliation of animate-from coordinates.

use std::collections::HashMap;

use log::trace;

use super::error::{Result, TreeGraphError};
use super::model::{TreeNode, TreeStructure};
use super::tidy::tidy_layout;
use super::types::{NodeId, Orientation, Point, Size};

struct Placed {
	position: Point,
	height: usize,
}

/// Lays out the visible part of `structure` and returns the reconciled structure together
/// with the bounding size of the visible nodes.
///
/// Visibility is derived from the `expanded` flags; the previous `active` flags and positions
/// are what the reconciliation diffs against.
pub fn recompute_layout(
	structure: &TreeStructure,
	node_size: Size,
	orientation: Orientation,
) -> Result<(TreeStructure, Size)> {
	if !(node_size.width.is_finite()
		&& node_size.height.is_finite()
		&& node_size.width > 0.0
		&& node_size.height > 0.0)
	{
		return Err(TreeGraphError::InvalidNodeSize {
			width: node_size.width,
			height: node_size.height,
		});
	}

	let (breadth_unit, depth_unit) = match orientation {
		Orientation::LeftToRight => (node_size.height, node_size.width),
		Orientation::TopToBottom => (node_size.width, node_size.height),
	};
	let root = structure.root().id.clone();
	let placements = tidy_layout(
		root,
		|id| match structure.get(id) {
			Some(node) if node.expanded => node.child_ids.clone(),
			_ => Vec::new(),
		},
		(breadth_unit, depth_unit),
	);

	let (mut min_b, mut max_b, mut min_d, mut max_d) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
	for p in &placements {
		min_b = min_b.min(p.breadth);
		max_b = max_b.max(p.breadth);
		min_d = min_d.min(p.depth);
		max_d = max_d.max(p.depth);
	}
	let breadth_extent = max_b - min_b + breadth_unit;
	let depth_extent = max_d - min_d + depth_unit;
	let offset = breadth_extent / 2.0 - (max_b + min_b) / 2.0;

	let size = match orientation {
		Orientation::LeftToRight => Size::new(depth_extent, breadth_extent),
		Orientation::TopToBottom => Size::new(breadth_extent, depth_extent),
	};

	let mut visible_order = Vec::with_capacity(placements.len());
	let mut placed: HashMap<NodeId, Placed> = HashMap::with_capacity(placements.len());
	for p in placements {
		let position = match orientation {
			Orientation::LeftToRight => Point::new(p.depth, p.breadth + offset),
			Orientation::TopToBottom => Point::new(p.breadth + offset, p.depth),
		};
		visible_order.push(p.key.clone());
		placed.insert(
			p.key,
			Placed {
				position,
				height: p.height,
			},
		);
	}
	trace!(
		"laid out {} of {} nodes, bounds {:.1}x{:.1}",
		visible_order.len(),
		structure.len(),
		size.width,
		size.height
	);

	let mut next = structure.clone();
	// Visible nodes first so every hidden node finds its ancestor's fresh position.
	for id in &visible_order {
		reconcile(&mut next, &placed, id);
	}
	let hidden: Vec<NodeId> = structure
		.nodes()
		.filter(|n| !placed.contains_key(&n.id))
		.map(|n| n.id.clone())
		.collect();
	for id in &hidden {
		reconcile(&mut next, &placed, id);
	}

	Ok((next, size))
}

fn nearest_placed<'a>(
	structure: &'a TreeStructure,
	placed: &HashMap<NodeId, Placed>,
	node: &TreeNode,
) -> &'a TreeNode {
	structure
		.nearest_ancestor_where(&node.id, |n| placed.contains_key(&n.id))
		.unwrap_or_else(|| structure.root())
}

fn reconcile(structure: &mut TreeStructure, placed: &HashMap<NodeId, Placed>, id: &NodeId) {
	let Some(node) = structure.get(id) else {
		return;
	};
	let target = placed.get(id);
	let updated = match (node.active, target) {
		(true, None) => {
			let anchor = nearest_placed(structure, placed, node);
			TreeNode {
				active: false,
				x0: node.x,
				y0: node.y,
				x: anchor.x,
				y: anchor.y,
				..node.clone()
			}
		}
		(false, Some(target)) => {
			let anchor = nearest_placed(structure, placed, node);
			TreeNode {
				active: true,
				x0: anchor.x0,
				y0: anchor.y0,
				x: target.position.x,
				y: target.position.y,
				height: target.height,
				..node.clone()
			}
		}
		(true, Some(target)) => TreeNode {
			x0: node.x,
			y0: node.y,
			x: target.position.x,
			y: target.position.y,
			height: target.height,
			..node.clone()
		},
		(false, None) => return,
	};
	structure.replace(updated);
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;
	use crate::components::tree_graph::model::ConfigNode;
	use crate::components::tree_graph::model::tests::sample_config;

	const NODE_SIZE: Size = Size::new(150.0, 60.0);

	fn layout(tree: &TreeStructure) -> (TreeStructure, Size) {
		recompute_layout(tree, NODE_SIZE, Orientation::LeftToRight).unwrap()
	}

	fn pos(tree: &TreeStructure, id: &str) -> Point {
		tree.get(&id.into()).unwrap().position()
	}

	fn origin(tree: &TreeStructure, id: &str) -> Point {
		tree.get(&id.into()).unwrap().origin()
	}

	fn visible_ids(tree: &TreeStructure) -> Vec<&str> {
		tree.visible().map(|n| n.id.as_str()).collect()
	}

	fn assert_activity_invariant(tree: &TreeStructure) {
		for node in tree.nodes() {
			let mut expected = true;
			let mut parent = node.parent_id.clone();
			while let Some(pid) = parent {
				let p = tree.get(&pid).unwrap();
				expected &= p.expanded;
				parent = p.parent_id.clone();
			}
			assert_eq!(node.active, expected, "activity of {}", node.id);
		}
		assert!(tree.root().active, "root must stay active");
	}

	#[test]
	fn test_initial_layout() {
		let (tree, size) = layout(&TreeStructure::build(&sample_config()));
		assert_eq!(visible_ids(&tree), ["root", "root.0", "root.1"]);
		assert_eq!(size, Size::new(300.0, 120.0));
		assert_eq!(pos(&tree, "root"), Point::new(0.0, 60.0));
		assert_eq!(pos(&tree, "root.0"), Point::new(150.0, 30.0));
		assert_eq!(pos(&tree, "root.1"), Point::new(150.0, 90.0));
		assert_activity_invariant(&tree);
	}

	#[test]
	fn test_expand_grows_children_out_of_parent() {
		let (tree, _) = layout(&TreeStructure::build(&sample_config()));
		let c1_before = pos(&tree, "root.0");
		let c2_before = pos(&tree, "root.1");

		let (tree, size) = layout(&tree.toggle(&"root.0".into()).unwrap());
		assert_eq!(
			visible_ids(&tree),
			["root", "root.0", "root.0.0", "root.0.1", "root.1"]
		);
		assert_eq!(size, Size::new(450.0, 150.0));
		assert_eq!(origin(&tree, "root.0.0"), c1_before);
		assert_eq!(origin(&tree, "root.0.1"), c1_before);
		assert_eq!(pos(&tree, "root.0.0"), Point::new(300.0, 30.0));
		assert_eq!(pos(&tree, "root.0.1"), Point::new(300.0, 90.0));

		assert_eq!(origin(&tree, "root.0"), c1_before);
		assert_eq!(pos(&tree, "root.0"), Point::new(150.0, 60.0));
		assert_eq!(origin(&tree, "root.1"), c2_before);
		assert_eq!(pos(&tree, "root.1"), Point::new(150.0, 120.0));
		assert_activity_invariant(&tree);
	}

	#[test]
	fn test_collapse_sucks_descendants_into_parent() {
		let config = sample_config();
		let (tree, _) = layout(&TreeStructure::build(&config));
		let (expanded, _) = layout(&tree.toggle(&"root.0".into()).unwrap());
		let gc1_before = pos(&expanded, "root.0.0");
		let gc2_before = pos(&expanded, "root.0.1");

		let (collapsed, _) = layout(&expanded.toggle(&"root.0".into()).unwrap());
		let c1_now = pos(&collapsed, "root.0");
		assert_eq!(visible_ids(&collapsed), ["root", "root.0", "root.1"]);
		assert_eq!(origin(&collapsed, "root.0.0"), gc1_before);
		assert_eq!(origin(&collapsed, "root.0.1"), gc2_before);
		assert_eq!(pos(&collapsed, "root.0.0"), c1_now);
		assert_eq!(pos(&collapsed, "root.0.1"), c1_now);
		assert_activity_invariant(&collapsed);
	}

	#[test]
	fn test_expand_collapse_round_trip() {
		let (tree, size) = layout(&TreeStructure::build(&sample_config()));
		let (expanded, _) = layout(&tree.toggle(&"root.1".into()).unwrap());
		let (back, back_size) = layout(&expanded.toggle(&"root.1".into()).unwrap());
		assert_eq!(size, back_size);
		for node in tree.visible() {
			assert_eq!(back.get(&node.id).unwrap().position(), node.position());
		}
	}

	#[test]
	fn test_deep_collapse_targets_nearest_visible_ancestor() {
		let mut config = sample_config();
		config.children[0].expanded = true;
		config.children[0].children[0] = config.children[0].children[0]
			.clone()
			.expanded(true)
			.with_children(vec![ConfigNode::new("ggc")]);
		let (tree, _) = layout(&TreeStructure::build(&config));
		assert!(tree.get(&"root.0.0.0".into()).unwrap().active);

		let (collapsed, _) = layout(&tree.set_expanded(&"root.0".into(), false).unwrap());
		let c1 = pos(&collapsed, "root.0");
		assert_eq!(pos(&collapsed, "root.0.0.0"), c1);
		assert_eq!(pos(&collapsed, "root.0.0"), c1);
		assert_activity_invariant(&collapsed);
	}

	#[test]
	fn test_hidden_nodes_are_shared_untouched() {
		let (tree, _) = layout(&TreeStructure::build(&sample_config()));
		let (next, _) = layout(&tree);
		let hidden: NodeId = "root.1.0".into();
		assert!(Rc::ptr_eq(
			tree.get_rc(&hidden).unwrap(),
			next.get_rc(&hidden).unwrap()
		));
	}

	#[test]
	fn test_top_to_bottom_swaps_axes() {
		let tree = TreeStructure::build(&sample_config());
		let (tree, size) = recompute_layout(&tree, NODE_SIZE, Orientation::TopToBottom).unwrap();
		assert_eq!(size, Size::new(300.0, 120.0));
		assert_eq!(pos(&tree, "root"), Point::new(150.0, 0.0));
		assert_eq!(pos(&tree, "root.0"), Point::new(75.0, 60.0));
		assert_eq!(pos(&tree, "root.1"), Point::new(225.0, 60.0));
	}

	#[test]
	fn test_invalid_node_size() {
		let tree = TreeStructure::build(&sample_config());
		let err = recompute_layout(&tree, Size::new(0.0, 10.0), Orientation::LeftToRight);
		assert!(matches!(err, Err(TreeGraphError::InvalidNodeSize { .. })));
		let err = recompute_layout(&tree, Size::new(f64::NAN, 10.0), Orientation::LeftToRight);
		assert!(matches!(err, Err(TreeGraphError::InvalidNodeSize { .. })));
	}
}
