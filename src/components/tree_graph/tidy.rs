//! Tidy tree layout (Buchheim, Junger and Leipert's linear-time Walker algorithm).
//!
//! Produces a breadth coordinate and a depth coordinate per node. Siblings sit one spacing unit
//! apart, adjacent cousins two units. The root lands at breadth 0.

/// Position assigned to one laid-out node.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement<K> {
	pub key: K,
	/// Coordinate across the tree (between siblings).
	pub breadth: f64,
	/// Coordinate along the tree (root to leaves).
	pub depth: f64,
	pub level: usize,
	/// Distance to the deepest descendant in the laid-out tree.
	pub height: usize,
}

#[derive(Debug)]
struct TidyNode<K> {
	key: Option<K>,
	parent: Option<usize>,
	children: Vec<usize>,
	number: usize,
	level: usize,
	height: usize,
	prelim: f64,
	modifier: f64,
	change: f64,
	shift: f64,
	thread: Option<usize>,
	ancestor: usize,
	default_ancestor: Option<usize>,
	x: f64,
}

impl<K> TidyNode<K> {
	fn new(idx: usize, key: Option<K>, parent: Option<usize>, number: usize, level: usize) -> Self {
		Self {
			key,
			parent,
			children: Vec::new(),
			number,
			level,
			height: 0,
			prelim: 0.0,
			modifier: 0.0,
			change: 0.0,
			shift: 0.0,
			thread: None,
			ancestor: idx,
			default_ancestor: None,
			x: 0.0,
		}
	}
}

const VIRTUAL_ROOT: usize = 0;
const ROOT: usize = 1;

/// Lays out the tree rooted at `root`, asking `children` for each node's ordered children.
///
/// `spacing` is `(breadth, depth)`: the sibling distance and the level distance. Output is in
/// pre-order.
pub fn tidy_layout<K: Clone>(
	root: K,
	mut children: impl FnMut(&K) -> Vec<K>,
	spacing: (f64, f64),
) -> Vec<Placement<K>> {
	let mut nodes: Vec<TidyNode<K>> = vec![
		TidyNode::new(VIRTUAL_ROOT, None, None, 0, 0),
		TidyNode::new(ROOT, Some(root), Some(VIRTUAL_ROOT), 0, 0),
	];
	nodes[VIRTUAL_ROOT].children.push(ROOT);

	let mut stack = vec![ROOT];
	while let Some(v) = stack.pop() {
		let Some(key) = nodes[v].key.clone() else {
			continue;
		};
		let level = nodes[v].level + 1;
		for (number, child) in children(&key).into_iter().enumerate() {
			let idx = nodes.len();
			nodes.push(TidyNode::new(idx, Some(child), Some(v), number, level));
			nodes[v].children.push(idx);
			stack.push(idx);
		}
	}

	let pre = pre_order(&nodes);
	let mut post = pre_order_right_first(&nodes);
	post.reverse();

	let mut tree = Tidy { nodes };
	for &v in &post {
		tree.compute_height(v);
		tree.first_walk(v);
	}
	tree.nodes[VIRTUAL_ROOT].modifier = -tree.nodes[ROOT].prelim;
	for &v in &pre {
		tree.second_walk(v);
	}

	let (dx, dy) = spacing;
	let mut nodes = tree.nodes;
	pre.into_iter()
		.filter_map(|v| {
			let node = &mut nodes[v];
			node.key.take().map(|key| Placement {
				key,
				breadth: node.x * dx,
				depth: node.level as f64 * dy,
				level: node.level,
				height: node.height,
			})
		})
		.collect()
}

fn pre_order<K>(nodes: &[TidyNode<K>]) -> Vec<usize> {
	let mut out = Vec::with_capacity(nodes.len());
	let mut stack = vec![ROOT];
	while let Some(v) = stack.pop() {
		out.push(v);
		stack.extend(nodes[v].children.iter().rev());
	}
	out
}

/// Node, then children right to left; reversed this is a left-to-right post-order.
fn pre_order_right_first<K>(nodes: &[TidyNode<K>]) -> Vec<usize> {
	let mut out = Vec::with_capacity(nodes.len());
	let mut stack = vec![ROOT];
	while let Some(v) = stack.pop() {
		out.push(v);
		stack.extend(nodes[v].children.iter());
	}
	out
}

struct Tidy<K> {
	nodes: Vec<TidyNode<K>>,
}

impl<K> Tidy<K> {
	fn parent(&self, v: usize) -> usize {
		self.nodes[v].parent.unwrap_or(VIRTUAL_ROOT)
	}

	fn separation(&self, a: usize, b: usize) -> f64 {
		if self.nodes[a].parent == self.nodes[b].parent {
			1.0
		} else {
			2.0
		}
	}

	fn next_left(&self, v: usize) -> Option<usize> {
		self.nodes[v].children.first().copied().or(self.nodes[v].thread)
	}

	fn next_right(&self, v: usize) -> Option<usize> {
		self.nodes[v].children.last().copied().or(self.nodes[v].thread)
	}

	fn compute_height(&mut self, v: usize) {
		let height = self.nodes[v]
			.children
			.iter()
			.map(|&c| self.nodes[c].height + 1)
			.max()
			.unwrap_or(0);
		self.nodes[v].height = height;
	}

	fn first_walk(&mut self, v: usize) {
		let parent = self.parent(v);
		let number = self.nodes[v].number;
		let left_sibling = (number > 0).then(|| self.nodes[parent].children[number - 1]);

		let children = &self.nodes[v].children;
		if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
			self.execute_shifts(v);
			let midpoint = (self.nodes[first].prelim + self.nodes[last].prelim) / 2.0;
			if let Some(w) = left_sibling {
				self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
				self.nodes[v].modifier = self.nodes[v].prelim - midpoint;
			} else {
				self.nodes[v].prelim = midpoint;
			}
		} else if let Some(w) = left_sibling {
			self.nodes[v].prelim = self.nodes[w].prelim + self.separation(v, w);
		}

		let ancestor = self.nodes[parent]
			.default_ancestor
			.unwrap_or(self.nodes[parent].children[0]);
		let ancestor = self.apportion(v, left_sibling, ancestor);
		self.nodes[parent].default_ancestor = Some(ancestor);
	}

	fn second_walk(&mut self, v: usize) {
		let parent_mod = self.nodes[self.parent(v)].modifier;
		let node = &mut self.nodes[v];
		node.x = node.prelim + parent_mod;
		node.modifier += parent_mod;
	}

	fn execute_shifts(&mut self, v: usize) {
		let mut shift = 0.0;
		let mut change = 0.0;
		for i in (0..self.nodes[v].children.len()).rev() {
			let w = self.nodes[v].children[i];
			let node = &mut self.nodes[w];
			node.prelim += shift;
			node.modifier += shift;
			change += node.change;
			shift += node.shift + change;
		}
	}

	fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
		let change = shift / (self.nodes[wp].number as f64 - self.nodes[wm].number as f64);
		self.nodes[wp].change -= change;
		self.nodes[wp].shift += shift;
		self.nodes[wm].change += change;
		self.nodes[wp].prelim += shift;
		self.nodes[wp].modifier += shift;
	}

	fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
		let a = self.nodes[vim].ancestor;
		if self.nodes[a].parent == self.nodes[v].parent {
			a
		} else {
			ancestor
		}
	}

	fn apportion(&mut self, v: usize, left_sibling: Option<usize>, mut ancestor: usize) -> usize {
		let Some(w) = left_sibling else {
			return ancestor;
		};
		let (mut vip, mut vop, mut vim) = (v, v, w);
		let mut vom = self.nodes[self.parent(v)].children[0];
		let mut sip = self.nodes[vip].modifier;
		let mut sop = self.nodes[vop].modifier;
		let mut sim = self.nodes[vim].modifier;
		let mut som = self.nodes[vom].modifier;

		let mut next_im = self.next_right(vim);
		let mut next_ip = self.next_left(vip);
		while let (Some(im), Some(ip)) = (next_im, next_ip) {
			vim = im;
			vip = ip;
			vom = self.next_left(vom).unwrap_or(vom);
			vop = self.next_right(vop).unwrap_or(vop);
			self.nodes[vop].ancestor = v;
			let shift = self.nodes[vim].prelim + sim - self.nodes[vip].prelim - sip
				+ self.separation(vim, vip);
			if shift > 0.0 {
				let wm = self.next_ancestor(vim, v, ancestor);
				self.move_subtree(wm, v, shift);
				sip += shift;
				sop += shift;
			}
			sim += self.nodes[vim].modifier;
			sip += self.nodes[vip].modifier;
			som += self.nodes[vom].modifier;
			sop += self.nodes[vop].modifier;
			next_im = self.next_right(vim);
			next_ip = self.next_left(vip);
		}

		if let Some(im) = next_im {
			if self.next_right(vop).is_none() {
				self.nodes[vop].thread = Some(im);
				self.nodes[vop].modifier += sim - sop;
			}
		}
		if let Some(ip) = next_ip {
			if self.next_left(vom).is_none() {
				self.nodes[vom].thread = Some(ip);
				self.nodes[vom].modifier += sip - som;
				ancestor = v;
			}
		}
		ancestor
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn layout(
		edges: Vec<(&'static str, Vec<&'static str>)>,
	) -> HashMap<&'static str, Placement<&'static str>> {
		let map: HashMap<&str, Vec<&str>> = edges.into_iter().collect();
		tidy_layout("r", |k| map.get(k).cloned().unwrap_or_default(), (1.0, 10.0))
			.into_iter()
			.map(|p| (p.key, p))
			.collect()
	}

	#[test]
	fn test_single_node() {
		let out = tidy_layout(0u32, |_| Vec::new(), (5.0, 5.0));
		assert_eq!(out.len(), 1);
		assert_eq!(out[0].breadth, 0.0);
		assert_eq!(out[0].depth, 0.0);
		assert_eq!(out[0].height, 0);
	}

	#[test]
	fn test_siblings_are_centered_under_parent() {
		let p = layout(vec![("r", vec!["a", "b"])]);
		assert_eq!(p["r"].breadth, 0.0);
		assert_eq!(p["a"].breadth, -0.5);
		assert_eq!(p["b"].breadth, 0.5);
		assert_eq!(p["a"].depth, 10.0);
		assert_eq!(p["r"].height, 1);
	}

	#[test]
	fn test_cousins_get_double_separation() {
		let p = layout(vec![
			("r", vec!["a", "b"]),
			("a", vec!["a1", "a2"]),
			("b", vec!["b1", "b2"]),
		]);
		assert_eq!(p["a2"].breadth - p["a1"].breadth, 1.0);
		assert_eq!(p["b1"].breadth - p["a2"].breadth, 2.0);
		assert_eq!(p["r"].breadth, 0.0);
		assert_eq!(p["b"].breadth - p["a"].breadth, 3.0);
		assert_eq!(p["r"].height, 2);
	}

	#[test]
	fn test_output_is_pre_order() {
		let out = tidy_layout(
			"r",
			|k| match *k {
				"r" => vec!["a", "b"],
				"a" => vec!["a1"],
				_ => Vec::new(),
			},
			(1.0, 1.0),
		);
		let keys: Vec<_> = out.iter().map(|p| p.key).collect();
		assert_eq!(keys, ["r", "a", "a1", "b"]);
	}

	#[test]
	fn test_no_overlap_on_same_level() {
		let p = layout(vec![
			("r", vec!["a", "b", "c"]),
			("a", vec!["a1", "a2", "a3"]),
			("c", vec!["c1", "c2", "c3"]),
			("a3", vec!["x", "y"]),
			("c1", vec!["z"]),
		]);
		let mut by_level: HashMap<usize, Vec<f64>> = HashMap::new();
		for placement in p.values() {
			by_level.entry(placement.level).or_default().push(placement.breadth);
		}
		for breadths in by_level.values_mut() {
			breadths.sort_by(f64::total_cmp);
			for pair in breadths.windows(2) {
				assert!(pair[1] - pair[0] >= 1.0 - 1e-9, "overlap in {breadths:?}");
			}
		}
	}
}
