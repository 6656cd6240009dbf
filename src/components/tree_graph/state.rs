use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, warn};

use super::config::TreeGraphConfig;
use super::elements::{
	LinkProps, NodeProps, link_props_equal, link_selector, node_props_equal, node_selector,
};
use super::error::Result;
use super::layout::recompute_layout;
use super::model::{ConfigNode, TreeStructure};
use super::scheduler::FrameScheduler;
use super::transition::{Animatable, Phase, PropsEqual, SelectAnimation, Transition};
use super::types::{NodeId, Point, Size};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Screen pixels of the content box that always stay inside the viewer.
const PAN_KEEP_VISIBLE: f64 = 20.0;

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LayerKind {
	Nodes,
	Links,
}

struct FinishedExit {
	layer: LayerKind,
	id: NodeId,
	token: u64,
}

type FinishedExits = Rc<RefCell<Vec<FinishedExit>>>;

struct Element<P> {
	transition: Transition<P>,
	/// Set while the element plays its exit animation.
	exit_token: Option<u64>,
}

/// Keyed set of animated elements, kept until their exit animation finishes.
struct ElementLayer<P> {
	kind: LayerKind,
	elements: BTreeMap<NodeId, Element<P>>,
	select: SelectAnimation<P>,
	props_equal: PropsEqual<P>,
}

impl<P: Animatable + 'static> ElementLayer<P> {
	fn new(kind: LayerKind, select: SelectAnimation<P>, props_equal: PropsEqual<P>) -> Self {
		Self {
			kind,
			elements: BTreeMap::new(),
			select,
			props_equal,
		}
	}

	fn show(&mut self, id: &NodeId, props: P, scheduler: &Rc<dyn FrameScheduler>) {
		match self.elements.get_mut(id) {
			Some(element) if element.exit_token.is_some() => {
				// Back before the exit finished: restart as an enter.
				element.exit_token = None;
				element.transition.update(props);
				element.transition.enter(|| {});
			}
			Some(element) => element.transition.update(props),
			None => {
				let transition = Transition::new(
					props,
					Rc::clone(&self.select),
					Rc::clone(&self.props_equal),
					Rc::clone(scheduler),
				);
				transition.mount();
				transition.enter(|| {});
				self.elements.insert(
					id.clone(),
					Element {
						transition,
						exit_token: None,
					},
				);
			}
		}
	}

	fn hide_missing(
		&mut self,
		live: &HashSet<NodeId>,
		props_for: impl Fn(&NodeId, P) -> P,
		finished: &FinishedExits,
		next_token: &mut u64,
	) {
		let kind = self.kind;
		for (id, element) in self.elements.iter_mut() {
			if live.contains(id) || element.exit_token.is_some() {
				continue;
			}
			let drawn = element.transition.effective_props();
			element.transition.update(props_for(id, drawn));
			*next_token += 1;
			let token = *next_token;
			element.exit_token = Some(token);
			let (finished, id) = (Rc::clone(finished), id.clone());
			element.transition.exit(move || {
				finished.borrow_mut().push(FinishedExit {
					layer: kind,
					id,
					token,
				});
			});
		}
	}

	fn remove_finished(&mut self, id: &NodeId, token: u64) {
		let done = self
			.elements
			.get(id)
			.is_some_and(|e| e.exit_token == Some(token));
		if let Some(element) = done.then(|| self.elements.remove(id)).flatten() {
			element.transition.unmount();
		}
	}

	fn is_animating(&self) -> bool {
		self.elements
			.values()
			.any(|e| e.transition.phase() == Phase::Animating)
	}

	fn clear(&mut self) {
		for element in self.elements.values() {
			element.transition.unmount();
		}
		self.elements.clear();
	}
}

/// Everything the canvas needs: the tree model, its animated elements, and the view transform.
pub struct TreeGraphState {
	pub config: TreeGraphConfig,
	pub transform: ViewTransform,
	pub pan: PanState,
	data: Arc<ConfigNode>,
	structure: TreeStructure,
	size: Size,
	nodes: ElementLayer<NodeProps>,
	links: ElementLayer<LinkProps>,
	finished_exits: FinishedExits,
	next_exit_token: u64,
	scheduler: Rc<dyn FrameScheduler>,
}

impl TreeGraphState {
	pub fn new(
		data: Arc<ConfigNode>,
		config: TreeGraphConfig,
		scheduler: Rc<dyn FrameScheduler>,
	) -> Result<Self> {
		config.validate()?;
		let (structure, size) = recompute_layout(
			&TreeStructure::build(&data),
			config.node_size,
			config.orientation,
		)?;
		let mut state = Self {
			nodes: ElementLayer::new(
				LayerKind::Nodes,
				node_selector(config.transition_ms, config.easing),
				node_props_equal(),
			),
			links: ElementLayer::new(
				LayerKind::Links,
				link_selector(config.transition_ms, config.easing),
				link_props_equal(),
			),
			config,
			transform: ViewTransform::default(),
			pan: PanState::default(),
			data,
			structure,
			size,
			finished_exits: Rc::new(RefCell::new(Vec::new())),
			next_exit_token: 0,
			scheduler,
		};
		state.sync();
		Ok(state)
	}

	pub fn structure(&self) -> &TreeStructure {
		&self.structure
	}

	/// Bounding size of the visible nodes, padding included.
	pub fn size(&self) -> Size {
		self.size
	}

	/// Content box: bounding size plus margins.
	pub fn content_size(&self) -> Size {
		Size::new(
			self.size.width + self.config.margin.horizontal(),
			self.size.height + self.config.margin.vertical(),
		)
	}

	pub fn viewer_size(&self) -> Size {
		self.config.viewer_size()
	}

	/// Flips `id` between expanded and collapsed and starts the resulting transitions.
	pub fn toggle(&mut self, id: &NodeId) -> Result<()> {
		let toggled = self.structure.toggle(id)?;
		let (structure, size) =
			recompute_layout(&toggled, self.config.node_size, self.config.orientation)?;
		debug!("toggled {}; {} nodes visible", id, structure.visible().count());
		self.structure = structure;
		self.size = size;
		self.sync();
		Ok(())
	}

	/// Swaps in a new configuration tree; a no-op when `data` is the current tree.
	pub fn replace_data(&mut self, data: Arc<ConfigNode>) -> Result<()> {
		if Arc::ptr_eq(&self.data, &data) {
			return Ok(());
		}
		let (structure, size) = recompute_layout(
			&TreeStructure::build(&data),
			self.config.node_size,
			self.config.orientation,
		)?;
		debug!("rebuilt tree structure with {} nodes", structure.len());
		self.data = data;
		self.structure = structure;
		self.size = size;
		self.sync();
		Ok(())
	}

	/// Reconciles the element layers with the visible subtree.
	fn sync(&mut self) {
		let mut live = HashSet::new();
		for node in self.structure.visible() {
			live.insert(node.id.clone());
			self.nodes
				.show(&node.id, NodeProps::from_node(node), &self.scheduler);
			if let Some(link) = LinkProps::for_node(&self.structure, node) {
				self.links.show(&node.id, link, &self.scheduler);
			}
		}
		// Elements gone from the structure (after a rebuild) leave from where they are drawn.
		let structure = &self.structure;
		self.nodes.hide_missing(
			&live,
			|id, drawn| match structure.get(id) {
				Some(node) => NodeProps::from_node(node),
				None => NodeProps {
					initial: drawn.position,
					scale: 1.0,
					..drawn
				},
			},
			&self.finished_exits,
			&mut self.next_exit_token,
		);
		self.links.hide_missing(
			&live,
			|id, drawn| {
				structure
					.get(id)
					.and_then(|node| LinkProps::for_node(structure, node))
					.unwrap_or(LinkProps {
						source_initial: drawn.source,
						target_initial: drawn.target,
						..drawn
					})
			},
			&self.finished_exits,
			&mut self.next_exit_token,
		);
	}

	/// Drops elements whose exit animation has finished. Call once per frame.
	pub fn tick(&mut self) {
		let finished = self.finished_exits.take();
		for exit in finished {
			match exit.layer {
				LayerKind::Nodes => self.nodes.remove_finished(&exit.id, exit.token),
				LayerKind::Links => self.links.remove_finished(&exit.id, exit.token),
			}
		}
	}

	pub fn is_animating(&self) -> bool {
		self.nodes.is_animating() || self.links.is_animating()
	}

	/// Node props as currently drawn, exiting nodes included.
	pub fn node_frames(&self) -> Vec<NodeProps> {
		self.nodes
			.elements
			.values()
			.map(|e| e.transition.effective_props())
			.collect()
	}

	pub fn link_frames(&self) -> Vec<LinkProps> {
		self.links
			.elements
			.values()
			.map(|e| e.transition.effective_props())
			.collect()
	}

	/// Whether `id` is on screen and not on its way out.
	pub fn is_live(&self, id: &NodeId) -> bool {
		self.nodes
			.elements
			.get(id)
			.is_some_and(|e| e.exit_token.is_none())
	}

	/// Screen coordinates to tree coordinates (margins removed).
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k - self.config.margin.left,
			(sy - self.transform.y) / self.transform.k - self.config.margin.top,
		)
	}

	/// Topmost live node within `radius` of the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64, radius: f64) -> Option<NodeId> {
		let p = self.screen_to_graph(sx, sy);
		let mut found = None;
		for (id, element) in &self.nodes.elements {
			if element.exit_token.is_some() {
				continue;
			}
			let props = element.transition.effective_props();
			let r = radius * props.scale;
			let (dx, dy) = (props.position.x - p.x, props.position.y - p.y);
			if (dx * dx + dy * dy).sqrt() < r {
				found = Some(id.clone());
			}
		}
		found
	}

	pub fn start_pan(&mut self, x: f64, y: f64) {
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn pan_to(&mut self, x: f64, y: f64) {
		if !self.pan.active {
			return;
		}
		self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		self.clamp_pan();
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Scales by `factor` around the screen point `(x, y)`.
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		if !factor.is_finite() || factor <= 0.0 {
			warn!("ignoring zoom factor {factor}");
			return;
		}
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
		self.clamp_pan();
	}

	/// Keeps part of the content box inside the viewer.
	fn clamp_pan(&mut self) {
		let content = self.content_size();
		let viewer = self.viewer_size();
		let k = self.transform.k;
		self.transform.x = clamp_axis(self.transform.x, content.width * k, viewer.width);
		self.transform.y = clamp_axis(self.transform.y, content.height * k, viewer.height);
	}
}

impl Drop for TreeGraphState {
	fn drop(&mut self) {
		self.nodes.clear();
		self.links.clear();
	}
}

fn clamp_axis(offset: f64, content: f64, viewer: f64) -> f64 {
	let keep = PAN_KEEP_VISIBLE.min(content).min(viewer);
	let (lo, hi) = (keep - content, viewer - keep);
	if lo > hi { offset } else { offset.clamp(lo, hi) }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::tree_graph::easing::EasingFunction;
	use crate::components::tree_graph::model::tests::sample_config;
	use crate::components::tree_graph::scheduler::ManualScheduler;
	use crate::components::tree_graph::types::Margin;

	const FRAME: f64 = 16.0;

	fn config() -> TreeGraphConfig {
		TreeGraphConfig {
			margin: Margin::uniform(40.0),
			transition_ms: 100.0,
			easing: EasingFunction::Linear,
			..TreeGraphConfig::default()
		}
	}

	fn state(scheduler: &ManualScheduler) -> TreeGraphState {
		TreeGraphState::new(
			Arc::new(sample_config()),
			config(),
			Rc::new(scheduler.clone()),
		)
		.unwrap()
	}

	fn settle(scheduler: &ManualScheduler, state: &mut TreeGraphState) {
		for _ in 0..20 {
			scheduler.advance(FRAME);
			state.tick();
		}
		assert!(!state.is_animating());
	}

	fn drawn_ids(state: &TreeGraphState) -> Vec<String> {
		state
			.node_frames()
			.into_iter()
			.map(|n| n.id.to_string())
			.collect()
	}

	fn frame_of(state: &TreeGraphState, id: &str) -> NodeProps {
		state
			.node_frames()
			.into_iter()
			.find(|n| n.id.as_str() == id)
			.unwrap()
	}

	#[test]
	fn test_initial_nodes_appear() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		assert_eq!(drawn_ids(&state), ["root", "root.0", "root.1"]);
		assert_eq!(state.link_frames().len(), 2);
		assert!(state.is_animating());

		scheduler.advance(50.0);
		assert_eq!(frame_of(&state, "root").scale, 0.5);

		settle(&scheduler, &mut state);
		let c1 = frame_of(&state, "root.0");
		assert_eq!(c1.position, Point::new(150.0, 30.0));
		assert_eq!(c1.scale, 1.0);
		assert_eq!(state.content_size(), Size::new(380.0, 200.0));
	}

	#[test]
	fn test_expand_enters_from_parent_and_collapse_exits_into_it() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		settle(&scheduler, &mut state);

		state.toggle(&"root.0".into()).unwrap();
		assert_eq!(
			drawn_ids(&state),
			["root", "root.0", "root.0.0", "root.0.1", "root.1"]
		);
		scheduler.advance(FRAME);
		let gc1 = frame_of(&state, "root.0.0");
		assert!(gc1.position.x > 150.0 && gc1.position.x < 300.0);
		assert!(gc1.scale > 0.0 && gc1.scale < 1.0);
		let c2 = frame_of(&state, "root.1");
		assert!(c2.position.y > 90.0 && c2.position.y < 120.0);

		settle(&scheduler, &mut state);
		assert_eq!(frame_of(&state, "root.0.0").position, Point::new(300.0, 30.0));
		assert_eq!(state.link_frames().len(), 4);

		state.toggle(&"root.0".into()).unwrap();
		assert!(!state.is_live(&"root.0.0".into()));
		scheduler.advance(50.0);
		state.tick();
		let leaving = frame_of(&state, "root.0.0");
		assert!(leaving.scale < 1.0);
		assert!(leaving.position.x < 300.0);

		settle(&scheduler, &mut state);
		assert_eq!(drawn_ids(&state), ["root", "root.0", "root.1"]);
		assert_eq!(state.link_frames().len(), 2);
	}

	#[test]
	fn test_reexpand_during_exit_revives_node() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		settle(&scheduler, &mut state);
		let c1: NodeId = "root.0".into();

		state.toggle(&c1).unwrap();
		settle(&scheduler, &mut state);
		state.toggle(&c1).unwrap();
		scheduler.advance(FRAME);
		state.toggle(&c1).unwrap();
		assert!(state.is_live(&"root.0.0".into()));

		settle(&scheduler, &mut state);
		assert_eq!(
			drawn_ids(&state),
			["root", "root.0", "root.0.0", "root.0.1", "root.1"]
		);
		assert_eq!(frame_of(&state, "root.0.0").scale, 1.0);
	}

	#[test]
	fn test_unknown_toggle_leaves_state_untouched() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		settle(&scheduler, &mut state);
		assert!(state.toggle(&"root.9".into()).is_err());
		assert_eq!(drawn_ids(&state), ["root", "root.0", "root.1"]);
		assert!(!state.is_animating());
	}

	#[test]
	fn test_replace_data_is_noop_for_same_tree() {
		let scheduler = ManualScheduler::new();
		let data = Arc::new(sample_config());
		let mut state =
			TreeGraphState::new(Arc::clone(&data), config(), Rc::new(scheduler.clone())).unwrap();
		settle(&scheduler, &mut state);
		state.replace_data(Arc::clone(&data)).unwrap();
		assert!(!state.is_animating());

		let mut smaller = sample_config();
		smaller.children.truncate(1);
		state.replace_data(Arc::new(smaller)).unwrap();
		settle(&scheduler, &mut state);
		assert_eq!(drawn_ids(&state), ["root", "root.0"]);
	}

	#[test]
	fn test_removed_nodes_exit_from_where_they_are_drawn() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		settle(&scheduler, &mut state);
		state.toggle(&"root.0".into()).unwrap();
		settle(&scheduler, &mut state);
		let c2 = frame_of(&state, "root.1");
		assert_eq!(c2.position, Point::new(150.0, 120.0));
		let c2_link = state
			.link_frames()
			.into_iter()
			.find(|l| l.id.as_str() == "root.1")
			.unwrap();

		let mut smaller = sample_config();
		smaller.children.truncate(1);
		state.replace_data(Arc::new(smaller)).unwrap();
		scheduler.advance(1.0);

		let leaving = frame_of(&state, "root.1");
		assert_eq!(leaving.position, c2.position);
		assert!(leaving.scale < 1.0);
		let link = state
			.link_frames()
			.into_iter()
			.find(|l| l.id.as_str() == "root.1")
			.unwrap();
		assert_eq!(link.source, c2_link.source);
		assert_eq!(link.target, c2_link.target);
	}

	#[test]
	fn test_content_box_follows_layout() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		assert_eq!(state.content_size(), Size::new(380.0, 200.0));
		state.toggle(&"root.0".into()).unwrap();
		assert_eq!(state.content_size(), Size::new(530.0, 230.0));
		state.toggle(&"root.0".into()).unwrap();
		assert_eq!(state.content_size(), Size::new(380.0, 200.0));
	}

	#[test]
	fn test_hit_testing_uses_margins_and_transform() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		settle(&scheduler, &mut state);
		// root sits at (0, 60) inside a 40px margin.
		assert_eq!(state.node_at_position(41.0, 101.0, 10.0), Some(NodeId::root()));
		assert_eq!(state.node_at_position(100.0, 100.0, 10.0), None);

		state.transform = ViewTransform {
			x: 10.0,
			y: 0.0,
			k: 2.0,
		};
		assert_eq!(state.node_at_position(90.0, 200.0, 10.0), Some(NodeId::root()));
	}

	#[test]
	fn test_zoom_is_clamped() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		for _ in 0..100 {
			state.zoom_at(10.0, 10.0, 1.1);
		}
		assert_eq!(state.transform.k, MAX_ZOOM);
		for _ in 0..200 {
			state.zoom_at(10.0, 10.0, 0.9);
		}
		assert_eq!(state.transform.k, MIN_ZOOM);
	}

	#[test]
	fn test_pan_cannot_leave_viewer() {
		let scheduler = ManualScheduler::new();
		let mut state = state(&scheduler);
		state.start_pan(0.0, 0.0);
		state.pan_to(-10_000.0, 10_000.0);
		let content = state.content_size();
		let viewer = state.viewer_size();
		assert_eq!(state.transform.x, PAN_KEEP_VISIBLE - content.width);
		assert_eq!(state.transform.y, viewer.height - PAN_KEEP_VISIBLE);
		state.end_pan();
		state.pan_to(0.0, 0.0);
		assert_eq!(state.transform.y, viewer.height - PAN_KEEP_VISIBLE);
	}

	#[test]
	fn test_invalid_config_is_rejected() {
		let scheduler = ManualScheduler::new();
		let bad = TreeGraphConfig {
			width: -1.0,
			..config()
		};
		assert!(
			TreeGraphState::new(Arc::new(sample_config()), bad, Rc::new(scheduler.clone()))
				.is_err()
		);
	}
}
