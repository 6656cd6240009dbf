use std::f64::consts::PI;

use serde_json::Value;
use web_sys::CanvasRenderingContext2d;

use super::elements::NodeProps;
use super::state::TreeGraphState;
use super::types::{NodeId, Orientation, Point};

/// What a node painter gets to draw. The context is already translated to the node's position
/// and scaled by its animated scale.
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
	pub id: &'a NodeId,
	pub position: Point,
	pub scale: f64,
	pub label: &'a str,
	pub data: &'a Value,
	pub has_children: bool,
	pub expanded: bool,
}

impl<'a> From<&'a NodeProps> for NodeView<'a> {
	fn from(props: &'a NodeProps) -> Self {
		Self {
			id: &props.id,
			position: props.position,
			scale: props.scale,
			label: &props.label,
			data: &props.data,
			has_children: props.has_children,
			expanded: props.expanded,
		}
	}
}

pub trait NodePainter {
	fn paint(&self, ctx: &CanvasRenderingContext2d, node: &NodeView<'_>);

	/// Clickable radius around the node origin, before zoom.
	fn hit_radius(&self) -> f64 {
		DEFAULT_NODE_RADIUS
	}
}

/// Draws the connector from a child (`source`) to its parent (`target`).
pub trait LinkPainter {
	fn paint(&self, ctx: &CanvasRenderingContext2d, source: Point, target: Point);
}

pub const DEFAULT_NODE_RADIUS: f64 = 10.0;

/// Light steel blue dot with the label above and to the right.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNodePainter;

impl NodePainter for DefaultNodePainter {
	fn paint(&self, ctx: &CanvasRenderingContext2d, node: &NodeView<'_>) {
		draw_dot(ctx);
		ctx.set_fill_style_str("#000");
		ctx.set_font("12px sans-serif");
		let _ = ctx.fill_text(node.label, 10.0, -10.0);
	}
}

pub fn draw_dot(ctx: &CanvasRenderingContext2d) {
	ctx.begin_path();
	let _ = ctx.arc(0.0, 0.0, DEFAULT_NODE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("lightsteelblue");
	ctx.fill();
}

/// Right-angled connector leaving the parent along the depth axis.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElbowLinkPainter {
	pub orientation: Orientation,
}

impl ElbowLinkPainter {
	pub fn new(orientation: Orientation) -> Self {
		Self { orientation }
	}
}

impl LinkPainter for ElbowLinkPainter {
	fn paint(&self, ctx: &CanvasRenderingContext2d, source: Point, target: Point) {
		let [start, rest @ ..] = elbow_points(source, target, self.orientation);
		ctx.begin_path();
		ctx.move_to(start.x, start.y);
		for p in rest {
			ctx.line_to(p.x, p.y);
		}
		ctx.set_stroke_style_str("#ccc");
		ctx.set_line_width(2.0);
		ctx.stroke();
	}
}

/// Corner points of the connector, starting next to the parent.
pub fn elbow_points(source: Point, target: Point, orientation: Orientation) -> [Point; 4] {
	// Work in (depth, breadth) and map back at the end.
	let (s, d) = match orientation {
		Orientation::LeftToRight => (source, target),
		Orientation::TopToBottom => (flip(source), flip(target)),
	};
	let inflect = (s.x - 30.0).max(d.x + 10.0);
	let points = [
		Point::new(d.x + 10.0, d.y),
		Point::new(inflect, d.y),
		Point::new(inflect, s.y),
		Point::new(s.x - 10.0, s.y),
	];
	match orientation {
		Orientation::LeftToRight => points,
		Orientation::TopToBottom => points.map(flip),
	}
}

fn flip(p: Point) -> Point {
	Point::new(p.y, p.x)
}

pub fn render(
	state: &TreeGraphState,
	ctx: &CanvasRenderingContext2d,
	node_painter: &dyn NodePainter,
	link_painter: &dyn LinkPainter,
) {
	let viewer = state.viewer_size();
	ctx.set_fill_style_str("white");
	ctx.fill_rect(0.0, 0.0, viewer.width, viewer.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	// Content box: the laid-out tree plus its margins, moving with pan and zoom.
	let content = state.content_size();
	ctx.set_fill_style_str("#fafafa");
	ctx.fill_rect(0.0, 0.0, content.width, content.height);
	ctx.set_stroke_style_str("#eee");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(0.0, 0.0, content.width, content.height);
	let margin = state.config.margin;
	let _ = ctx.translate(margin.left, margin.top);

	for link in state.link_frames() {
		link_painter.paint(ctx, link.source, link.target);
	}
	for node in state.node_frames() {
		if node.scale <= 0.0 {
			continue;
		}
		ctx.save();
		let _ = ctx.translate(node.position.x, node.position.y);
		let _ = ctx.scale(node.scale, node.scale);
		node_painter.paint(ctx, &NodeView::from(&node));
		ctx.restore();
	}
	ctx.restore();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_elbow_left_to_right() {
		let points = elbow_points(
			Point::new(300.0, 90.0),
			Point::new(150.0, 60.0),
			Orientation::LeftToRight,
		);
		assert_eq!(
			points,
			[
				Point::new(160.0, 60.0),
				Point::new(270.0, 60.0),
				Point::new(270.0, 90.0),
				Point::new(290.0, 90.0),
			]
		);
	}

	#[test]
	fn test_elbow_never_bends_behind_parent() {
		// Mid-animation the child can sit right on top of its parent.
		let points = elbow_points(
			Point::new(150.0, 90.0),
			Point::new(150.0, 60.0),
			Orientation::LeftToRight,
		);
		assert_eq!(points[1].x, 160.0);
	}

	#[test]
	fn test_elbow_top_to_bottom() {
		let points = elbow_points(
			Point::new(75.0, 60.0),
			Point::new(150.0, 0.0),
			Orientation::TopToBottom,
		);
		assert_eq!(points[0], Point::new(150.0, 10.0));
		assert_eq!(points[1], Point::new(150.0, 30.0));
		assert_eq!(points[2], Point::new(75.0, 30.0));
		assert_eq!(points[3], Point::new(75.0, 50.0));
	}
}
