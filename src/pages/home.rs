use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use serde_json::json;
use web_sys::CanvasRenderingContext2d;

use crate::components::tree_graph::{
	ConfigNode, Margin, NodePainter, NodeView, Size, TreeGraphCanvas, TreeGraphConfig, draw_dot,
};

/// Label above the dot, the node's `type` below it.
struct TypedNodePainter;

impl NodePainter for TypedNodePainter {
	fn paint(&self, ctx: &CanvasRenderingContext2d, node: &NodeView<'_>) {
		draw_dot(ctx);
		ctx.set_fill_style_str("#000");
		ctx.set_font("12px sans-serif");
		let _ = ctx.fill_text(node.label, 10.0, -10.0);
		if let Some(kind) = node.data.get("type").and_then(|t| t.as_str()) {
			let _ = ctx.fill_text(kind, 10.0, 10.0);
		}
	}
}

fn typed_painter() -> Rc<dyn NodePainter> {
	Rc::new(TypedNodePainter)
}

fn sample_tree() -> ConfigNode {
	let leaf = |label: &str| ConfigNode::new(label).with_data(json!({ "type": "GC" }));
	let child = |label: &str, leaves: [&str; 2]| {
		ConfigNode::new(label)
			.with_data(json!({ "type": "C" }))
			.with_children(leaves.map(leaf).to_vec())
	};
	ConfigNode::new("root")
		.expanded(true)
		.with_data(json!({ "type": "R" }))
		.with_children(vec![
			child("c1", ["gc1", "gc2"]),
			child("c2", ["gc3", "gc4"]),
		])
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let tree = Signal::stored(Arc::new(sample_tree()));
	let config = TreeGraphConfig {
		width: 200.0,
		height: 200.0,
		margin: Margin::uniform(40.0),
		node_size: Size::new(150.0, 60.0),
		..TreeGraphConfig::default()
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="tree-graph-demo">
				<h1>"Tree Graph"</h1>
				<p class="subtitle">"Click a node to expand or collapse it. Drag to pan, scroll to zoom."</p>
				<TreeGraphCanvas data=tree config=config node_painter=typed_painter() />
			</div>
		</ErrorBoundary>
	}
}
