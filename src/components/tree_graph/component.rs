use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::{debug, error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::config::TreeGraphConfig;
use super::model::ConfigNode;
use super::render::{self, DefaultNodePainter, ElbowLinkPainter, LinkPainter, NodePainter};
use super::scheduler::RafScheduler;
use super::state::TreeGraphState;

/// Collapsible tree drawn on a canvas. Clicking a node toggles it; dragging the background pans
/// and the wheel zooms.
#[component]
pub fn TreeGraphCanvas(
	#[prop(into)] data: Signal<Arc<ConfigNode>>,
	#[prop(optional)] config: TreeGraphConfig,
	#[prop(optional)] node_painter: Option<Rc<dyn NodePainter>>,
	#[prop(optional)] link_painter: Option<Rc<dyn LinkPainter>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<Canvas>::new();
	let state: Rc<RefCell<Option<TreeGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let node_painter = node_painter.unwrap_or_else(|| Rc::new(DefaultNodePainter));
	let link_painter =
		link_painter.unwrap_or_else(|| Rc::new(ElbowLinkPainter::new(config.orientation)));
	let hit_radius = node_painter.hit_radius();
	let viewer = config.viewer_size();
	let (state_init, animate_init) = (state.clone(), animate.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(viewer.width as u32);
		canvas.set_height(viewer.height as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			error!("canvas has no 2d context");
			return;
		};
		match TreeGraphState::new(data.get_untracked(), config.clone(), Rc::new(RafScheduler)) {
			Ok(s) => *state_init.borrow_mut() = Some(s),
			Err(err) => {
				error!("failed to build tree graph: {err}");
				return;
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		let (node_painter, link_painter) = (node_painter.clone(), link_painter.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !canvas.is_connected() {
				debug!("tree graph canvas detached; stopping render loop");
				state_anim.borrow_mut().take();
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
				render::render(s, &ctx, node_painter.as_ref(), link_painter.as_ref());
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), animate_init.borrow().as_ref()) {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_data = state.clone();
	Effect::new(move |prev: Option<()>| {
		let next = data.get();
		// The first run happens alongside initialization, which already read `data`.
		if prev.is_none() {
			return;
		}
		if let Some(ref mut s) = *state_data.borrow_mut() {
			if let Err(err) = s.replace_data(next) {
				error!("failed to rebuild tree graph: {err}");
			}
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at_position(x, y, hit_radius) {
				Some(id) => {
					if let Err(err) = s.toggle(&id) {
						warn!("toggle of {id} failed: {err}");
					}
				}
				None => s.start_pan(x, y),
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pan_to(x, y);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.end_pan();
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.end_pan();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="tree-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

/// Event position relative to the canvas.
fn local_point(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}
