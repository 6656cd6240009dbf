//! Host frame clocks.
//!
//! The animation driver only ever asks for "the next frame". In the browser that is
//! `requestAnimationFrame`; headless hosts and tests step a [`ManualScheduler`] by hand.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;

/// Callback run on a frame tick with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Source of frame ticks.
///
/// `request_frame` must not run the callback synchronously.
pub trait FrameScheduler {
	/// Current time in milliseconds, on the same clock as frame timestamps.
	fn now(&self) -> f64;

	fn request_frame(&self, callback: FrameCallback) -> FrameHandle;
}

/// `requestAnimationFrame` on the browser window.
#[derive(Clone, Copy, Debug, Default)]
pub struct RafScheduler;

impl FrameScheduler for RafScheduler {
	fn now(&self) -> f64 {
		web_sys::window()
			.and_then(|w| w.performance())
			.map(|p| p.now())
			.unwrap_or(0.0)
	}

	fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
		let Some(window) = web_sys::window() else {
			warn!("no window; dropping animation frame request");
			return FrameHandle(0);
		};
		let function: js_sys::Function =
			Closure::once_into_js(move |time: f64| callback(time)).unchecked_into();
		match window.request_animation_frame(&function) {
			Ok(id) => FrameHandle(id.unsigned_abs()),
			Err(err) => {
				warn!("requestAnimationFrame failed: {:?}", err);
				FrameHandle(0)
			}
		}
	}
}

#[derive(Default)]
struct ManualClock {
	now: Cell<f64>,
	next_handle: Cell<u32>,
	queue: RefCell<Vec<FrameCallback>>,
}

/// Deterministic clock advanced explicitly with [`ManualScheduler::advance`].
///
/// Clones share the same clock and queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	clock: Rc<ManualClock>,
}

impl ManualScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Moves time forward by `delta_ms` and runs every callback queued before the call.
	///
	/// Returns how many callbacks ran.
	pub fn advance(&self, delta_ms: f64) -> usize {
		let now = self.clock.now.get() + delta_ms;
		self.clock.now.set(now);
		let due = self.clock.queue.take();
		let count = due.len();
		for callback in due {
			callback(now);
		}
		count
	}

	pub fn pending(&self) -> usize {
		self.clock.queue.borrow().len()
	}
}

impl FrameScheduler for ManualScheduler {
	fn now(&self) -> f64 {
		self.clock.now.get()
	}

	fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
		let id = self.clock.next_handle.get() + 1;
		self.clock.next_handle.set(id);
		self.clock.queue.borrow_mut().push(callback);
		FrameHandle(id)
	}
}
