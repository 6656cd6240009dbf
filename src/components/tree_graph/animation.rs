//! Frame-driven property animations.
//!
//! An [`Animation`] is a set of named properties, each with a duration and an interpolator.
//! [`Animation::begin`] drives it off a [`FrameScheduler`]: every frame the caller receives the
//! interpolated values plus a [`Continuation`] and decides whether to ask for the next frame.
//! Completion, natural or by cancellation, is reported exactly once.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use log::warn;

use super::interpolate::AnimatedValue;
use super::scheduler::FrameScheduler;

/// Maps progress in `[0, 1]` to a value.
pub type Interpolator = Box<dyn Fn(f64) -> AnimatedValue>;

/// Interpolated values of one frame, keyed by property name.
pub type AnimatedValues = BTreeMap<String, AnimatedValue>;

struct PropertyConfig {
	duration_ms: f64,
	interpolator: Interpolator,
}

/// Cancels a running animation. Cancelling twice is harmless.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
	/// Takes effect at the next frame check.
	pub fn cancel(&self) {
		self.0.set(true);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.get()
	}
}

#[derive(Default)]
pub struct Animation {
	properties: BTreeMap<String, PropertyConfig>,
	cancelled: CancelHandle,
}

impl Animation {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) the property `key`.
	///
	/// Durations that are not finite and positive make the property snap to its final value.
	pub fn animate_property(
		mut self,
		key: impl Into<String>,
		duration_ms: f64,
		interpolator: impl Fn(f64) -> AnimatedValue + 'static,
	) -> Self {
		let key = key.into();
		let duration_ms = if duration_ms.is_finite() && duration_ms > 0.0 {
			duration_ms
		} else {
			if duration_ms != 0.0 {
				warn!("property {key:?} has invalid duration {duration_ms}; snapping");
			}
			0.0
		};
		self.properties.insert(
			key,
			PropertyConfig {
				duration_ms,
				interpolator: Box::new(interpolator),
			},
		);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.properties.is_empty()
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
		self.properties.keys().map(String::as_str)
	}

	/// Longest property duration; zero for an animation without properties.
	pub fn total_duration(&self) -> f64 {
		self.properties
			.values()
			.map(|p| p.duration_ms)
			.fold(0.0, f64::max)
	}

	/// Values of every property `elapsed_ms` after the start.
	pub fn sample(&self, elapsed_ms: f64) -> AnimatedValues {
		self.properties
			.iter()
			.map(|(key, p)| {
				let position = if p.duration_ms > 0.0 {
					(elapsed_ms / p.duration_ms).clamp(0.0, 1.0)
				} else {
					1.0
				};
				(key.clone(), (p.interpolator)(position))
			})
			.collect()
	}

	pub fn cancel_handle(&self) -> CancelHandle {
		self.cancelled.clone()
	}

	pub fn cancel(&self) {
		self.cancelled.cancel();
	}

	/// Starts the animation; the first frame is requested immediately.
	///
	/// `on_frame` must call [`Continuation::resume`] to receive further frames. `on_complete`
	/// runs once, on the first frame at or after the total duration, or on the first frame
	/// after [`CancelHandle::cancel`]. An animation without properties completes on its first
	/// frame without calling `on_frame`.
	pub fn begin(
		self,
		scheduler: Rc<dyn FrameScheduler>,
		on_frame: impl FnMut(AnimatedValues, Continuation) + 'static,
		on_complete: impl FnOnce() + 'static,
	) -> CancelHandle {
		let handle = self.cancel_handle();
		let run = Rc::new(Run {
			start: scheduler.now(),
			total: self.total_duration(),
			animation: self,
			scheduler,
			on_frame: RefCell::new(Box::new(on_frame)),
			on_complete: Cell::new(Some(Box::new(on_complete))),
		});
		run.schedule();
		handle
	}
}

struct Run {
	animation: Animation,
	start: f64,
	total: f64,
	scheduler: Rc<dyn FrameScheduler>,
	on_frame: RefCell<Box<dyn FnMut(AnimatedValues, Continuation)>>,
	on_complete: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Run {
	fn schedule(self: &Rc<Self>) {
		let run = Rc::clone(self);
		self.scheduler
			.request_frame(Box::new(move |time| run.frame(time)));
	}

	fn frame(self: Rc<Self>, time: f64) {
		let elapsed = time - self.start;
		if self.animation.cancelled.is_cancelled() || elapsed >= self.total {
			self.complete();
			return;
		}
		let values = self.animation.sample(elapsed);
		let continuation = Continuation {
			run: Rc::clone(&self),
		};
		match self.on_frame.try_borrow_mut() {
			Ok(mut on_frame) => on_frame(values, continuation),
			Err(_) => {
				warn!("frame callback re-entered; finishing animation early");
				self.complete();
			}
		}
	}

	fn complete(&self) {
		if let Some(on_complete) = self.on_complete.take() {
			on_complete();
		}
	}
}

/// Permission to receive the next frame of a running animation.
pub struct Continuation {
	run: Rc<Run>,
}

impl Continuation {
	pub fn resume(self) {
		self.run.schedule();
	}
}
