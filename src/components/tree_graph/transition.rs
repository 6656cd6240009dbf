//! Per-element transition coordinator.
//!
//! A [`Transition`] sits between an element's declared props and what actually gets drawn.
//! Lifecycle signals (`mount`, `update`, `enter`, `exit`, `unmount`) arrive as method calls;
//! while an animation runs, its interpolated values are overlaid on the latest declared props.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::trace;

use super::animation::{AnimatedValues, Animation, CancelHandle};
use super::interpolate::AnimatedValue;
use super::scheduler::FrameScheduler;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
	Change,
	Enter,
	Exit,
}

/// Props whose fields can be overridden by named animated values.
pub trait Animatable: Clone {
	/// Writes `value` into the field called `key`. Unknown keys are ignored.
	fn apply(&mut self, key: &str, value: &AnimatedValue);
}

pub type SelectAnimation<P> = Rc<dyn Fn(&P, TransitionKind) -> Option<Animation>>;
pub type PropsEqual<P> = Rc<dyn Fn(&P, &P) -> bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Animating,
}

struct Running {
	generation: u64,
	kind: TransitionKind,
	cancel: CancelHandle,
}

struct Inner<P> {
	props: P,
	overlay: AnimatedValues,
	running: Option<Running>,
	generation: u64,
	mounted: bool,
	destroyed: bool,
}

pub struct Transition<P> {
	inner: Rc<RefCell<Inner<P>>>,
	select: SelectAnimation<P>,
	props_equal: PropsEqual<P>,
	scheduler: Rc<dyn FrameScheduler>,
}

impl<P: fmt::Debug> fmt::Debug for Transition<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("Transition")
			.field("props", &inner.props)
			.field("overlay", &inner.overlay)
			.field("animating", &inner.running.is_some())
			.finish()
	}
}

impl<P: Animatable + 'static> Transition<P> {
	pub fn new(
		props: P,
		select: SelectAnimation<P>,
		props_equal: PropsEqual<P>,
		scheduler: Rc<dyn FrameScheduler>,
	) -> Self {
		Self {
			inner: Rc::new(RefCell::new(Inner {
				props,
				overlay: AnimatedValues::new(),
				running: None,
				generation: 0,
				mounted: false,
				destroyed: false,
			})),
			select,
			props_equal,
			scheduler,
		}
	}

	pub fn mount(&self) {
		self.inner.borrow_mut().mounted = true;
	}

	/// Replaces the declared props, starting a change animation if they differ.
	pub fn update(&self, next: P) {
		let changed = {
			let mut inner = self.inner.borrow_mut();
			let changed = inner.mounted && !(self.props_equal)(&inner.props, &next);
			inner.props = next;
			changed
		};
		if changed {
			self.run(TransitionKind::Change, None::<fn()>);
		}
	}

	/// Appear/enter; `on_done` runs when the enter animation completes.
	pub fn enter(&self, on_done: impl FnOnce() + 'static) {
		self.run(TransitionKind::Enter, Some(on_done));
	}

	/// Leave; `on_done` runs when the exit animation completes.
	pub fn exit(&self, on_done: impl FnOnce() + 'static) {
		self.run(TransitionKind::Exit, Some(on_done));
	}

	/// Cancels any running animation. No completion callback runs afterwards.
	pub fn unmount(&self) {
		let mut inner = self.inner.borrow_mut();
		if let Some(running) = inner.running.take() {
			running.cancel.cancel();
		}
		inner.overlay.clear();
		inner.mounted = false;
		inner.destroyed = true;
	}

	pub fn phase(&self) -> Phase {
		if self.inner.borrow().running.is_some() {
			Phase::Animating
		} else {
			Phase::Idle
		}
	}

	/// Kind of the animation in flight, if any.
	pub fn running_kind(&self) -> Option<TransitionKind> {
		self.inner.borrow().running.as_ref().map(|r| r.kind)
	}

	/// The latest declared props.
	pub fn props(&self) -> P {
		self.inner.borrow().props.clone()
	}

	/// Declared props with the current animation frame applied on top.
	pub fn effective_props(&self) -> P {
		let inner = self.inner.borrow();
		let mut props = inner.props.clone();
		for (key, value) in &inner.overlay {
			props.apply(key, value);
		}
		props
	}

	fn run<F: FnOnce() + 'static>(&self, kind: TransitionKind, on_done: Option<F>) {
		let animation = {
			let inner = self.inner.borrow();
			if inner.destroyed {
				return;
			}
			(self.select)(&inner.props, kind)
		};
		let Some(animation) = animation else {
			// No animation for this kind: whatever is in flight stops and the props show as declared.
			{
				let mut inner = self.inner.borrow_mut();
				if let Some(previous) = inner.running.take() {
					trace!("{:?} without animation stops {:?}", kind, previous.kind);
					previous.cancel.cancel();
				}
				inner.overlay.clear();
			}
			if let Some(on_done) = on_done {
				on_done();
			}
			return;
		};

		let generation = {
			let mut inner = self.inner.borrow_mut();
			if let Some(previous) = inner.running.take() {
				trace!("{:?} transition replaces {:?}", kind, previous.kind);
				previous.cancel.cancel();
			}
			inner.overlay.clear();
			inner.generation += 1;
			inner.running = Some(Running {
				generation: inner.generation,
				kind,
				cancel: animation.cancel_handle(),
			});
			inner.generation
		};

		let frame_target = Rc::downgrade(&self.inner);
		let done_target = Rc::downgrade(&self.inner);
		animation.begin(
			Rc::clone(&self.scheduler),
			move |values, continuation| {
				let Some(inner) = frame_target.upgrade() else {
					return;
				};
				let mut inner = inner.borrow_mut();
				if inner.running.as_ref().is_some_and(|r| r.generation == generation) {
					inner.overlay = values;
					drop(inner);
					continuation.resume();
				}
			},
			move || {
				let Some(inner) = done_target.upgrade() else {
					return;
				};
				{
					let mut inner = inner.borrow_mut();
					if inner.destroyed {
						return;
					}
					if inner.running.as_ref().is_some_and(|r| r.generation == generation) {
						inner.running = None;
						inner.overlay.clear();
					}
				}
				if let Some(on_done) = on_done {
					on_done();
				}
			},
		);
	}
}
