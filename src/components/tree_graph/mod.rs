//! Animated, collapsible tree graph.
//!
//! The configuration tree is flattened into a keyed [`TreeStructure`], laid out with a tidy
//! tree algorithm, and drawn on a canvas. Every visible node and link owns a [`Transition`]
//! that animates it between layouts.

mod animation;
mod component;
mod config;
mod easing;
mod elements;
mod error;
mod interpolate;
mod layout;
mod model;
mod render;
mod scheduler;
mod state;
mod tidy;
mod transition;
mod types;

pub use animation::{AnimatedValues, Animation, CancelHandle, Continuation};
pub use component::TreeGraphCanvas;
pub use config::TreeGraphConfig;
pub use easing::EasingFunction;
pub use elements::{LinkProps, NodeProps};
pub use error::{Result, TreeGraphError};
pub use interpolate::{AnimatedValue, Interpolate, tween};
pub use layout::recompute_layout;
pub use model::{ConfigNode, TreeNode, TreeStructure};
pub use render::{
	DefaultNodePainter, ElbowLinkPainter, LinkPainter, NodePainter, NodeView, draw_dot,
};
pub use scheduler::{FrameScheduler, ManualScheduler, RafScheduler};
pub use state::TreeGraphState;
pub use transition::{Animatable, Transition, TransitionKind};
pub use types::{Margin, NodeId, Orientation, Point, Size};
