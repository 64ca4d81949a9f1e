//! Fortune Wheel Engine
//!
//! Platform-agnostic spin resolution for a segmented prize wheel: winner
//! selection, landing-angle planning and the two-step spin lifecycle.
//! Rendering is left to the host; it reads a [`WheelFrame`] and listens for
//! the start and end notifications.

pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod numbers;
pub mod planner;
pub mod presets;
pub mod prize;
pub mod random;
pub mod selector;
pub mod spin;

// Re-export commonly used types
pub use config::{WheelConfig, WheelConfigError};
pub use error::SpinError;
pub use layout::{LabelStyle, SegmentArc, WheelFrame, segment_arcs};
pub use planner::{RotationPlan, SafeZone, landing_index, plan_rotation, safe_zone};
pub use presets::Preset;
pub use prize::{CatalogError, DisplayOrientation, Prize, PrizeCatalog, PrizeColor};
pub use random::{CountingRng, DrawFn, RandomSource, SpinDraws, SpinRng};
pub use selector::{SpinOutcome, WinnerPolicy, check_eligible, select};
#[cfg(feature = "async")]
pub use spin::TokioScheduler;
pub use spin::{
    ManualScheduler, Scheduler, SpinEffect, SpinMachine, SpinPhase, SpinRecord, SpinRequest,
    TimerHandle, WeakWheel, Wheel,
};
