//! Frame timing.
//!
//! - one [`FrameClock`] per render loop; `tick()` once per presented frame
//! - [`Interval`] for fixed-rate updates driven by frame deltas

mod frame_clock;
mod interval;

pub use frame_clock::{FrameClock, FrameTime};
pub use interval::Interval;
