//! hyp engine crate.
//!
//! Window runtime, GPU device, input and timing, plus the batched 2D
//! renderer in [`render`].

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
