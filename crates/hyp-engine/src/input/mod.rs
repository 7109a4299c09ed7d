//! Input subsystem.
//!
//! Platform-agnostic: the window runtime translates winit events into
//! [`InputEvent`]s and applies them to the window's [`InputState`].

mod frame;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent};
