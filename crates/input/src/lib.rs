//! Input: keyboard and mouse state mapped to viewer actions.
//!
//! # Invariants
//! - Consumers see only [`Action`]s, never windowing key codes.
//! - A press yields exactly one trigger, however long the key is held.
//! - Movement actions carry the frame delta so motion is frame-rate
//!   independent.

pub mod action;
pub mod bindings;
pub mod state;

pub use action::Action;
pub use bindings::{Key, KeyBindings};
pub use state::InputState;
