use voxelview_common::{MoveDirection, PrimitiveKind};

/// What the viewer should do this frame. Produced from raw input by
/// [`crate::InputState::frame_actions`]; consumers never see key codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move the camera; `delta` is the frame time in seconds.
    Move { direction: MoveDirection, delta: f32 },
    /// Rotate the camera by a mouse delta in pixels.
    Look { dx: f32, dy: f32 },
    /// Add to the camera speed.
    AdjustSpeed(f32),
    SetPrimitive(PrimitiveKind),
    ToggleOverlay,
    Quit,
}
