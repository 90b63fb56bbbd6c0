//! # Pointer events
//!
//! Mouse, pen, and touch input in display space, as delivered by the host. Several touches may
//! be down at once, told apart by their pointer ID.

#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The pointer left the surface.
    Leave,
    /// The host took the pointer away, e.g. for scrolling.
    Cancel,
}
impl PointerPhase {
    /// Whether this phase ends the pointer's contact.
    #[must_use]
    pub fn is_release(self) -> bool {
        matches!(self, Self::Up | Self::Leave | Self::Cancel)
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PointerEvent {
    /// Host-assigned, stable for the duration of one contact.
    pub pointer: u64,
    pub phase: PointerPhase,
    /// Display-space position, in logical pixels.
    pub pos: ultraviolet::Vec2,
}
impl PointerEvent {
    #[must_use]
    pub fn new(pointer: u64, phase: PointerPhase, [x, y]: [f32; 2]) -> Self {
        Self {
            pointer,
            phase,
            pos: ultraviolet::Vec2 { x, y },
        }
    }
}
