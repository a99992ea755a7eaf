use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Pointer input in pixels relative to the top-left corner of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub button: MouseButton,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            button: MouseButton::LEFT,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }
}

/// Held buttons and last known pointer position, used to turn moves into drags.
#[derive(Debug, Default)]
pub struct PointerState {
    buttons: HashSet<MouseButton>,
    position: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, event: PointerEvent) {
        self.buttons.insert(event.button);
        self.position = Some(event.position);
    }

    pub fn release(&mut self, event: PointerEvent) {
        self.buttons.remove(&event.button);
        self.position = Some(event.position);
    }

    /// Records a move and returns the drag delta if the primary button is held.
    pub fn move_to(&mut self, position: Vec2) -> Option<Vec2> {
        let previous = self.position.replace(position);
        if !self.is_down(MouseButton::LEFT) {
            return None;
        }
        previous.map(|previous| position - previous)
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
        self.position = None;
    }
}
