use std::collections::BTreeMap;

use voxelview_common::{MoveDirection, PrimitiveKind};

use crate::action::Action;

/// Keys the viewer reacts to, independent of the windowing library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftShift,
    Digit1,
    Digit2,
    Digit3,
    Escape,
    F1,
}

/// Maps keys to movement (while held) and to one-shot triggers (on press).
#[derive(Debug, Clone)]
pub struct KeyBindings {
    movement: BTreeMap<Key, MoveDirection>,
    triggers: BTreeMap<Key, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (key, direction) in [
            (Key::W, MoveDirection::Forward),
            (Key::S, MoveDirection::Backward),
            (Key::A, MoveDirection::Left),
            (Key::D, MoveDirection::Right),
            (Key::Space, MoveDirection::Up),
            (Key::LeftShift, MoveDirection::Down),
        ] {
            bindings.bind_movement(key, direction);
        }
        for (key, action) in [
            (Key::Digit1, Action::SetPrimitive(PrimitiveKind::Triangles)),
            (Key::Digit2, Action::SetPrimitive(PrimitiveKind::Lines)),
            (Key::Digit3, Action::SetPrimitive(PrimitiveKind::Points)),
            (Key::Escape, Action::Quit),
            (Key::F1, Action::ToggleOverlay),
        ] {
            bindings.bind_trigger(key, action);
        }
        bindings
    }
}

impl KeyBindings {
    /// Bindings with nothing mapped.
    pub fn empty() -> Self {
        Self {
            movement: BTreeMap::new(),
            triggers: BTreeMap::new(),
        }
    }

    /// Bind `key` to movement while held. Replaces any trigger on that key.
    pub fn bind_movement(&mut self, key: Key, direction: MoveDirection) {
        self.triggers.remove(&key);
        self.movement.insert(key, direction);
    }

    /// Bind `key` to fire `action` once per press. Replaces any movement on
    /// that key.
    pub fn bind_trigger(&mut self, key: Key, action: Action) {
        self.movement.remove(&key);
        self.triggers.insert(key, action);
    }

    pub fn movement(&self, key: Key) -> Option<MoveDirection> {
        self.movement.get(&key).copied()
    }

    pub fn trigger(&self, key: Key) -> Option<Action> {
        self.triggers.get(&key).copied()
    }
}
