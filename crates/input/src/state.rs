use std::collections::BTreeSet;

use glam::Vec2;

use crate::action::Action;
use crate::bindings::{Key, KeyBindings};

/// Raw input collected between frames.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: KeyBindings,
    held: BTreeSet<Key>,
    pressed: Vec<Key>,
    mouse_delta: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn new(bindings: KeyBindings) -> Self {
        Self {
            bindings,
            ..Default::default()
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Record a key going down or up. OS key repeat is ignored.
    pub fn key(&mut self, key: Key, down: bool) {
        if down {
            if self.held.insert(key) {
                self.pressed.push(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn mouse_moved(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    pub fn scrolled(&mut self, amount: f32) {
        self.scroll += amount;
    }

    /// Release every key, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll = 0.0;
    }

    /// Actions for a frame lasting `dt` seconds: movement for each held key,
    /// one trigger per key pressed since the last call, then look and speed.
    /// Resets the per-frame accumulators.
    pub fn frame_actions(&mut self, dt: f32) -> Vec<Action> {
        let mut actions: Vec<Action> = self
            .held
            .iter()
            .filter_map(|k| self.bindings.movement(*k))
            .map(|direction| Action::Move {
                direction,
                delta: dt,
            })
            .collect();

        actions.extend(
            self.pressed
                .drain(..)
                .filter_map(|k| self.bindings.trigger(k)),
        );

        if self.mouse_delta != Vec2::ZERO {
            actions.push(Action::Look {
                dx: self.mouse_delta.x,
                dy: self.mouse_delta.y,
            });
        }
        if self.scroll != 0.0 {
            actions.push(Action::AdjustSpeed(self.scroll));
        }
        self.mouse_delta = Vec2::ZERO;
        self.scroll = 0.0;

        if !actions.is_empty() {
            tracing::trace!(count = actions.len(), "frame actions");
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelview_common::{MoveDirection, PrimitiveKind};

    fn state() -> InputState {
        InputState::new(KeyBindings::default())
    }

    #[test]
    fn held_key_moves_every_frame() {
        let mut input = state();
        input.key(Key::W, true);
        for _ in 0..3 {
            assert_eq!(
                input.frame_actions(0.5),
                vec![Action::Move {
                    direction: MoveDirection::Forward,
                    delta: 0.5
                }]
            );
        }
        input.key(Key::W, false);
        assert!(input.frame_actions(0.5).is_empty());
    }

    #[test]
    fn trigger_fires_once_per_press() {
        let mut input = state();
        input.key(Key::Digit3, true);
        input.key(Key::Digit3, true); // key repeat
        assert_eq!(
            input.frame_actions(0.1),
            vec![Action::SetPrimitive(PrimitiveKind::Points)]
        );
        assert!(input.frame_actions(0.1).is_empty());
    }

    #[test]
    fn quick_tap_still_triggers() {
        let mut input = state();
        input.key(Key::Escape, true);
        input.key(Key::Escape, false);
        assert_eq!(input.frame_actions(0.1), vec![Action::Quit]);
    }

    #[test]
    fn mouse_and_scroll_accumulate_then_reset() {
        let mut input = state();
        input.mouse_moved(3.0, -1.0);
        input.mouse_moved(2.0, 4.0);
        input.scrolled(1.0);
        input.scrolled(1.0);
        assert_eq!(
            input.frame_actions(0.1),
            vec![
                Action::Look { dx: 5.0, dy: 3.0 },
                Action::AdjustSpeed(2.0)
            ]
        );
        assert!(input.frame_actions(0.1).is_empty());
    }

    #[test]
    fn action_order_is_movement_triggers_look_speed() {
        let mut input = state();
        input.key(Key::D, true);
        input.key(Key::F1, true);
        input.mouse_moved(1.0, 0.0);
        input.scrolled(-1.0);
        let actions = input.frame_actions(0.2);
        assert_eq!(actions.len(), 4);
        assert!(matches!(actions[0], Action::Move { direction: MoveDirection::Right, .. }));
        assert_eq!(actions[1], Action::ToggleOverlay);
        assert!(matches!(actions[2], Action::Look { .. }));
        assert_eq!(actions[3], Action::AdjustSpeed(-1.0));
    }

    #[test]
    fn clear_releases_keys() {
        let mut input = state();
        input.key(Key::Space, true);
        input.clear();
        assert!(!input.is_held(Key::Space));
        assert!(input.frame_actions(0.1).is_empty());
    }
}
