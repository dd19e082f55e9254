//! Folds winit events into the level-triggered [`InputSnapshot`] the engine reads.
//!
//! Bindings: Q/W/E/R arm the four corners, the left mouse button commits a
//! pick, Space runs the animation, digits 1..9,0 pick a speed preset and
//! Escape exits.

use std::collections::HashSet;

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::events::{CornerArms, InputSnapshot, Pointer};

const SPEED_KEYS: [KeyCode; 10] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::Digit0,
];

#[derive(Debug, Default)]
pub struct InputTracker {
    held: HashSet<KeyCode>,
    pointer: Pointer,
    commit: bool,
    exit: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates held state from a window event. Returns true if the event was input.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.set_key(code, event.state == ElementState::Pressed);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_button(*button, *state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.set_pointer(position.x, position.y);
                true
            }
            WindowEvent::Focused(false) => {
                // Release events are not delivered while unfocused.
                self.held.clear();
                self.commit = false;
                true
            }
            _ => false,
        }
    }

    pub fn set_key(&mut self, code: KeyCode, pressed: bool) {
        if code == KeyCode::Escape && pressed {
            self.exit = true;
        }
        if pressed {
            self.held.insert(code);
        } else {
            self.held.remove(&code);
        }
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if button == MouseButton::Left {
            self.commit = pressed;
        }
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.pointer = Pointer { x, y };
    }

    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// Samples the current state for one tick.
    pub fn snapshot(&self, elapsed_seconds: f64) -> InputSnapshot {
        InputSnapshot {
            pointer: self.pointer,
            arms: CornerArms {
                start_top_left: self.is_held(KeyCode::KeyQ),
                start_bottom_right: self.is_held(KeyCode::KeyW),
                end_top_left: self.is_held(KeyCode::KeyE),
                end_bottom_right: self.is_held(KeyCode::KeyR),
            },
            commit: self.commit,
            trigger: self.is_held(KeyCode::Space),
            speed_selector: SPEED_KEYS.iter().position(|&key| self.is_held(key)),
            exit: self.exit,
            elapsed_seconds,
        }
    }
}
