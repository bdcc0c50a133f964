//! Per-tick player intent

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Button state bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Buttons(pub u8);

impl Buttons {
    pub const FORWARD: Buttons = Buttons(1 << 0);
    pub const BACKWARD: Buttons = Buttons(1 << 1);
    pub const LEFT: Buttons = Buttons(1 << 2);
    pub const RIGHT: Buttons = Buttons(1 << 3);
    pub const JUMP: Buttons = Buttons(1 << 4);
    pub const ESCAPE: Buttons = Buttons(1 << 5);
    pub const FIRE: Buttons = Buttons(1 << 6);
    pub const AIM: Buttons = Buttons(1 << 7);

    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: Buttons, down: bool) {
        if down {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for Buttons {
    type Output = Buttons;
    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

/// Sampled once per tick per player and never changed afterwards, so a
/// re-simulated tick sees exactly the same intent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Input {
    pub buttons: Buttons,
    /// x: pitch delta, y: yaw delta, in degrees
    pub look_delta: Vec2,
}

impl Input {
    pub fn new(buttons: Buttons, look_delta: Vec2) -> Self {
        Self {
            buttons,
            look_delta,
        }
    }

    pub fn is_down(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }

    /// Down this tick but not on the previous one.
    pub fn was_pressed(&self, previous: &Input, button: Buttons) -> bool {
        self.is_down(button) && !previous.is_down(button)
    }
}
