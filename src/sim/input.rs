//! Input latches
//!
//! Discrete key/touch events only flip booleans here. The frame routine reads
//! them level-wise every frame and applies the matching continuous effect.

/// Logical actions the scene responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Release the withheld boxes (one-shot)
    Drop,
    RotateLeft,
    RotateRight,
    TiltForward,
    TiltBack,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Drop,
        Action::RotateLeft,
        Action::RotateRight,
        Action::TiltForward,
        Action::TiltBack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Action::Drop => "drop",
            Action::RotateLeft => "rotate-left",
            Action::RotateRight => "rotate-right",
            Action::TiltForward => "tilt-forward",
            Action::TiltBack => "tilt-back",
        }
    }

    /// Parse a `data-action` attribute value
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" => Some(Action::Drop),
            "ArrowLeft" | "a" | "A" => Some(Action::RotateLeft),
            "ArrowRight" | "d" | "D" => Some(Action::RotateRight),
            "ArrowUp" | "w" | "W" => Some(Action::TiltForward),
            "ArrowDown" | "s" | "S" => Some(Action::TiltBack),
            _ => None,
        }
    }

    /// Latches that stay set after release
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Action::Drop)
    }
}

/// Latch state handed to the frame routine each frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub drop: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub tilt_forward: bool,
    pub tilt_back: bool,
}

impl InputState {
    /// Key-down / touch-start
    pub fn press(&mut self, action: Action) {
        *self.latch_mut(action) = true;
    }

    /// Key-up / touch-end. The drop latch ignores release.
    pub fn release(&mut self, action: Action) {
        if action.is_one_shot() {
            return;
        }
        *self.latch_mut(action) = false;
    }

    pub fn is_active(&self, action: Action) -> bool {
        match action {
            Action::Drop => self.drop,
            Action::RotateLeft => self.rotate_left,
            Action::RotateRight => self.rotate_right,
            Action::TiltForward => self.tilt_forward,
            Action::TiltBack => self.tilt_back,
        }
    }

    /// Yaw and pitch direction requested this frame, each in {-1, 0, 1}
    pub fn attitude_direction(&self) -> (f32, f32) {
        let yaw = self.rotate_left as i8 - self.rotate_right as i8;
        let pitch = self.tilt_forward as i8 - self.tilt_back as i8;
        (yaw as f32, pitch as f32)
    }

    fn latch_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Drop => &mut self.drop,
            Action::RotateLeft => &mut self.rotate_left,
            Action::RotateRight => &mut self.rotate_right,
            Action::TiltForward => &mut self.tilt_forward,
            Action::TiltBack => &mut self.tilt_back,
        }
    }
}
