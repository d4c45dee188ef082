/// Held actions sampled every tick. One-tick edge presses (interact, panel
/// toggles, battle keys) are collected separately through [`EdgeTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Sprint,
    Crouch,
}

const ACTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBackward => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Sprint => 4,
            InputAction::Crouch => 5,
        }
    }
}

/// Latches a key-down edge until the next tick snapshot consumes it.
/// Holding the key does not retrigger; the OS key-repeat stream is ignored
/// while `is_down` stays true.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTrigger {
    is_down: bool,
    pressed_edge: bool,
}

impl EdgeTrigger {
    pub fn on_key(&mut self, is_down: bool) {
        if is_down && !self.is_down {
            self.pressed_edge = true;
        }
        self.is_down = is_down;
    }

    pub fn take_pressed(&mut self) -> bool {
        std::mem::take(&mut self.pressed_edge)
    }
}
