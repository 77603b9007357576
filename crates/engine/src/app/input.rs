use std::collections::VecDeque;

use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Confirm,
    Quit,
}

const ACTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Confirm => 4,
            InputAction::Quit => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub button: MouseButton,
    /// Screen-space pixel position; scenes convert it through the camera.
    pub screen: Vec2,
}

/// Discrete input produced by the platform layer and queued until the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Action { action: InputAction, pressed: bool },
    Click(Click),
    QuitRequested,
}

/// Input as seen by one frame: held actions, actions newly pressed this frame,
/// and clicks in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
    clicks: Vec<Click>,
    quit_requested: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.was_pressed(InputAction::Confirm)
    }

    pub fn clicks(&self) -> &[Click] {
        &self.clicks
    }

    /// True for a window close request or a fresh press of the quit action.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.was_pressed(InputAction::Quit)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }

    pub fn with_click(mut self, button: MouseButton, screen: Vec2) -> Self {
        self.clicks.push(Click { button, screen });
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// Queue drained exactly once per frame by the engine.
#[derive(Debug, Default)]
pub struct InputQueue {
    pending: VecDeque<InputEvent>,
    held: ActionStates,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain_snapshot(&mut self) -> InputSnapshot {
        let mut pressed = ActionStates::default();
        let mut clicks = Vec::new();
        let mut quit_requested = false;

        while let Some(event) = self.pending.pop_front() {
            match event {
                InputEvent::Action {
                    action,
                    pressed: true,
                } => {
                    if !self.held.is_down(action) {
                        pressed.set(action, true);
                    }
                    self.held.set(action, true);
                }
                InputEvent::Action {
                    action,
                    pressed: false,
                } => self.held.set(action, false),
                InputEvent::Click(click) => clicks.push(click),
                InputEvent::QuitRequested => quit_requested = true,
            }
        }

        InputSnapshot {
            held: self.held,
            pressed,
            clicks,
            quit_requested,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.held = ActionStates::default();
    }
}
