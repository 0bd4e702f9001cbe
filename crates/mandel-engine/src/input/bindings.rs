use super::state::InputState;
use super::types::Key;

/// Harness-level action produced by polling input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    /// Close the window and leave the render loop.
    Close,
}

/// Polls the held-key state once per frame.
///
/// Escape held → `Close`. Nothing else is bound.
pub fn process_input(state: &InputState) -> Option<Action> {
    state.key_down(Key::Escape).then_some(Action::Close)
}
