use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pan(Direction),
    NextNode,
    ZoomIn,
    ZoomOut,
    Recenter,
    Quit,
    ToggleHelp,
    AddChild,
    EditNode,
    DeleteNode,
    ClearMap,
    Export,
    CyclePalette,
    OpenSettings,
    SubmitText,
    Cancel,
    Backspace,
    CursorLeft,
    CursorRight,
    InputChar(char),
    Noop,
}

pub fn action_for_key(key: KeyEvent, text_mode: bool) -> Action {
    if text_mode {
        return match key.code {
            KeyCode::Enter => Action::SubmitText,
            KeyCode::Esc => Action::Cancel,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Left => Action::CursorLeft,
            KeyCode::Right => Action::CursorRight,
            KeyCode::Char(c) => Action::InputChar(c),
            _ => Action::Noop,
        };
    }

    match key.code {
        KeyCode::Up => Action::Pan(Direction::Up),
        KeyCode::Down => Action::Pan(Direction::Down),
        KeyCode::Left => Action::Pan(Direction::Left),
        KeyCode::Right => Action::Pan(Direction::Right),
        KeyCode::Tab => Action::NextNode,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Backspace => Action::Cancel,
        KeyCode::Char('+') => Action::ZoomIn,
        KeyCode::Char('=') if !key.modifiers.contains(KeyModifiers::CONTROL) => Action::ZoomIn,
        KeyCode::Char('-') => Action::ZoomOut,
        KeyCode::Char('0') => Action::Recenter,
        KeyCode::Char('?') => Action::ToggleHelp,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('a') => Action::AddChild,
        KeyCode::Char('e') => Action::EditNode,
        KeyCode::Char('d') => Action::DeleteNode,
        KeyCode::Char('C') => Action::ClearMap,
        KeyCode::Char('x') => Action::Export,
        KeyCode::Char('p') => Action::CyclePalette,
        KeyCode::Char('s') => Action::OpenSettings,
        _ => Action::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn canvas_keys_map_to_actions() {
        assert_eq!(action_for_key(key(KeyCode::Tab), false), Action::NextNode);
        assert_eq!(action_for_key(key(KeyCode::Char('a')), false), Action::AddChild);
        assert_eq!(action_for_key(key(KeyCode::Char('d')), false), Action::DeleteNode);
        assert_eq!(action_for_key(key(KeyCode::Char('C')), false), Action::ClearMap);
        assert_eq!(action_for_key(key(KeyCode::Char('c')), false), Action::Noop);
        assert_eq!(action_for_key(key(KeyCode::Char('=')), false), Action::ZoomIn);
        assert_eq!(
            action_for_key(key(KeyCode::Left), false),
            Action::Pan(Direction::Left)
        );
    }

    #[test]
    fn text_mode_captures_letters() {
        assert_eq!(
            action_for_key(key(KeyCode::Char('q')), true),
            Action::InputChar('q')
        );
        assert_eq!(action_for_key(key(KeyCode::Left), true), Action::CursorLeft);
        assert_eq!(action_for_key(key(KeyCode::Enter), true), Action::SubmitText);
        assert_eq!(action_for_key(key(KeyCode::Tab), true), Action::Noop);
    }
}
