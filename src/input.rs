//! Key identities and key bindings (arrows plus vim-style aliases).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Normalized key identity understood by the game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyId {
    ArrowLeft,
    ArrowRight,
    ArrowDown,
    ArrowUp,
}

impl KeyId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
            Self::ArrowDown => "ArrowDown",
            Self::ArrowUp => "ArrowUp",
        }
    }
}

/// Action from a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Key(KeyId),
    SoftDropHold,
    SoftDropRelease,
    SoftDropTap,
    Restart,
    Quit,
    None,
}

/// Map key event to game action.
///
/// Down is a hold (press .. release) when the terminal reports key releases; otherwise every
/// press, including auto-repeat, is a tap that restarts the soft-drop burst.
pub fn key_to_action(key: KeyEvent, releases_reported: bool) -> Action {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
            return Action::Quit;
        }
        return Action::None;
    }
    let is_down = matches!(code, KeyCode::Down | KeyCode::Char('j'));
    match kind {
        KeyEventKind::Release if is_down && releases_reported => return Action::SoftDropRelease,
        KeyEventKind::Release => return Action::None,
        // A held Down is already soft dropping; other keys auto-repeat.
        KeyEventKind::Repeat if is_down && releases_reported => return Action::None,
        _ => {}
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Key(KeyId::ArrowLeft),
        KeyCode::Right | KeyCode::Char('l') => Action::Key(KeyId::ArrowRight),
        KeyCode::Up | KeyCode::Char('k') => Action::Key(KeyId::ArrowUp),
        _ if is_down && releases_reported => Action::SoftDropHold,
        _ if is_down => Action::SoftDropTap,
        // One-row step, same as the on-screen button path.
        KeyCode::Char(' ') => Action::Key(KeyId::ArrowDown),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn with_kind(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn test_key_names() {
        assert_eq!(KeyId::ArrowLeft.as_str(), "ArrowLeft");
        assert_eq!(KeyId::ArrowDown.as_str(), "ArrowDown");
    }

    #[test]
    fn test_arrows_and_vim_keys() {
        assert_eq!(
            key_to_action(press(KeyCode::Left), true),
            Action::Key(KeyId::ArrowLeft)
        );
        assert_eq!(
            key_to_action(press(KeyCode::Char('l')), false),
            Action::Key(KeyId::ArrowRight)
        );
        assert_eq!(
            key_to_action(press(KeyCode::Up), false),
            Action::Key(KeyId::ArrowUp)
        );
        assert_eq!(
            key_to_action(press(KeyCode::Char(' ')), false),
            Action::Key(KeyId::ArrowDown)
        );
    }

    #[test]
    fn test_down_is_hold_when_releases_reported() {
        assert_eq!(key_to_action(press(KeyCode::Down), true), Action::SoftDropHold);
        assert_eq!(
            key_to_action(with_kind(KeyCode::Down, KeyEventKind::Release), true),
            Action::SoftDropRelease
        );
        assert_eq!(
            key_to_action(with_kind(KeyCode::Down, KeyEventKind::Repeat), true),
            Action::None
        );
    }

    #[test]
    fn test_held_arrows_repeat_when_releases_reported() {
        assert_eq!(
            key_to_action(with_kind(KeyCode::Left, KeyEventKind::Repeat), true),
            Action::Key(KeyId::ArrowLeft)
        );
        assert_eq!(
            key_to_action(with_kind(KeyCode::Char('l'), KeyEventKind::Repeat), true),
            Action::Key(KeyId::ArrowRight)
        );
        assert_eq!(
            key_to_action(with_kind(KeyCode::Up, KeyEventKind::Repeat), true),
            Action::Key(KeyId::ArrowUp)
        );
    }

    #[test]
    fn test_down_is_tap_without_releases() {
        assert_eq!(key_to_action(press(KeyCode::Down), false), Action::SoftDropTap);
        assert_eq!(
            key_to_action(with_kind(KeyCode::Char('j'), KeyEventKind::Repeat), false),
            Action::SoftDropTap
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        assert_eq!(key_to_action(press(KeyCode::Char('x')), true), Action::None);
        assert_eq!(key_to_action(press(KeyCode::F(1)), true), Action::None);
        assert_eq!(
            key_to_action(with_kind(KeyCode::Left, KeyEventKind::Release), true),
            Action::None
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT), true),
            Action::None
        );
    }
}
