//! winit enums to keyroute values.

use keyroute_core::{CursorShape, KeyCode, Modifiers, MouseButtons};
use winit::event::MouseButton;
use winit::keyboard::{KeyCode as WKey, ModifiersState, PhysicalKey};
use winit::window::CursorIcon;

/// Maps a physical key to its layout-independent code. Keypad keys map to the
/// main-block key; see [`is_keypad`].
pub fn key_code(key: PhysicalKey) -> KeyCode {
    let PhysicalKey::Code(code) = key else {
        return KeyCode::UNKNOWN;
    };
    if let Some(c) = letter_or_digit(code) {
        return KeyCode::from_char(c);
    }
    match code {
        WKey::Space => KeyCode::SPACE,
        WKey::Quote => KeyCode::APOSTROPHE,
        WKey::NumpadMultiply => KeyCode::ASTERISK,
        WKey::NumpadAdd => KeyCode::PLUS,
        WKey::Comma => KeyCode::COMMA,
        WKey::Minus | WKey::NumpadSubtract => KeyCode::MINUS,
        WKey::Period | WKey::NumpadDecimal => KeyCode::PERIOD,
        WKey::Slash | WKey::NumpadDivide => KeyCode::SLASH,
        WKey::Semicolon => KeyCode::SEMICOLON,
        WKey::Equal => KeyCode::EQUAL,
        WKey::BracketLeft => KeyCode::BRACKET_LEFT,
        WKey::Backslash => KeyCode::BACKSLASH,
        WKey::BracketRight => KeyCode::BRACKET_RIGHT,
        WKey::Backquote => KeyCode::GRAVE,
        WKey::Escape => KeyCode::ESCAPE,
        WKey::Tab => KeyCode::TAB,
        WKey::Backspace => KeyCode::BACKSPACE,
        WKey::Enter | WKey::NumpadEnter => KeyCode::ENTER,
        WKey::Insert => KeyCode::INSERT,
        WKey::Delete => KeyCode::DELETE,
        WKey::Pause => KeyCode::PAUSE,
        WKey::PrintScreen => KeyCode::PRINT,
        WKey::Home => KeyCode::HOME,
        WKey::End => KeyCode::END,
        WKey::ArrowLeft => KeyCode::LEFT,
        WKey::ArrowUp => KeyCode::UP,
        WKey::ArrowRight => KeyCode::RIGHT,
        WKey::ArrowDown => KeyCode::DOWN,
        WKey::PageUp => KeyCode::PAGE_UP,
        WKey::PageDown => KeyCode::PAGE_DOWN,
        WKey::ShiftLeft | WKey::ShiftRight => KeyCode::SHIFT,
        WKey::ControlLeft | WKey::ControlRight => KeyCode::CONTROL,
        WKey::SuperLeft | WKey::SuperRight => KeyCode::META,
        WKey::AltLeft | WKey::AltRight => KeyCode::ALT,
        WKey::CapsLock => KeyCode::CAPS_LOCK,
        WKey::NumLock => KeyCode::NUM_LOCK,
        WKey::ScrollLock => KeyCode::SCROLL_LOCK,
        WKey::ContextMenu => KeyCode::MENU,
        WKey::F1 => KeyCode::F1,
        WKey::F2 => KeyCode(KeyCode::F1.0 + 1),
        WKey::F3 => KeyCode(KeyCode::F1.0 + 2),
        WKey::F4 => KeyCode(KeyCode::F1.0 + 3),
        WKey::F5 => KeyCode(KeyCode::F1.0 + 4),
        WKey::F6 => KeyCode(KeyCode::F1.0 + 5),
        WKey::F7 => KeyCode(KeyCode::F1.0 + 6),
        WKey::F8 => KeyCode(KeyCode::F1.0 + 7),
        WKey::F9 => KeyCode(KeyCode::F1.0 + 8),
        WKey::F10 => KeyCode(KeyCode::F1.0 + 9),
        WKey::F11 => KeyCode(KeyCode::F1.0 + 10),
        WKey::F12 => KeyCode::F12,
        _ => KeyCode::UNKNOWN,
    }
}

fn letter_or_digit(code: WKey) -> Option<char> {
    let c = match code {
        WKey::KeyA => 'A',
        WKey::KeyB => 'B',
        WKey::KeyC => 'C',
        WKey::KeyD => 'D',
        WKey::KeyE => 'E',
        WKey::KeyF => 'F',
        WKey::KeyG => 'G',
        WKey::KeyH => 'H',
        WKey::KeyI => 'I',
        WKey::KeyJ => 'J',
        WKey::KeyK => 'K',
        WKey::KeyL => 'L',
        WKey::KeyM => 'M',
        WKey::KeyN => 'N',
        WKey::KeyO => 'O',
        WKey::KeyP => 'P',
        WKey::KeyQ => 'Q',
        WKey::KeyR => 'R',
        WKey::KeyS => 'S',
        WKey::KeyT => 'T',
        WKey::KeyU => 'U',
        WKey::KeyV => 'V',
        WKey::KeyW => 'W',
        WKey::KeyX => 'X',
        WKey::KeyY => 'Y',
        WKey::KeyZ => 'Z',
        WKey::Digit0 | WKey::Numpad0 => '0',
        WKey::Digit1 | WKey::Numpad1 => '1',
        WKey::Digit2 | WKey::Numpad2 => '2',
        WKey::Digit3 | WKey::Numpad3 => '3',
        WKey::Digit4 | WKey::Numpad4 => '4',
        WKey::Digit5 | WKey::Numpad5 => '5',
        WKey::Digit6 | WKey::Numpad6 => '6',
        WKey::Digit7 | WKey::Numpad7 => '7',
        WKey::Digit8 | WKey::Numpad8 => '8',
        WKey::Digit9 | WKey::Numpad9 => '9',
        _ => return None,
    };
    Some(c)
}

pub fn is_keypad(key: PhysicalKey) -> bool {
    matches!(
        key,
        PhysicalKey::Code(
            WKey::Numpad0
                | WKey::Numpad1
                | WKey::Numpad2
                | WKey::Numpad3
                | WKey::Numpad4
                | WKey::Numpad5
                | WKey::Numpad6
                | WKey::Numpad7
                | WKey::Numpad8
                | WKey::Numpad9
                | WKey::NumpadAdd
                | WKey::NumpadSubtract
                | WKey::NumpadMultiply
                | WKey::NumpadDivide
                | WKey::NumpadDecimal
                | WKey::NumpadEnter
        )
    )
}

pub fn modifiers(state: ModifiersState) -> Modifiers {
    let mut m = Modifiers::empty();
    m.set(Modifiers::SHIFT, state.shift_key());
    m.set(Modifiers::CTRL, state.control_key());
    m.set(Modifiers::ALT, state.alt_key());
    m.set(Modifiers::META, state.super_key());
    m
}

pub fn mouse_button(button: MouseButton) -> Option<MouseButtons> {
    match button {
        MouseButton::Left => Some(MouseButtons::LEFT),
        MouseButton::Right => Some(MouseButtons::RIGHT),
        MouseButton::Middle => Some(MouseButtons::MIDDLE),
        MouseButton::Back => Some(MouseButtons::BUTTON4),
        MouseButton::Forward => Some(MouseButtons::BUTTON5),
        MouseButton::Other(_) => None,
    }
}

pub fn cursor_icon(shape: CursorShape) -> CursorIcon {
    match shape {
        CursorShape::Arrow => CursorIcon::Default,
        CursorShape::Crosshair => CursorIcon::Crosshair,
        CursorShape::PointingHand => CursorIcon::Pointer,
        CursorShape::OpenHand => CursorIcon::Grab,
        CursorShape::ClosedHand => CursorIcon::Grabbing,
        CursorShape::IBeam => CursorIcon::Text,
        CursorShape::Wait => CursorIcon::Wait,
        CursorShape::SizeAll => CursorIcon::Move,
        CursorShape::SizeHorizontal => CursorIcon::EwResize,
        CursorShape::SizeVertical => CursorIcon::NsResize,
        CursorShape::Forbidden => CursorIcon::NotAllowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_digits_and_keypad() {
        assert_eq!(key_code(PhysicalKey::Code(WKey::KeyW)), KeyCode::W);
        assert_eq!(key_code(PhysicalKey::Code(WKey::Digit7)), KeyCode::DIGIT_7);
        assert_eq!(key_code(PhysicalKey::Code(WKey::Numpad7)), KeyCode::DIGIT_7);
        assert!(is_keypad(PhysicalKey::Code(WKey::Numpad7)));
        assert!(!is_keypad(PhysicalKey::Code(WKey::Digit7)));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(key_code(PhysicalKey::Code(WKey::F5)), KeyCode::function(5).unwrap());
        assert_eq!(key_code(PhysicalKey::Code(WKey::F12)), KeyCode::F12);
        assert_eq!(key_code(PhysicalKey::Code(WKey::ControlRight)), KeyCode::CONTROL);
        assert_eq!(key_code(PhysicalKey::Code(WKey::Backquote)), KeyCode::GRAVE);
        assert_eq!(key_code(PhysicalKey::Code(WKey::F24)), KeyCode::UNKNOWN);
    }

    #[test]
    fn test_modifier_state() {
        let m = modifiers(ModifiersState::CONTROL | ModifiersState::SHIFT);
        assert_eq!(m, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(modifiers(ModifiersState::SUPER), Modifiers::META);
    }

    #[test]
    fn test_buttons() {
        assert_eq!(mouse_button(MouseButton::Back), Some(MouseButtons::BUTTON4));
        assert_eq!(mouse_button(MouseButton::Other(9)), None);
    }
}
