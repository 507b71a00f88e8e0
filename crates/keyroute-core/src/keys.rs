//! Key codes, modifier masks and multi-chord key sequences.
//!
//! Text form of a sequence: chords separated by `", "`, each chord written as
//! `Ctrl+Alt+Shift+Meta+Key` with modifiers in that fixed order. The plus key
//! itself is written `+`, so `Ctrl++` is Ctrl and plus.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::error::ParseKeySequenceError;

/// Platform-neutral key identity. Printable keys use the code point of their
/// upper-case character, named keys live above `0x0100_0000`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const UNKNOWN: KeyCode = KeyCode(0x01FF_FFFF);

    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const APOSTROPHE: KeyCode = KeyCode(0x27);
    pub const ASTERISK: KeyCode = KeyCode(0x2A);
    pub const PLUS: KeyCode = KeyCode(0x2B);
    pub const COMMA: KeyCode = KeyCode(0x2C);
    pub const MINUS: KeyCode = KeyCode(0x2D);
    pub const PERIOD: KeyCode = KeyCode(0x2E);
    pub const SLASH: KeyCode = KeyCode(0x2F);
    pub const DIGIT_0: KeyCode = KeyCode(0x30);
    pub const DIGIT_1: KeyCode = KeyCode(0x31);
    pub const DIGIT_2: KeyCode = KeyCode(0x32);
    pub const DIGIT_3: KeyCode = KeyCode(0x33);
    pub const DIGIT_4: KeyCode = KeyCode(0x34);
    pub const DIGIT_5: KeyCode = KeyCode(0x35);
    pub const DIGIT_6: KeyCode = KeyCode(0x36);
    pub const DIGIT_7: KeyCode = KeyCode(0x37);
    pub const DIGIT_8: KeyCode = KeyCode(0x38);
    pub const DIGIT_9: KeyCode = KeyCode(0x39);
    pub const SEMICOLON: KeyCode = KeyCode(0x3B);
    pub const EQUAL: KeyCode = KeyCode(0x3D);
    pub const A: KeyCode = KeyCode(0x41);
    pub const B: KeyCode = KeyCode(0x42);
    pub const C: KeyCode = KeyCode(0x43);
    pub const D: KeyCode = KeyCode(0x44);
    pub const E: KeyCode = KeyCode(0x45);
    pub const F: KeyCode = KeyCode(0x46);
    pub const G: KeyCode = KeyCode(0x47);
    pub const H: KeyCode = KeyCode(0x48);
    pub const I: KeyCode = KeyCode(0x49);
    pub const J: KeyCode = KeyCode(0x4A);
    pub const K: KeyCode = KeyCode(0x4B);
    pub const L: KeyCode = KeyCode(0x4C);
    pub const M: KeyCode = KeyCode(0x4D);
    pub const N: KeyCode = KeyCode(0x4E);
    pub const O: KeyCode = KeyCode(0x4F);
    pub const P: KeyCode = KeyCode(0x50);
    pub const Q: KeyCode = KeyCode(0x51);
    pub const R: KeyCode = KeyCode(0x52);
    pub const S: KeyCode = KeyCode(0x53);
    pub const T: KeyCode = KeyCode(0x54);
    pub const U: KeyCode = KeyCode(0x55);
    pub const V: KeyCode = KeyCode(0x56);
    pub const W: KeyCode = KeyCode(0x57);
    pub const X: KeyCode = KeyCode(0x58);
    pub const Y: KeyCode = KeyCode(0x59);
    pub const Z: KeyCode = KeyCode(0x5A);
    pub const BRACKET_LEFT: KeyCode = KeyCode(0x5B);
    pub const BACKSLASH: KeyCode = KeyCode(0x5C);
    pub const BRACKET_RIGHT: KeyCode = KeyCode(0x5D);
    pub const GRAVE: KeyCode = KeyCode(0x60);
    pub const BAR: KeyCode = KeyCode(0x7C);

    pub const ESCAPE: KeyCode = KeyCode(0x0100_0000);
    pub const TAB: KeyCode = KeyCode(0x0100_0001);
    pub const BACKSPACE: KeyCode = KeyCode(0x0100_0003);
    pub const ENTER: KeyCode = KeyCode(0x0100_0004);
    pub const INSERT: KeyCode = KeyCode(0x0100_0006);
    pub const DELETE: KeyCode = KeyCode(0x0100_0007);
    pub const PAUSE: KeyCode = KeyCode(0x0100_0008);
    pub const PRINT: KeyCode = KeyCode(0x0100_0009);
    pub const HOME: KeyCode = KeyCode(0x0100_0010);
    pub const END: KeyCode = KeyCode(0x0100_0011);
    pub const LEFT: KeyCode = KeyCode(0x0100_0012);
    pub const UP: KeyCode = KeyCode(0x0100_0013);
    pub const RIGHT: KeyCode = KeyCode(0x0100_0014);
    pub const DOWN: KeyCode = KeyCode(0x0100_0015);
    pub const PAGE_UP: KeyCode = KeyCode(0x0100_0016);
    pub const PAGE_DOWN: KeyCode = KeyCode(0x0100_0017);
    pub const SHIFT: KeyCode = KeyCode(0x0100_0020);
    pub const CONTROL: KeyCode = KeyCode(0x0100_0021);
    pub const META: KeyCode = KeyCode(0x0100_0022);
    pub const ALT: KeyCode = KeyCode(0x0100_0023);
    pub const CAPS_LOCK: KeyCode = KeyCode(0x0100_0024);
    pub const NUM_LOCK: KeyCode = KeyCode(0x0100_0025);
    pub const SCROLL_LOCK: KeyCode = KeyCode(0x0100_0026);
    pub const F1: KeyCode = KeyCode(0x0100_0030);
    pub const F12: KeyCode = KeyCode(0x0100_003B);
    pub const MENU: KeyCode = KeyCode(0x0100_0055);

    /// Key for a printable character; letters fold to upper case.
    pub fn from_char(c: char) -> Self {
        KeyCode(c.to_ascii_uppercase() as u32)
    }

    /// `n` in `1..=12`.
    pub fn function(n: u8) -> Option<Self> {
        (1..=12)
            .contains(&n)
            .then(|| KeyCode(Self::F1.0 + u32::from(n) - 1))
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, Self::SHIFT | Self::CONTROL | Self::META | Self::ALT)
    }

    fn function_index(self) -> Option<u32> {
        (Self::F1.0..=Self::F12.0)
            .contains(&self.0)
            .then(|| self.0 - Self::F1.0 + 1)
    }
}

// First name is canonical, the rest are accepted aliases.
const KEY_NAMES: &[(KeyCode, &[&str])] = &[
    (KeyCode::SPACE, &["Space"]),
    (KeyCode::ESCAPE, &["Esc", "Escape"]),
    (KeyCode::TAB, &["Tab"]),
    (KeyCode::BACKSPACE, &["Backspace"]),
    (KeyCode::ENTER, &["Enter", "Return"]),
    (KeyCode::INSERT, &["Ins", "Insert"]),
    (KeyCode::DELETE, &["Del", "Delete"]),
    (KeyCode::PAUSE, &["Pause"]),
    (KeyCode::PRINT, &["Print"]),
    (KeyCode::HOME, &["Home"]),
    (KeyCode::END, &["End"]),
    (KeyCode::LEFT, &["Left"]),
    (KeyCode::UP, &["Up"]),
    (KeyCode::RIGHT, &["Right"]),
    (KeyCode::DOWN, &["Down"]),
    (KeyCode::PAGE_UP, &["PgUp", "PageUp"]),
    (KeyCode::PAGE_DOWN, &["PgDown", "PageDown"]),
    (KeyCode::SHIFT, &["Shift"]),
    (KeyCode::CONTROL, &["Control"]),
    (KeyCode::META, &["Meta"]),
    (KeyCode::ALT, &["Alt"]),
    (KeyCode::CAPS_LOCK, &["CapsLock"]),
    (KeyCode::NUM_LOCK, &["NumLock"]),
    (KeyCode::SCROLL_LOCK, &["ScrollLock"]),
    (KeyCode::MENU, &["Menu"]),
    (KeyCode::UNKNOWN, &["Unknown"]),
];

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((_, names)) = KEY_NAMES.iter().find(|(code, _)| code == self) {
            return f.write_str(names[0]);
        }
        if let Some(n) = self.function_index() {
            return write!(f, "F{n}");
        }
        // `|` separates fields in persisted bindings.
        match char::from_u32(self.0) {
            Some(c) if !c.is_control() && !c.is_whitespace() && c != '|' => write!(f, "{c}"),
            _ => write!(f, "0x{:X}", self.0),
        }
    }
}

impl FromStr for KeyCode {
    type Err = ParseKeySequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((code, _)) = KEY_NAMES
            .iter()
            .find(|(_, names)| names.iter().any(|n| n.eq_ignore_ascii_case(s)))
        {
            return Ok(*code);
        }

        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::from_char(c));
        }

        if let Some(n) = s
            .strip_prefix(['F', 'f'])
            .and_then(|rest| rest.parse::<u8>().ok())
            .and_then(KeyCode::function)
        {
            return Ok(n);
        }

        if let Some(hex) = s.strip_prefix("0x")
            && let Ok(v) = u32::from_str_radix(hex, 16)
        {
            return Ok(KeyCode(v));
        }

        Err(ParseKeySequenceError::UnknownKey(s.to_string()))
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
        const KEYPAD = 1 << 4;
    }
}

// Canonical text order.
const MODIFIER_NAMES: &[(Modifiers, &str)] = &[
    (Modifiers::CTRL, "Ctrl"),
    (Modifiers::ALT, "Alt"),
    (Modifiers::SHIFT, "Shift"),
    (Modifiers::META, "Meta"),
    (Modifiers::KEYPAD, "Num"),
];

impl Modifiers {
    /// Case-insensitive, with `Control`, `Cmd`, `Super`, `Win` and `Option` aliases.
    pub fn parse_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some((m, _)) = MODIFIER_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
        {
            return Some(*m);
        }
        match name.to_ascii_lowercase().as_str() {
            "control" => Some(Modifiers::CTRL),
            "cmd" | "super" | "win" => Some(Modifiers::META),
            "option" => Some(Modifiers::ALT),
            _ => None,
        }
    }
}

/// One key plus the modifiers held with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl KeyChord {
    pub fn new(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, key }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (m, name) in MODIFIER_NAMES {
            if self.modifiers.contains(*m) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyChord {
    type Err = ParseKeySequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseKeySequenceError::EmptyChord);
        }

        let (mods, key) = if s == "+" {
            ("", "+")
        } else if let Some(mods) = s.strip_suffix("++") {
            (mods, "+")
        } else {
            s.rsplit_once('+').unwrap_or(("", s))
        };
        if key.is_empty() {
            return Err(ParseKeySequenceError::EmptyChord);
        }

        let mut modifiers = Modifiers::empty();
        if !mods.is_empty() {
            for token in mods.split('+') {
                modifiers |= Modifiers::parse_name(token)
                    .ok_or_else(|| ParseKeySequenceError::UnknownModifier(token.to_string()))?;
            }
        }

        Ok(KeyChord {
            modifiers,
            key: key.parse()?,
        })
    }
}

/// Up to [`KeySequence::MAX_CHORDS`] chords pressed one after another. The
/// empty sequence means "no binding".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeySequence(SmallVec<[KeyChord; 4]>);

impl KeySequence {
    pub const MAX_CHORDS: usize = 4;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(modifiers: Modifiers, key: KeyCode) -> Self {
        let mut chords = SmallVec::new();
        chords.push(KeyChord::new(modifiers, key));
        Self(chords)
    }

    pub fn from_chords(
        chords: impl IntoIterator<Item = KeyChord>,
    ) -> Result<Self, ParseKeySequenceError> {
        let chords: SmallVec<[KeyChord; 4]> = chords.into_iter().collect();
        if chords.len() > Self::MAX_CHORDS {
            return Err(ParseKeySequenceError::TooManyChords(chords.len()));
        }
        Ok(Self(chords))
    }

    pub fn chords(&self) -> &[KeyChord] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<KeyChord> for KeySequence {
    fn from(chord: KeyChord) -> Self {
        Self::single(chord.modifiers, chord.key)
    }
}

impl From<KeyCode> for KeySequence {
    fn from(key: KeyCode) -> Self {
        Self::single(Modifiers::empty(), key)
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

impl FromStr for KeySequence {
    type Err = ParseKeySequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        let chords = s
            .split(", ")
            .map(str::parse::<KeyChord>)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_chords(chords)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for KeySequence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for KeySequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_display_uses_canonical_modifier_order() {
        let chord = KeyChord::new(Modifiers::SHIFT | Modifiers::CTRL, KeyCode::W);
        assert_eq!(chord.to_string(), "Ctrl+Shift+W");
    }

    #[test]
    fn test_parse_plus_key() {
        let seq: KeySequence = "Ctrl++".parse().unwrap();
        assert_eq!(seq.chords(), &[KeyChord::new(Modifiers::CTRL, KeyCode::PLUS)]);
        assert_eq!(seq.to_string(), "Ctrl++");

        let bare: KeySequence = "+".parse().unwrap();
        assert_eq!(bare.chords()[0].key, KeyCode::PLUS);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_aliases() {
        let seq: KeySequence = "control+shift+escape".parse().unwrap();
        assert_eq!(
            seq.chords(),
            &[KeyChord::new(Modifiers::CTRL | Modifiers::SHIFT, KeyCode::ESCAPE)]
        );
        assert_eq!(seq.to_string(), "Ctrl+Shift+Esc");
    }

    #[test]
    fn test_multi_chord_sequence() {
        let seq: KeySequence = "Ctrl+K, Ctrl+,".parse().unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.chords()[1], KeyChord::new(Modifiers::CTRL, KeyCode::COMMA));
        assert_eq!(seq.to_string(), "Ctrl+K, Ctrl+,");
    }

    #[test]
    fn test_function_and_hex_keys() {
        assert_eq!("F5".parse::<KeyCode>().unwrap(), KeyCode::function(5).unwrap());
        assert_eq!(KeyCode::function(12).unwrap(), KeyCode::F12);
        assert_eq!(KeyCode::function(13), None);
        assert_eq!(KeyCode(0x0100_0099).to_string(), "0x1000099");
        assert_eq!("0x1000099".parse::<KeyCode>().unwrap(), KeyCode(0x0100_0099));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "Hyper+A".parse::<KeySequence>(),
            Err(ParseKeySequenceError::UnknownModifier("Hyper".into()))
        );
        assert_eq!(
            "Ctrl+".parse::<KeySequence>(),
            Err(ParseKeySequenceError::EmptyChord)
        );
        assert_eq!(
            "A, B, C, D, E".parse::<KeySequence>(),
            Err(ParseKeySequenceError::TooManyChords(5))
        );
        assert_eq!("".parse::<KeySequence>(), Ok(KeySequence::new()));
    }

    #[test]
    fn test_letters_fold_to_upper_case() {
        assert_eq!(KeyCode::from_char('w'), KeyCode::W);
        assert_eq!("w".parse::<KeyCode>().unwrap(), KeyCode::W);
    }

    #[test]
    fn test_bar_key_is_written_in_hex() {
        assert_eq!(KeyCode::BAR.to_string(), "0x7C");
        let seq = KeySequence::single(Modifiers::CTRL, KeyCode::BAR);
        assert_eq!(seq.to_string(), "Ctrl+0x7C");
        assert_eq!(seq.to_string().parse::<KeySequence>(), Ok(seq));
        assert_eq!("|".parse::<KeyCode>().unwrap(), KeyCode::BAR);
    }

    #[test]
    fn test_modifier_names_and_aliases() {
        assert_eq!(Modifiers::parse_name(" ctrl "), Some(Modifiers::CTRL));
        assert_eq!(Modifiers::parse_name("Cmd"), Some(Modifiers::META));
        assert_eq!(Modifiers::parse_name("Num"), Some(Modifiers::KEYPAD));
        assert_eq!(Modifiers::parse_name("Hyper"), None);
    }
}
