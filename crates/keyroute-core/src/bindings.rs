//! Named actions mapped to key sequences.
//!
//! Persisted form, one config key per binding inside a section:
//! `keybinding<N>=<ActionName>|<KeySequence>`. Loading stops at the first
//! index that is missing or does not split into exactly two fields.

use std::collections::BTreeMap;

use crate::config::ConfigStore;
use crate::keys::KeySequence;

/// Action names conventionally use `category.name`, e.g. `Avatar.WalkForward`.
/// Names must not contain `|`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBindings {
    map: BTreeMap<String, KeySequence>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, action: impl Into<String>, sequence: KeySequence) {
        self.map.insert(action.into(), sequence);
    }

    /// Empty sequence when the action is unbound.
    pub fn get(&self, action: &str) -> KeySequence {
        self.map.get(action).cloned().unwrap_or_default()
    }

    /// Registers `default` for the action if it has no binding yet.
    pub fn get_or_insert(&mut self, action: &str, default: KeySequence) -> KeySequence {
        self.map
            .entry(action.to_string())
            .or_insert(default)
            .clone()
    }

    pub fn remove(&mut self, action: &str) -> Option<KeySequence> {
        self.map.remove(action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeySequence)> + '_ {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Merges stored bindings into `self`. Returns how many were read.
    pub fn load(&mut self, store: &dyn ConfigStore, section: &str, prefix: &str) -> usize {
        let mut loaded = 0;
        for i in 0.. {
            let Some(value) = store.get(section, &format!("{prefix}{i}")) else {
                break;
            };
            let fields: Vec<&str> = value.split('|').collect();
            let [action, sequence] = fields[..] else {
                log::debug!("stopping key binding load at {prefix}{i}: {value:?}");
                break;
            };
            match sequence.parse::<KeySequence>() {
                Ok(seq) => {
                    self.set(action, seq);
                    loaded += 1;
                }
                Err(e) => log::warn!("ignoring key binding {action:?}: {e}"),
            }
        }
        loaded
    }

    /// Writes every binding in name order and drops leftover higher indices.
    pub fn save(&self, store: &mut dyn ConfigStore, section: &str, prefix: &str) {
        for (i, (action, sequence)) in self.map.iter().enumerate() {
            store.set(section, &format!("{prefix}{i}"), &format!("{action}|{sequence}"));
        }
        let mut stale = self.map.len();
        while store.remove(section, &format!("{prefix}{stale}")) {
            stale += 1;
        }
    }
}

impl FromIterator<(String, KeySequence)> for KeyBindings {
    fn from_iter<I: IntoIterator<Item = (String, KeySequence)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IniConfig;
    use crate::keys::{KeyCode, Modifiers};

    fn seq(s: &str) -> KeySequence {
        s.parse().unwrap()
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut bindings = KeyBindings::new();
        bindings.set("Avatar.WalkForward", seq("W"));
        bindings.set("Camera.ZoomIn", seq("Ctrl++"));
        bindings.set("Editor.Save.All", seq("Ctrl+Shift+S, Ctrl+K"));
        bindings.set("Console.Toggle", seq("F1"));

        let mut store = IniConfig::new();
        bindings.save(&mut store, "input", "keybinding");
        assert_eq!(
            store.get("input", "keybinding1").as_deref(),
            Some("Camera.ZoomIn|Ctrl++")
        );

        let text = store.to_ini_string();
        let reread = IniConfig::parse(&text).unwrap();
        let mut loaded = KeyBindings::new();
        assert_eq!(loaded.load(&reread, "input", "keybinding"), 4);
        assert_eq!(loaded, bindings);

        let mut store_again = IniConfig::new();
        loaded.save(&mut store_again, "input", "keybinding");
        assert_eq!(store_again.to_ini_string(), text);
    }

    #[test]
    fn test_bar_and_comma_keys_round_trip() {
        let mut bindings = KeyBindings::new();
        bindings.set("Edit.Comma", seq(",, A"));
        bindings.set("Edit.Pipe", KeySequence::from(KeyCode::BAR));
        bindings.set("Edit.Semicolon", seq("Ctrl+;"));

        let mut store = IniConfig::new();
        bindings.save(&mut store, "input", "keybinding");
        assert_eq!(
            store.get("input", "keybinding1").as_deref(),
            Some("Edit.Pipe|0x7C")
        );

        let reread = IniConfig::parse(&store.to_ini_string()).unwrap();
        let mut loaded = KeyBindings::new();
        assert_eq!(loaded.load(&reread, "input", "keybinding"), 3);
        assert_eq!(loaded, bindings);
    }

    #[test]
    fn test_load_stops_at_malformed_entry() {
        let store = IniConfig::parse(
            "[input]\nkeybinding0=A.B|W\nkeybinding1=broken\nkeybinding2=C.D|S\n",
        )
        .unwrap();
        let mut bindings = KeyBindings::new();
        assert_eq!(bindings.load(&store, "input", "keybinding"), 1);
        assert_eq!(bindings.get("A.B"), KeySequence::from(KeyCode::W));
        assert!(bindings.get("C.D").is_empty());
    }

    #[test]
    fn test_load_skips_unparsable_sequence() {
        let store =
            IniConfig::parse("[input]\nkeybinding0=A.B|Hyper+W\nkeybinding1=C.D|S\n").unwrap();
        let mut bindings = KeyBindings::new();
        assert_eq!(bindings.load(&store, "input", "keybinding"), 1);
        assert_eq!(bindings.get("C.D"), KeySequence::from(KeyCode::S));
    }

    #[test]
    fn test_save_removes_stale_entries() {
        let mut store = IniConfig::new();
        let mut bindings = KeyBindings::new();
        bindings.set("a", seq("A"));
        bindings.set("b", seq("B"));
        bindings.set("c", seq("C"));
        bindings.save(&mut store, "input", "keybinding");

        bindings.remove("b");
        bindings.save(&mut store, "input", "keybinding");
        assert_eq!(store.get("input", "keybinding2"), None);

        let mut loaded = KeyBindings::new();
        loaded.load(&store, "input", "keybinding");
        assert_eq!(loaded, bindings);
    }

    #[test]
    fn test_get_or_insert_registers_default() {
        let mut bindings = KeyBindings::new();
        let default = KeySequence::single(Modifiers::ALT, KeyCode::ENTER);
        assert_eq!(bindings.get_or_insert("View.Fullscreen", default.clone()), default);
        assert_eq!(
            bindings.get_or_insert("View.Fullscreen", seq("F11")),
            default
        );
        assert_eq!(bindings.get("Missing"), KeySequence::new());
    }
}
