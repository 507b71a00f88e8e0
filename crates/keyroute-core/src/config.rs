use std::path::Path;

use ini::{EscapePolicy, Ini, WriteOption};

use crate::error::InputError;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DispatcherConfig {
    pub top_level_name: String,
    /// Only shown in diagnostics; the top-level context always runs first.
    pub top_level_priority: i32,
    /// Config section holding the key bindings.
    pub binding_section: String,
    /// Bindings are stored as `<prefix><index>=<name>|<sequence>`.
    pub binding_key_prefix: String,
    /// Release all held keys and buttons on ticks where the window is inactive.
    pub release_input_on_focus_loss: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            top_level_name: "TopLevel".into(),
            top_level_priority: 100_000,
            binding_section: "input".into(),
            binding_key_prefix: "keybinding".into(),
            release_input_on_focus_loss: true,
        }
    }
}

/// Sectioned string key/value storage.
pub trait ConfigStore {
    fn get(&self, section: &str, key: &str) -> Option<String>;
    fn set(&mut self, section: &str, key: &str, value: &str);
    fn remove(&mut self, section: &str, key: &str) -> bool;
}

/// INI file store backed by `rust-ini`. The empty section name maps to the
/// general section. Values are written with reserved characters escaped so
/// that `;`, `#`, `=` and `\` in key sequences survive a reload.
pub struct IniConfig {
    ini: Ini,
}

impl Default for IniConfig {
    fn default() -> Self {
        Self { ini: Ini::new() }
    }
}

fn section(name: &str) -> Option<&str> {
    (!name.is_empty()).then_some(name)
}

fn write_option() -> WriteOption {
    WriteOption {
        escape_policy: EscapePolicy::Reserved,
        ..Default::default()
    }
}

impl IniConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, InputError> {
        let ini = Ini::load_from_str(text)?;
        Ok(Self { ini })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|source| InputError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("read input config {}", path.display());
        Ok(Self { ini })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), InputError> {
        let path = path.as_ref();
        self.ini
            .write_to_file_opt(path, write_option())
            .map_err(|source| InputError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn to_ini_string(&self) -> String {
        let mut out = Vec::new();
        if let Err(e) = self.ini.write_to_opt(&mut out, write_option()) {
            log::error!("failed to format input config: {e}");
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    pub fn ini(&self) -> &Ini {
        &self.ini
    }
}

impl From<Ini> for IniConfig {
    fn from(ini: Ini) -> Self {
        Self { ini }
    }
}

impl ConfigStore for IniConfig {
    fn get(&self, section_name: &str, key: &str) -> Option<String> {
        self.ini
            .get_from(section(section_name), key)
            .map(str::to_string)
    }

    fn set(&mut self, section_name: &str, key: &str, value: &str) {
        self.ini
            .set_to(section(section_name), key.to_string(), value.to_string());
    }

    fn remove(&mut self, section_name: &str, key: &str) -> bool {
        self.ini.delete_from(section(section_name), key).is_some()
    }
}
