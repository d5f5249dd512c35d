use std::path::PathBuf;

#[cfg(feature = "save")]
const STORAGE_KEY: &str = "midi-tap.settings";

/// User choices persisted between runs.
#[cfg_attr(feature = "save", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "save", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Display names of the devices selected for input 1 & 2.
    pub ins: [Option<String>; 2],
    /// Display names of the devices selected for output 1 & 2.
    pub outs: [Option<String>; 2],
    pub auto_scroll: bool,
    pub save_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ins: [None, None],
            outs: [None, None],
            auto_scroll: true,
            save_dir: None,
        }
    }
}

#[cfg(feature = "save")]
impl Settings {
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        storage
            .and_then(|storage| storage.get_string(STORAGE_KEY))
            .and_then(|text| Self::from_ron(&text))
            .unwrap_or_default()
    }

    pub fn store(&self, storage: &mut dyn eframe::Storage) {
        match ron::to_string(self) {
            Ok(text) => storage.set_string(STORAGE_KEY, text),
            Err(err) => log::error!("Couldn't serialize settings: {}", err),
        }
    }

    fn from_ron(text: &str) -> Option<Self> {
        ron::from_str(text)
            .map_err(|err| log::warn!("Ignoring invalid settings: {}", err))
            .ok()
    }
}

#[cfg(not(feature = "save"))]
impl Settings {
    pub fn load(_storage: Option<&dyn eframe::Storage>) -> Self {
        Self::default()
    }
}

#[cfg(all(test, feature = "save"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = Settings::from_ron(r#"(ins: (Some("Keyboard"), None))"#).unwrap();
        assert_eq!(settings.ins, [Some("Keyboard".to_string()), None]);
        assert_eq!(settings.outs, [None, None]);
        assert!(settings.auto_scroll);
    }

    #[test]
    fn invalid_text_is_ignored() {
        assert!(Settings::from_ron("not ron at all {").is_none());
    }

    #[test]
    fn stored_text_is_read_back() {
        let settings = Settings {
            outs: [None, Some("Synth (2)".to_string())],
            auto_scroll: false,
            ..Default::default()
        };

        let text = ron::to_string(&settings).unwrap();
        assert_eq!(Settings::from_ron(&text), Some(settings));
    }
}
