use crate::surface::{ImageSource, KeyVisual};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub input: InputConfig,
    /// `[[scene]]` tables, in display order. Empty means the built-in
    /// default scene.
    #[serde(default, rename = "scene")]
    pub scenes: Vec<SceneConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Two releases of the same key within this window make a double-click;
    /// a single release waits this long before it counts as a plain click.
    #[serde(default = "GeneralConfig::default_double_click")]
    pub double_click_ms: u64,
    /// A key held this long fires a long-press instead of a click.
    #[serde(default = "GeneralConfig::default_long_press")]
    pub long_press_ms: u64,
    /// Panel brightness at startup, 0-100.
    #[serde(default = "GeneralConfig::default_brightness")]
    pub brightness: u8,
    /// Number of physical keys on the control surface.
    #[serde(default = "GeneralConfig::default_keys")]
    pub keys: usize,
}

impl GeneralConfig {
    fn default_double_click() -> u64 {
        300
    }
    fn default_long_press() -> u64 {
        1000
    }
    fn default_brightness() -> u8 {
        60
    }
    fn default_keys() -> usize {
        4
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 300,
            long_press_ms: 1000,
            brightness: 60,
            keys: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Event device of the key matrix. Auto-detected when absent.
    #[serde(default)]
    pub device: Option<PathBuf>,
    /// Event codes mapped to key indices 0..N, in order. Defaults to the
    /// digit row codes 1..=4 emitted by common macro pads.
    #[serde(default = "InputConfig::default_keycodes")]
    pub keycodes: Vec<u16>,
}

impl InputConfig {
    fn default_keycodes() -> Vec<u16> {
        // KEY_1..KEY_4 from input-event-codes.h
        vec![2, 3, 4, 5]
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device: None,
            keycodes: Self::default_keycodes(),
        }
    }
}

/// One page of key-to-handler bindings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SceneConfig {
    #[serde(default)]
    pub keys: Vec<HandlerConfig>,
}

/// Configuration for a single key handler. `type` names an entry in the
/// handler registry; the remaining fields are read by whichever factory
/// needs them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Inline SVG markup or a file path.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub highlight_color: Option<String>,
    /// Page handler: switch backwards instead of forwards.
    #[serde(default)]
    pub prev: Option<bool>,
    /// Brightness handler: step size per click.
    #[serde(default)]
    pub step: Option<u8>,
}

impl HandlerConfig {
    pub fn named(kind: &str) -> Self {
        Self {
            kind: kind.into(),
            title: None,
            image: None,
            interval_ms: None,
            background: None,
            highlight_color: None,
            prev: None,
            step: None,
        }
    }

    /// Polling interval for handlers that refresh themselves.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(3000))
    }

    /// Initial visual built from the configured fields.
    pub fn visual(&self) -> KeyVisual {
        let mut visual = KeyVisual::default();
        if let Some(title) = &self.title {
            visual.title = title.clone();
        }
        if let Some(image) = &self.image {
            visual.image = Some(ImageSource::from_config(image));
        }
        if let Some(background) = &self.background {
            visual.background = background.clone();
        }
        if let Some(highlight) = &self.highlight_color {
            visual.highlight_color = highlight.clone();
        }
        visual
    }
}

impl Config {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("deckd")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "parsing config TOML")
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.general.double_click_ms)
    }

    pub fn long_press_interval(&self) -> Duration {
        Duration::from_millis(self.general.long_press_ms)
    }

    /// Configured scenes, or the built-in demo scene when none are set.
    pub fn scenes_or_default(&self) -> Vec<SceneConfig> {
        if !self.scenes.is_empty() {
            return self.scenes.clone();
        }
        let mut uptime = HandlerConfig::named("uptime");
        uptime.interval_ms = Some(1000);
        let mut clock = HandlerConfig::named("clock");
        clock.interval_ms = Some(1000);
        let mut prev_page = HandlerConfig::named("page");
        prev_page.prev = Some(true);
        vec![SceneConfig {
            keys: vec![
                clock,
                uptime,
                HandlerConfig::named("brightness"),
                prev_page,
            ],
        }]
    }
}

pub fn socket_path() -> PathBuf {
    // DECKD_SOCK env var overrides for testing.
    // Default: /run/deckd/deckd.sock (created by RuntimeDirectory=deckd in systemd).
    if let Ok(path) = std::env::var("DECKD_SOCK") {
        return PathBuf::from(path);
    }
    PathBuf::from("/run/deckd/deckd.sock")
}
