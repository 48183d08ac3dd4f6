use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-key margins in pixels: top, right, bottom, left.
pub type Margins = [u32; 4];

/// Flush margins for a released key.
pub const MARGINS_FLUSH: Margins = [0, 0, 0, 0];

/// Inset margins while a key is held, shrinking the image so the key reads
/// as depressed.
pub const MARGINS_PRESSED: Margins = [10, 10, 10, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Image content for one key. Opaque to the coordinator: only a [`Surface`]
/// implementation decodes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline SVG markup.
    Svg(String),
    /// Path to a raster image on disk.
    File(PathBuf),
}

impl ImageSource {
    /// Interpret a config string: inline SVG markup if it looks like SVG,
    /// a file path otherwise.
    pub fn from_config(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.starts_with("<svg") && trimmed.ends_with("</svg>") {
            ImageSource::Svg(trimmed.to_string())
        } else {
            ImageSource::File(PathBuf::from(value))
        }
    }
}

/// Displayable state of one key: what its handler currently wants shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVisual {
    /// Multi-line label drawn over the image. Empty means no text.
    pub title: String,
    pub image: Option<ImageSource>,
    pub background: String,
    pub highlight_color: String,
    pub vertical_alignment: VerticalAlignment,
    pub margins: Margins,
}

impl Default for KeyVisual {
    fn default() -> Self {
        Self {
            title: String::new(),
            image: None,
            background: "black".into(),
            highlight_color: "yellow".into(),
            vertical_alignment: VerticalAlignment::Center,
            margins: MARGINS_FLUSH,
        }
    }
}

impl KeyVisual {
    /// Nothing to draw: no title and no image.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.image.is_none()
    }
}

/// Rendering target for the physical keys.
///
/// Implementations own image decode/scale and the vendor wire protocol.
/// Calls are idempotent and safe at high frequency; a failed render leaves
/// the previous image on the key.
pub trait Surface: Send + Sync {
    /// Composite `visual` onto the given key. `margins` override the
    /// visual's own margins (used to inset the image while a key is held).
    fn render(&self, key: usize, visual: &KeyVisual, margins: Margins) -> Result<()>;

    /// Set panel brightness, 0-100.
    fn set_brightness(&self, level: u8) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_from_config_detects_inline_svg() {
        let img = ImageSource::from_config("<svg width=\"10\"></svg>");
        assert!(matches!(img, ImageSource::Svg(_)));
    }

    #[test]
    fn image_from_config_treats_other_strings_as_paths() {
        let img = ImageSource::from_config("./assets/btc.png");
        assert_eq!(img, ImageSource::File(PathBuf::from("./assets/btc.png")));
    }

    #[test]
    fn image_from_config_ignores_surrounding_whitespace() {
        let img = ImageSource::from_config("  <svg></svg>\n");
        assert!(matches!(img, ImageSource::Svg(_)));
    }

    #[test]
    fn default_visual_is_empty() {
        let visual = KeyVisual::default();
        assert!(visual.is_empty());
        assert_eq!(visual.background, "black");
        assert_eq!(visual.highlight_color, "yellow");
        assert_eq!(visual.margins, MARGINS_FLUSH);
    }

    #[test]
    fn visual_with_title_is_not_empty() {
        let visual = KeyVisual {
            title: "BTC".into(),
            ..KeyVisual::default()
        };
        assert!(!visual.is_empty());
    }
}
