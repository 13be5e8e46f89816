pub mod codec;
pub mod palette;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-card metadata stored in the card's note.
///
/// Reconstructed from the note text on every render; nothing caches it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    /// CSS background color (`#rrggbb` or `rgb(r,g,b)`). `None` = no override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Whether the card carries the emphasis marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasize: Option<bool>,
    /// Members this version does not know about, kept in their original order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardConfig {
    pub fn is_emphasized(&self) -> bool {
        self.emphasize == Some(true)
    }

    /// Drop known fields holding falsy values (`""`, `false`).
    pub fn normalized(&self) -> Self {
        Self {
            color: self.color.clone().filter(|c| !c.trim().is_empty()),
            emphasize: self.emphasize.filter(|&e| e),
            extra: self.extra.clone(),
        }
    }

    /// True when the normalized config has no keys, i.e. it encodes to nothing.
    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.color.is_none() && n.emphasize.is_none() && n.extra.is_empty()
    }

    pub fn with_color(&self, color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..self.clone()
        }
    }

    pub fn without_color(&self) -> Self {
        Self {
            color: None,
            ..self.clone()
        }
    }

    /// Flip emphasis. Turning it off removes the key instead of storing `false`.
    pub fn with_emphasis_toggled(&self) -> Self {
        Self {
            emphasize: if self.is_emphasized() { None } else { Some(true) },
            ..self.clone()
        }
    }
}

/// An entry of the color picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub name: &'static str,
    /// Six hex digits, no leading `#`.
    pub hex: &'static str,
    pub rgb: [u8; 3],
}

impl ColorOption {
    /// The persisted CSS form, e.g. `rgb(255,173,173)`.
    pub fn css(&self) -> String {
        palette::rgb_css(self.rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty() {
        assert!(CardConfig::default().is_empty());
    }

    #[test]
    fn test_falsy_fields_count_as_empty() {
        let config = CardConfig {
            color: Some(String::new()),
            emphasize: Some(false),
            extra: Map::new(),
        };
        assert!(config.is_empty());
        assert_eq!(config.normalized(), CardConfig::default());
    }

    #[test]
    fn test_unknown_members_make_config_non_empty() {
        let mut extra = Map::new();
        extra.insert("pinned".into(), json!(true));
        let config = CardConfig {
            extra,
            ..Default::default()
        };
        assert!(!config.is_empty());
    }

    #[test]
    fn test_with_color_keeps_emphasis() {
        let base = CardConfig {
            emphasize: Some(true),
            ..Default::default()
        };
        let next = base.with_color("rgb(1,2,3)");
        assert_eq!(next.color.as_deref(), Some("rgb(1,2,3)"));
        assert!(next.is_emphasized());

        let cleared = next.without_color();
        assert_eq!(cleared.color, None);
        assert!(cleared.is_emphasized());
    }

    #[test]
    fn test_emphasis_toggle_off_removes_key() {
        let on = CardConfig::default().with_emphasis_toggled();
        assert_eq!(on.emphasize, Some(true));
        let off = on.with_emphasis_toggled();
        assert_eq!(off.emphasize, None);
        assert!(off.is_empty());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let config = CardConfig {
            color: Some("rgb(255,173,173)".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"color":"rgb(255,173,173)"}"#
        );
    }

    #[test]
    fn test_color_option_css() {
        let option = ColorOption {
            name: "Light Pink",
            hex: "ffadad",
            rgb: [255, 173, 173],
        };
        assert_eq!(option.css(), "rgb(255,173,173)");
    }
}
