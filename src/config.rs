use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Everything the content script needs to know about the host page.
///
/// Every field has a default matching the board the script targets, so an
/// override file only lists what differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub timing: Timing,
    /// URL of the color picker icon, resolved by the extension loader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picker_icon: Option<String>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// CSS selectors into the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selectors {
    #[serde(default = "default_card")]
    pub card: String,
    /// Containers that receive new cards.
    #[serde(default = "default_column")]
    pub column: String,
    /// Rendered form of the note's fenced block.
    #[serde(default = "default_metadata")]
    pub metadata: String,
    /// Element inside a card that hosts the injected controls.
    #[serde(default = "default_controls")]
    pub controls: String,
    #[serde(default = "default_edit_button")]
    pub edit_button: String,
    #[serde(default = "default_dialog")]
    pub dialog: String,
    #[serde(default = "default_note_textarea")]
    pub note_textarea: String,
    #[serde(default = "default_submit")]
    pub submit: String,
    /// Class put on `<body>` while a save runs.
    #[serde(default = "default_mask_class")]
    pub mask_class: String,
}

fn default_card() -> String {
    "article".to_string()
}
fn default_column() -> String {
    ".js-project-column-cards".to_string()
}
fn default_metadata() -> String {
    "pre[lang='lifeboat']".to_string()
}
fn default_controls() -> String {
    ".d-flex .pl-5".to_string()
}
fn default_edit_button() -> String {
    "details-menu button[data-dialog-id*='edit-note']".to_string()
}
fn default_dialog() -> String {
    "details-dialog".to_string()
}
fn default_note_textarea() -> String {
    "textarea#card_note_text".to_string()
}
fn default_submit() -> String {
    "button[type=\"submit\"]".to_string()
}
fn default_mask_class() -> String {
    "hide-dialog".to_string()
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            card: default_card(),
            column: default_column(),
            metadata: default_metadata(),
            controls: default_controls(),
            edit_button: default_edit_button(),
            dialog: default_dialog(),
            note_textarea: default_note_textarea(),
            submit: default_submit(),
            mask_class: default_mask_class(),
        }
    }
}

impl Selectors {
    /// Selector for the note form of one card.
    pub fn note_form(&self, card_id: &str) -> String {
        let escaped = card_id.replace('\\', "\\\\").replace('\'', "\\'");
        format!("form[data-card-id='{escaped}']")
    }
}

/// Delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Wait after load before the first scan; the board renders late.
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// How long a save waits for the edit dialog to appear.
    #[serde(default = "default_dialog_timeout_ms")]
    pub dialog_timeout_ms: u64,
    /// How long the mask stays on after submitting, covering the host's
    /// save and re-render.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_startup_delay_ms() -> u64 {
    1000
}
fn default_dialog_timeout_ms() -> u64 {
    5000
}
fn default_settle_delay_ms() -> u64 {
    700
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            dialog_timeout_ms: default_dialog_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl Timing {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn dialog_timeout(&self) -> Duration {
        Duration::from_millis(self.dialog_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
