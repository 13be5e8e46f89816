//! Card decoration: background color, emphasis marker and the injected
//! controls.

use std::rc::Rc;

use log::{debug, warn};

use crate::board::codec::{parse_block, CodecError};
use crate::board::palette::{same_color, AVAILABLE_COLORS};
use crate::board::CardConfig;
use crate::host::{CardNode, Host, SaveCallback};
use crate::save::SaveCoordinator;

pub const EMPHASIZE_CLASS: &str = "lifeboat--emphasize";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("card {card}: {source}")]
    Metadata {
        card: String,
        #[source]
        source: CodecError,
    },
}

/// The controls installed on one card, each carrying the config its click
/// saves.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub picker_icon: Option<String>,
    /// "Remove color" first, then one per palette entry.
    pub swatches: Vec<Swatch>,
    pub emphasize: Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub title: String,
    /// CSS fill of the swatch. `None` for the "Remove color" swatch.
    pub fill: Option<String>,
    pub next: CardConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    pub title: String,
    pub active: bool,
    pub next: CardConfig,
}

impl Controls {
    pub fn for_config(config: Option<&CardConfig>, picker_icon: Option<String>) -> Self {
        let base = config.cloned().unwrap_or_default();

        let mut swatches = Vec::with_capacity(AVAILABLE_COLORS.len() + 1);
        swatches.push(Swatch {
            title: "Remove color".to_string(),
            fill: None,
            next: base.without_color(),
        });
        for option in AVAILABLE_COLORS {
            let css = option.css();
            swatches.push(Swatch {
                title: option.name.to_string(),
                next: base.with_color(css.clone()),
                fill: Some(css),
            });
        }

        Self {
            picker_icon,
            swatches,
            emphasize: Toggle {
                title: "Toggle emphasizing of this card".to_string(),
                active: base.is_emphasized(),
                next: base.with_emphasis_toggled(),
            },
        }
    }
}

pub struct Renderer<H: Host> {
    host: Rc<H>,
    saves: Rc<SaveCoordinator<H>>,
    picker_icon: Option<String>,
}

impl<H: Host> Renderer<H> {
    pub fn new(host: Rc<H>, saves: Rc<SaveCoordinator<H>>, picker_icon: Option<String>) -> Self {
        Self {
            host,
            saves,
            picker_icon,
        }
    }

    /// Apply the card's stored config and reinstall its controls.
    ///
    /// Metadata that fails to decode leaves the card untouched.
    pub fn render(&self, card: &H::Card) -> Result<Option<CardConfig>, RenderError> {
        let config = card
            .metadata_text()
            .map(|text| parse_block(&text))
            .transpose()
            .map_err(|source| RenderError::Metadata {
                card: card.card_id().unwrap_or_else(|| "<no id>".to_string()),
                source,
            })?;

        let color = config
            .as_ref()
            .and_then(|c| c.color.as_deref())
            .filter(|c| !c.trim().is_empty());
        if let Some(color) = color {
            if same_color(&card.background(), color) {
                debug!("card {:?} already has background {color}", card.card_id());
            } else {
                card.set_background(color);
            }
        }
        card.set_emphasized(config.as_ref().is_some_and(CardConfig::is_emphasized));

        let controls = Controls::for_config(config.as_ref(), self.picker_icon.clone());
        card.install_controls(&controls, self.save_callback(card));
        Ok(config)
    }

    fn save_callback(&self, card: &H::Card) -> SaveCallback {
        let host = Rc::clone(&self.host);
        let saves = Rc::clone(&self.saves);
        let card = card.clone();
        Rc::new(move |config: CardConfig| {
            let saves = Rc::clone(&saves);
            let card = card.clone();
            host.spawn(Box::pin(async move {
                if let Err(e) = saves.save(&card, config).await {
                    warn!("could not save lifeboat config: {e}");
                }
            }));
        })
    }
}
