//! Writing a card's config back through the host page's own note editor.
//!
//! A save opens the card's edit dialog, rewrites the note textarea and
//! submits it, while the page mask hides the dialog from the user:
//!
//! ```text
//! Idle -> DialogRequested -> DialogOpen -> FormSubmitted -> Settled
//! ```
//!
//! Each save holds a request token for its card. The token keeps the card
//! in the ledger (a second save for that card is rejected) and holds one
//! reference on the page mask. Dropping it, on success, on error or when the
//! save future is dropped, releases both.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{select, Either};
use futures::stream::LocalBoxStream;
use futures::{pin_mut, StreamExt};
use log::{debug, trace};

use crate::board::codec::{self, CodecError};
use crate::board::CardConfig;
use crate::config::Timing;
use crate::host::{CardNode, Host, NoteForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    DialogRequested,
    DialogOpen,
    FormSubmitted,
    Settled,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("card has no data-card-id attribute")]
    MissingCardId,
    #[error("a save for card {0} is already in progress")]
    InFlight(String),
    #[error("card {0} has no edit-note control")]
    NoEditControl(String),
    #[error("edit dialog for card {card_id} did not appear within {timeout:?}")]
    DialogTimeout { card_id: String, timeout: Duration },
    #[error("page stopped reporting insertions before the dialog for card {0} appeared")]
    WatchClosed(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Default)]
struct Ledger {
    requests: HashMap<String, SaveState>,
    /// Tokens currently holding the mask.
    masks: usize,
}

pub struct SaveCoordinator<H: Host> {
    host: Rc<H>,
    timing: Timing,
    ledger: Rc<RefCell<Ledger>>,
}

impl<H: Host> SaveCoordinator<H> {
    pub fn new(host: Rc<H>, timing: Timing) -> Self {
        Self {
            host,
            timing,
            ledger: Rc::new(RefCell::new(Ledger::default())),
        }
    }

    /// Where the save for `card_id` currently is.
    pub fn state(&self, card_id: &str) -> SaveState {
        self.ledger
            .borrow()
            .requests
            .get(card_id)
            .copied()
            .unwrap_or(SaveState::Idle)
    }

    /// Number of saves in progress.
    pub fn in_flight(&self) -> usize {
        self.ledger.borrow().requests.len()
    }

    /// Store `config` in the note of `card`.
    pub async fn save(&self, card: &H::Card, config: CardConfig) -> Result<(), SaveError> {
        let card_id = card.card_id().ok_or(SaveError::MissingCardId)?;
        let mut request = self.admit(&card_id)?;

        request.mask();
        request.advance(SaveState::DialogRequested);
        // Subscribe before clicking, or the dialog insertion can be missed.
        let insertions = self.host.insertions();
        if !card.open_note_editor() {
            return Err(SaveError::NoEditControl(card_id));
        }

        let form = self.wait_for_dialog(insertions, &card_id).await?;
        request.advance(SaveState::DialogOpen);

        let text = codec::encode(&form.text(), &config)?;
        form.set_text(&text);
        form.submit();
        request.advance(SaveState::FormSubmitted);

        // No completion signal exists; give the host time to save and re-render.
        self.host.sleep(self.timing.settle_delay()).await;
        request.advance(SaveState::Settled);
        Ok(())
    }

    fn admit(&self, card_id: &str) -> Result<RequestToken<H>, SaveError> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.requests.contains_key(card_id) {
            return Err(SaveError::InFlight(card_id.to_string()));
        }
        ledger.requests.insert(card_id.to_string(), SaveState::Idle);
        Ok(RequestToken {
            host: Rc::clone(&self.host),
            ledger: Rc::clone(&self.ledger),
            card_id: card_id.to_string(),
            masking: false,
        })
    }

    /// Note form of the first inserted dialog that holds one for `card_id`,
    /// or an error once the timeout elapses. Other dialogs, including ones
    /// whose form is not filled in yet, are skipped. `insertions` is dropped
    /// on return, which ends the subscription.
    async fn wait_for_dialog(
        &self,
        mut insertions: LocalBoxStream<'static, H::Node>,
        card_id: &str,
    ) -> Result<H::Form, SaveError> {
        let host = &self.host;
        let appeared = async {
            while let Some(node) = insertions.next().await {
                if !host.is_dialog(&node) {
                    trace!("card {card_id}: ignoring unrelated insertion");
                    continue;
                }
                match host.note_form(&node, card_id) {
                    Some(form) => return Some(form),
                    None => trace!("card {card_id}: dialog has no note form for this card"),
                }
            }
            None
        };
        pin_mut!(appeared);

        let timeout = self.timing.dialog_timeout();
        match select(appeared, self.host.sleep(timeout)).await {
            Either::Left((Some(form), _)) => Ok(form),
            Either::Left((None, _)) => Err(SaveError::WatchClosed(card_id.to_string())),
            Either::Right(((), _)) => Err(SaveError::DialogTimeout {
                card_id: card_id.to_string(),
                timeout,
            }),
        }
    }
}

/// One in-flight save.
struct RequestToken<H: Host> {
    host: Rc<H>,
    ledger: Rc<RefCell<Ledger>>,
    card_id: String,
    masking: bool,
}

impl<H: Host> RequestToken<H> {
    fn mask(&mut self) {
        if self.masking {
            return;
        }
        self.masking = true;
        let first = {
            let mut ledger = self.ledger.borrow_mut();
            ledger.masks += 1;
            ledger.masks == 1
        };
        if first {
            self.host.set_masked(true);
        }
    }

    fn advance(&self, state: SaveState) {
        let mut ledger = self.ledger.borrow_mut();
        if let Some(current) = ledger.requests.get_mut(&self.card_id) {
            debug!("card {}: {current:?} -> {state:?}", self.card_id);
            *current = state;
        }
    }
}

impl<H: Host> Drop for RequestToken<H> {
    fn drop(&mut self) {
        let last = {
            let mut ledger = self.ledger.borrow_mut();
            ledger.requests.remove(&self.card_id);
            if self.masking {
                ledger.masks -= 1;
                ledger.masks == 0
            } else {
                false
            }
        };
        if last {
            self.host.set_masked(false);
        }
    }
}
