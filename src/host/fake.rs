//! In-memory page for tests.
//!
//! Cards keep their note text in the page; the rendered metadata block is
//! derived from it the way the host page renders markdown. Every effect a
//! real page would show is appended to an effect log.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::executor::block_on;
use futures::future::{self, LocalBoxFuture};
use futures::stream::LocalBoxStream;
use futures::{FutureExt, StreamExt};

use super::{CardNode, Host, Mutation, NoteForm, SaveCallback};
use crate::board::codec;
use crate::render::Controls;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Masked(bool),
    Subscribed,
    EditorOpened(String),
    Submitted { card: String, text: String },
    Slept(Duration),
    SelectorsClosed,
}

/// How the edit dialog of a card behaves when its editor is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogScript {
    #[default]
    Opens,
    /// Something unrelated is inserted before the dialog.
    OpensAfterNoise,
    /// Another card's edit dialog is inserted first.
    OpensAfterForeignDialog(&'static str),
    /// The dialog shows up but holds no form for this card.
    OpensWithoutForm,
    Never,
    /// The card has no edit-note menu entry.
    NoEditControl,
}

#[derive(Debug, Clone)]
pub enum FakeNode {
    Card(FakeCard),
    Dialog { form_for: Option<String> },
    Other,
}

#[derive(Default)]
struct Page {
    effects: RefCell<Vec<Effect>>,
    notes: RefCell<HashMap<String, String>>,
    dialogs: RefCell<HashMap<String, DialogScript>>,
    cards: RefCell<Vec<FakeCard>>,
    subscribers: RefCell<Vec<UnboundedSender<FakeNode>>>,
    observer: RefCell<Option<Box<dyn Fn(Vec<Mutation<FakeNode>>)>>>,
    click_handlers: RefCell<Vec<Box<dyn Fn()>>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    masked: Cell<bool>,
    hold_timers: Cell<bool>,
}

impl Page {
    fn record(&self, effect: Effect) {
        self.effects.borrow_mut().push(effect);
    }

    fn insert(&self, node: FakeNode) {
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(node.clone()).is_ok());
    }
}

#[derive(Clone, Default)]
pub struct FakeHost {
    page: Rc<Page>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A card that is on the board from the start.
    pub fn add_card(&self, id: &str, note: &str) -> FakeCard {
        let card = self.new_card(id, note);
        self.page.cards.borrow_mut().push(card.clone());
        card
    }

    /// A card not on the board yet, for mutation batches.
    pub fn new_card(&self, id: &str, note: &str) -> FakeCard {
        self.set_note(id, note);
        FakeCard {
            id: Some(id.to_string()),
            state: Rc::default(),
            page: Rc::downgrade(&self.page),
        }
    }

    pub fn add_card_without_id(&self) -> FakeCard {
        let card = FakeCard {
            id: None,
            state: Rc::default(),
            page: Rc::downgrade(&self.page),
        };
        self.page.cards.borrow_mut().push(card.clone());
        card
    }

    pub fn set_note(&self, id: &str, note: &str) {
        self.page
            .notes
            .borrow_mut()
            .insert(id.to_string(), note.to_string());
    }

    pub fn note(&self, id: &str) -> String {
        self.page.notes.borrow().get(id).cloned().unwrap_or_default()
    }

    pub fn set_dialog(&self, id: &str, script: DialogScript) {
        self.page.dialogs.borrow_mut().insert(id.to_string(), script);
    }

    /// Make every timer pend forever.
    pub fn hold_timers(&self, hold: bool) {
        self.page.hold_timers.set(hold);
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.page.effects.borrow().clone()
    }

    pub fn masked(&self) -> bool {
        self.page.masked.get()
    }

    /// Insertion subscriptions whose stream is still alive.
    pub fn live_subscribers(&self) -> usize {
        self.page
            .subscribers
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn is_observing(&self) -> bool {
        self.page.observer.borrow().is_some()
    }

    /// Deliver a mutation batch to the column observer.
    pub fn emit(&self, batch: Vec<Mutation<FakeNode>>) {
        if let Some(observer) = self.page.observer.borrow().as_ref() {
            observer(batch);
        }
    }

    pub fn click_document(&self) {
        for handler in self.page.click_handlers.borrow().iter() {
            handler();
        }
    }

    /// Run spawned tasks, including ones spawned while running, to completion.
    pub fn run_tasks(&self) {
        loop {
            let tasks: Vec<_> = self.page.tasks.borrow_mut().drain(..).collect();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                block_on(task);
            }
        }
    }
}

impl Host for FakeHost {
    type Node = FakeNode;
    type Card = FakeCard;
    type Form = FakeForm;

    fn cards(&self) -> Vec<FakeCard> {
        self.page.cards.borrow().clone()
    }

    fn as_card(&self, node: &FakeNode) -> Option<FakeCard> {
        match node {
            FakeNode::Card(card) => Some(card.clone()),
            _ => None,
        }
    }

    fn is_dialog(&self, node: &FakeNode) -> bool {
        matches!(node, FakeNode::Dialog { .. })
    }

    fn note_form(&self, dialog: &FakeNode, card_id: &str) -> Option<FakeForm> {
        match dialog {
            FakeNode::Dialog { form_for: Some(id) } if id == card_id => Some(FakeForm {
                card_id: card_id.to_string(),
                draft: RefCell::new(self.note(card_id)),
                page: Rc::clone(&self.page),
            }),
            _ => None,
        }
    }

    fn insertions(&self) -> LocalBoxStream<'static, FakeNode> {
        let (tx, rx) = unbounded();
        self.page.subscribers.borrow_mut().push(tx);
        self.page.record(Effect::Subscribed);
        rx.boxed_local()
    }

    fn observe_columns(&self, on_batch: Box<dyn Fn(Vec<Mutation<FakeNode>>)>) {
        *self.page.observer.borrow_mut() = Some(on_batch);
    }

    fn on_document_click(&self, handler: Box<dyn Fn()>) {
        self.page.click_handlers.borrow_mut().push(handler);
    }

    fn close_color_selectors(&self) {
        self.page.record(Effect::SelectorsClosed);
    }

    fn set_masked(&self, masked: bool) {
        self.page.masked.set(masked);
        self.page.record(Effect::Masked(masked));
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        if self.page.hold_timers.get() {
            return future::pending().boxed_local();
        }
        let page = Rc::clone(&self.page);
        async move { page.record(Effect::Slept(duration)) }.boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.page.tasks.borrow_mut().push(task);
    }
}

#[derive(Default)]
struct CardState {
    background: RefCell<String>,
    background_writes: Cell<usize>,
    emphasized: Cell<bool>,
    controls: RefCell<Option<(Controls, SaveCallback)>>,
    installs: Cell<usize>,
}

#[derive(Clone)]
pub struct FakeCard {
    id: Option<String>,
    state: Rc<CardState>,
    page: Weak<Page>,
}

impl std::fmt::Debug for FakeCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeCard").field("id", &self.id).finish()
    }
}

impl FakeCard {
    pub fn current_background(&self) -> String {
        self.state.background.borrow().clone()
    }

    pub fn background_writes(&self) -> usize {
        self.state.background_writes.get()
    }

    pub fn emphasized(&self) -> bool {
        self.state.emphasized.get()
    }

    pub fn install_count(&self) -> usize {
        self.state.installs.get()
    }

    pub fn controls(&self) -> Option<Controls> {
        self.state.controls.borrow().as_ref().map(|(c, _)| c.clone())
    }

    pub fn click_swatch(&self, index: usize) {
        let (next, on_save) = {
            let installed = self.state.controls.borrow();
            let Some((controls, on_save)) = installed.as_ref() else {
                return;
            };
            (controls.swatches[index].next.clone(), Rc::clone(on_save))
        };
        on_save(next);
    }

    pub fn click_emphasize(&self) {
        let (next, on_save) = {
            let installed = self.state.controls.borrow();
            let Some((controls, on_save)) = installed.as_ref() else {
                return;
            };
            (controls.emphasize.next.clone(), Rc::clone(on_save))
        };
        on_save(next);
    }

    fn script(&self, page: &Page) -> DialogScript {
        self.id
            .as_ref()
            .and_then(|id| page.dialogs.borrow().get(id).copied())
            .unwrap_or_default()
    }
}

impl CardNode for FakeCard {
    fn card_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn metadata_text(&self) -> Option<String> {
        let page = self.page.upgrade()?;
        let id = self.id.as_ref()?;
        let notes = page.notes.borrow();
        codec::extract_block(notes.get(id)?).map(str::to_string)
    }

    fn background(&self) -> String {
        self.current_background()
    }

    fn set_background(&self, color: &str) {
        *self.state.background.borrow_mut() = color.to_string();
        self.state
            .background_writes
            .set(self.state.background_writes.get() + 1);
    }

    fn set_emphasized(&self, emphasized: bool) {
        self.state.emphasized.set(emphasized);
    }

    fn install_controls(&self, controls: &Controls, on_save: SaveCallback) {
        *self.state.controls.borrow_mut() = Some((controls.clone(), on_save));
        self.state.installs.set(self.state.installs.get() + 1);
    }

    fn open_note_editor(&self) -> bool {
        let Some(page) = self.page.upgrade() else {
            return false;
        };
        let script = self.script(&page);
        if script == DialogScript::NoEditControl {
            return false;
        }
        if let Some(id) = &self.id {
            page.record(Effect::EditorOpened(id.clone()));
        }
        match script {
            DialogScript::Opens => page.insert(FakeNode::Dialog {
                form_for: self.id.clone(),
            }),
            DialogScript::OpensAfterNoise => {
                page.insert(FakeNode::Other);
                page.insert(FakeNode::Dialog {
                    form_for: self.id.clone(),
                });
            }
            DialogScript::OpensAfterForeignDialog(other) => {
                page.insert(FakeNode::Dialog {
                    form_for: Some(other.to_string()),
                });
                page.insert(FakeNode::Dialog {
                    form_for: self.id.clone(),
                });
            }
            DialogScript::OpensWithoutForm => page.insert(FakeNode::Dialog { form_for: None }),
            DialogScript::Never | DialogScript::NoEditControl => {}
        }
        true
    }
}

pub struct FakeForm {
    card_id: String,
    draft: RefCell<String>,
    page: Rc<Page>,
}

impl NoteForm for FakeForm {
    fn text(&self) -> String {
        self.draft.borrow().clone()
    }

    fn set_text(&self, text: &str) {
        *self.draft.borrow_mut() = text.to_string();
    }

    fn submit(&self) {
        let text = self.draft.borrow().clone();
        self.page
            .notes
            .borrow_mut()
            .insert(self.card_id.clone(), text.clone());
        self.page.record(Effect::Submitted {
            card: self.card_id.clone(),
            text,
        });
    }
}
