//! The page Lifeboat runs inside, seen through the few operations the core
//! needs.
//!
//! The browser backend lives in `crate::web`; tests use `fake`.

#[cfg(test)]
pub mod fake;

use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

use crate::board::CardConfig;
use crate::render::Controls;

/// Invoked by an installed control with the config it wants saved.
pub type SaveCallback = Rc<dyn Fn(CardConfig)>;

/// One record of a structural-mutation batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<N> {
    /// Nodes were added under an observed container.
    ChildList { added: Vec<N> },
    /// An attribute changed on an existing node.
    Attributes { target: N },
}

/// A card element on the board.
pub trait CardNode: Clone + 'static {
    /// The `data-card-id` attribute.
    fn card_id(&self) -> Option<String>;
    /// Text of the rendered metadata block, if the note has one.
    fn metadata_text(&self) -> Option<String>;
    /// Current inline background color, empty when unset.
    fn background(&self) -> String;
    fn set_background(&self, color: &str);
    fn set_emphasized(&self, emphasized: bool);
    /// Replace any previously installed controls with `controls`.
    fn install_controls(&self, controls: &Controls, on_save: SaveCallback);
    /// Click the card's "edit note" menu entry. False when the card has none.
    fn open_note_editor(&self) -> bool;
}

/// The note form inside an open edit dialog.
pub trait NoteForm {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
    fn submit(&self);
}

pub trait Host: 'static {
    type Node: Clone + 'static;
    type Card: CardNode;
    type Form: NoteForm;

    /// Every card currently on the board.
    fn cards(&self) -> Vec<Self::Card>;
    fn as_card(&self, node: &Self::Node) -> Option<Self::Card>;
    fn is_dialog(&self, node: &Self::Node) -> bool;
    /// The note form for `card_id` inside `dialog`, with its textarea and
    /// submit control present.
    fn note_form(&self, dialog: &Self::Node, card_id: &str) -> Option<Self::Form>;

    /// Nodes inserted anywhere in the page from now on. The subscription is
    /// live as soon as this returns and ends when the stream is dropped.
    fn insertions(&self) -> LocalBoxStream<'static, Self::Node>;
    /// Deliver mutation batches from every column container to `on_batch`.
    fn observe_columns(&self, on_batch: Box<dyn Fn(Vec<Mutation<Self::Node>>)>);
    fn on_document_click(&self, handler: Box<dyn Fn()>);
    fn close_color_selectors(&self);

    /// Toggle the page-wide class that hides the edit dialog.
    fn set_masked(&self, masked: bool);
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
