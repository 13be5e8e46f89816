//! Finding cards to decorate: once at startup, then whenever the host page
//! inserts new ones.

use std::rc::Rc;

use log::{debug, info, warn};

use crate::host::{Host, Mutation};
use crate::render::Renderer;

pub struct ChangeWatcher<H: Host> {
    host: Rc<H>,
    renderer: Rc<Renderer<H>>,
}

impl<H: Host> ChangeWatcher<H> {
    pub fn new(host: Rc<H>, renderer: Rc<Renderer<H>>) -> Self {
        Self { host, renderer }
    }

    /// Render the board as it is now, then follow column changes and close
    /// open color selectors on any click.
    ///
    /// The registered callbacks own the watcher for the rest of the page's
    /// life.
    pub fn start(self: &Rc<Self>) {
        let rendered = self.scan();
        info!("lifeboat decorated {rendered} cards");

        let watcher = Rc::clone(self);
        self.host.observe_columns(Box::new(move |batch| {
            watcher.handle(batch);
        }));

        let host = Rc::clone(&self.host);
        self.host
            .on_document_click(Box::new(move || host.close_color_selectors()));
    }

    /// Render every card currently on the board. Returns how many rendered.
    pub fn scan(&self) -> usize {
        let cards = self.host.cards();
        debug!("cards found initially: {}", cards.len());
        cards.iter().filter(|card| self.render_logged(card)).count()
    }

    /// Render the cards added in `batch`. Other added nodes and attribute
    /// changes are ignored. Returns how many rendered.
    pub fn handle(&self, batch: Vec<Mutation<H::Node>>) -> usize {
        let mut rendered = 0;
        for mutation in batch {
            let Mutation::ChildList { added } = mutation else {
                continue;
            };
            let cards: Vec<_> = added.iter().filter_map(|n| self.host.as_card(n)).collect();
            if cards.is_empty() {
                continue;
            }
            debug!("card changes detected: {} added", cards.len());
            rendered += cards.iter().filter(|card| self.render_logged(card)).count();
        }
        rendered
    }

    fn render_logged(&self, card: &H::Card) -> bool {
        match self.renderer.render(card) {
            Ok(_) => true,
            Err(e) => {
                warn!("skipping card: {e}");
                false
            }
        }
    }
}
