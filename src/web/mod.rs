//! The live page, through `web-sys`.

mod controls;

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use futures::future::LocalBoxFuture;
use futures::stream::{self, LocalBoxStream, Stream};
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;
use js_sys::Array;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlTextAreaElement, MutationObserver,
    MutationObserverInit, MutationRecord, NodeList,
};

use crate::app::App;
use crate::config::{Selectors, Settings};
use crate::host::{CardNode, Host, Mutation, NoteForm, SaveCallback};
use crate::render::{Controls, EMPHASIZE_CLASS};

type ObserverCallback = Closure<dyn FnMut(Array, MutationObserver)>;

const COLOR_SELECTOR_CLASS: &str = "lifeboat--color-selector";

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
}

/// Entry point called by the extension's loader script.
///
/// `settings` is an optional TOML override of [`Settings`].
#[wasm_bindgen]
pub fn start(settings: Option<String>) -> Result<(), JsError> {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));

    let settings = match settings {
        Some(text) => Settings::from_toml(&text)?,
        None => Settings::default(),
    };
    let host = DomHost::new(settings.selectors.clone())?;
    App::new(Rc::new(host), settings).start();
    Ok(())
}

pub struct DomHost {
    document: Document,
    selectors: Rc<Selectors>,
    /// Kept alive for as long as the page runs.
    observers: RefCell<Vec<(MutationObserver, ObserverCallback)>>,
    listeners: RefCell<Vec<Closure<dyn FnMut(Event)>>>,
}

impl DomHost {
    pub fn new(selectors: Selectors) -> Result<Self, WebError> {
        let document = web_sys::window()
            .ok_or(WebError::NoWindow)?
            .document()
            .ok_or(WebError::NoDocument)?;
        Ok(Self {
            document,
            selectors: Rc::new(selectors),
            observers: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.document.query_selector_all(selector) {
            Ok(list) => elements(&list),
            Err(e) => {
                warn!("bad selector {selector:?}: {e:?}");
                Vec::new()
            }
        }
    }

    fn card(&self, element: Element) -> Option<DomCard> {
        Some(DomCard {
            element: element.dyn_into().ok()?,
            document: self.document.clone(),
            selectors: Rc::clone(&self.selectors),
        })
    }
}

impl Host for DomHost {
    type Node = Element;
    type Card = DomCard;
    type Form = DomForm;

    fn cards(&self) -> Vec<DomCard> {
        self.query_all(&self.selectors.card)
            .into_iter()
            .filter_map(|element| self.card(element))
            .collect()
    }

    fn as_card(&self, node: &Element) -> Option<DomCard> {
        if node.matches(&self.selectors.card).unwrap_or(false) {
            self.card(node.clone())
        } else {
            None
        }
    }

    fn is_dialog(&self, node: &Element) -> bool {
        node.matches(&self.selectors.dialog).unwrap_or(false)
    }

    fn note_form(&self, dialog: &Element, card_id: &str) -> Option<DomForm> {
        let form = dialog
            .query_selector(&self.selectors.note_form(card_id))
            .ok()
            .flatten()?;
        let textarea = form
            .query_selector(&self.selectors.note_textarea)
            .ok()
            .flatten()?
            .dyn_into::<HtmlTextAreaElement>()
            .ok()?;
        let submit = form
            .query_selector(&self.selectors.submit)
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        Some(DomForm { textarea, submit })
    }

    fn insertions(&self) -> LocalBoxStream<'static, Element> {
        let Some(body) = self.document.body() else {
            warn!("page has no body to watch");
            return stream::empty().boxed_local();
        };
        let (tx, rx) = unbounded();
        let callback = ObserverCallback::new(move |records: Array, _: MutationObserver| {
            for record in records.iter() {
                let Ok(record) = record.dyn_into::<MutationRecord>() else {
                    continue;
                };
                let parent = record.target().and_then(|n| n.dyn_into::<Element>().ok());
                for element in parent.into_iter().chain(elements(&record.added_nodes())) {
                    let _ = tx.unbounded_send(element);
                }
            }
        });
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("cannot create insertion observer: {e:?}");
                return stream::empty().boxed_local();
            }
        };
        if let Err(e) = observer.observe_with_options(&body, &subtree_children()) {
            warn!("cannot observe page insertions: {e:?}");
            return stream::empty().boxed_local();
        }
        Insertions {
            rx,
            observer,
            _callback: callback,
        }
        .boxed_local()
    }

    fn observe_columns(&self, on_batch: Box<dyn Fn(Vec<Mutation<Element>>)>) {
        let callback = ObserverCallback::new(move |records: Array, _: MutationObserver| {
            let batch = records
                .iter()
                .filter_map(|r| r.dyn_into::<MutationRecord>().ok())
                .filter_map(|r| to_mutation(&r))
                .collect();
            on_batch(batch);
        });
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("cannot create column observer: {e:?}");
                return;
            }
        };
        let init = subtree_children();
        let columns = self.query_all(&self.selectors.column);
        debug!("observing {} columns", columns.len());
        for column in &columns {
            if let Err(e) = observer.observe_with_options(column, &init) {
                warn!("cannot observe column: {e:?}");
            }
        }
        self.observers.borrow_mut().push((observer, callback));
    }

    fn on_document_click(&self, handler: Box<dyn Fn()>) {
        let listener = Closure::<dyn FnMut(Event)>::new(move |_: Event| handler());
        match self
            .document
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
        {
            Ok(()) => self.listeners.borrow_mut().push(listener),
            Err(e) => warn!("cannot listen for clicks: {e:?}"),
        }
    }

    fn close_color_selectors(&self) {
        let open = format!(".{COLOR_SELECTOR_CLASS}[aria-expanded=\"true\"]");
        for selector in self.query_all(&open) {
            let _ = selector.set_attribute("aria-expanded", "false");
        }
    }

    fn set_masked(&self, masked: bool) {
        let Some(body) = self.document.body() else {
            return;
        };
        if let Err(e) = body
            .class_list()
            .toggle_with_force(&self.selectors.mask_class, masked)
        {
            warn!("cannot toggle mask: {e:?}");
        }
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        Box::pin(TimeoutFuture::new(millis))
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Page insertions; disconnects its observer when dropped.
struct Insertions {
    rx: UnboundedReceiver<Element>,
    observer: MutationObserver,
    _callback: ObserverCallback,
}

impl Stream for Insertions {
    type Item = Element;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Element>> {
        self.rx.poll_next_unpin(cx)
    }
}

impl Drop for Insertions {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn subtree_children() -> MutationObserverInit {
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    init
}

fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn to_mutation(record: &MutationRecord) -> Option<Mutation<Element>> {
    match record.type_().as_str() {
        "childList" => Some(Mutation::ChildList {
            added: elements(&record.added_nodes()),
        }),
        "attributes" => {
            let target = record.target()?.dyn_into::<Element>().ok()?;
            Some(Mutation::Attributes { target })
        }
        _ => None,
    }
}

#[derive(Clone)]
pub struct DomCard {
    element: HtmlElement,
    document: Document,
    selectors: Rc<Selectors>,
}

impl CardNode for DomCard {
    fn card_id(&self) -> Option<String> {
        self.element.get_attribute("data-card-id")
    }

    fn metadata_text(&self) -> Option<String> {
        self.element
            .query_selector(&self.selectors.metadata)
            .ok()
            .flatten()?
            .text_content()
    }

    fn background(&self) -> String {
        self.element
            .style()
            .get_property_value("background-color")
            .unwrap_or_default()
    }

    fn set_background(&self, color: &str) {
        if let Err(e) = self.element.style().set_property("background-color", color) {
            warn!("cannot set card background: {e:?}");
        }
    }

    fn set_emphasized(&self, emphasized: bool) {
        let _ = self
            .element
            .class_list()
            .toggle_with_force(EMPHASIZE_CLASS, emphasized);
    }

    fn install_controls(&self, controls: &Controls, on_save: SaveCallback) {
        let container = match self.element.query_selector(&self.selectors.controls) {
            Ok(Some(container)) => container,
            _ => {
                debug!("card {:?} has no controls container", self.card_id());
                self.element.clone().into()
            }
        };
        if let Ok(Some(previous)) =
            container.query_selector(&format!(".{}", controls::CONTROLS_CLASS))
        {
            previous.remove();
        }
        match controls::build(&self.document, controls, &on_save) {
            Ok(tree) => {
                if let Err(e) = container.append_child(&tree) {
                    warn!("cannot attach card controls: {e:?}");
                }
            }
            Err(e) => warn!("cannot build card controls: {e:?}"),
        }
    }

    fn open_note_editor(&self) -> bool {
        let button = self
            .element
            .query_selector(&self.selectors.edit_button)
            .ok()
            .flatten()
            .and_then(|b| b.dyn_into::<HtmlElement>().ok());
        match button {
            Some(button) => {
                button.click();
                true
            }
            None => false,
        }
    }
}

pub struct DomForm {
    textarea: HtmlTextAreaElement,
    submit: HtmlElement,
}

impl NoteForm for DomForm {
    fn text(&self) -> String {
        self.textarea.value()
    }

    fn set_text(&self, text: &str) {
        self.textarea.set_value(text);
    }

    fn submit(&self) {
        self.submit.click();
    }
}
