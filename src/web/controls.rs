use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, HtmlImageElement};

use super::COLOR_SELECTOR_CLASS;
use crate::host::SaveCallback;
use crate::render::Controls;

pub(super) const CONTROLS_CLASS: &str = "lifeboat--controls";

/// DOM for one card's controls, wrapped in a single element so the next
/// render can swap it out whole.
pub(super) fn build(
    document: &Document,
    controls: &Controls,
    on_save: &SaveCallback,
) -> Result<Element, JsValue> {
    let root = document.create_element("div")?;
    root.class_list().add_1(CONTROLS_CLASS)?;
    root.append_child(&color_selector(document, controls, on_save)?)?;
    root.append_child(&emphasize_button(document, controls, on_save)?)?;
    Ok(root)
}

fn color_selector(
    document: &Document,
    controls: &Controls,
    on_save: &SaveCallback,
) -> Result<HtmlElement, JsValue> {
    let selector: HtmlElement = create(document, "div")?;
    selector
        .class_list()
        .add_2("position-absolute", COLOR_SELECTOR_CLASS)?;
    selector.set_attribute("aria-expanded", "false")?;

    let toggle: HtmlElement = create(document, "button")?;
    toggle.set_title("Pick a color");
    if let Some(icon) = &controls.picker_icon {
        let image: HtmlImageElement = create(document, "img")?;
        image.set_src(icon);
        image.set_alt("");
        toggle.append_child(&image)?;
    }
    let opened = selector.clone();
    on_click(&toggle, move |event| {
        let _ = opened.set_attribute("aria-expanded", "true");
        // The document listener would close it again.
        event.stop_propagation();
    });

    let list: HtmlElement = create(document, "ul")?;
    for swatch in &controls.swatches {
        let item: HtmlElement = create(document, "li")?;
        item.set_title(&swatch.title);
        match &swatch.fill {
            Some(fill) => item.style().set_property("background-color", fill)?,
            None => item.class_list().add_1("no-color")?,
        }
        let next = swatch.next.clone();
        let save = Rc::clone(on_save);
        on_click(&item, move |_| save(next.clone()));
        list.append_child(&item)?;
    }

    selector.append_child(&toggle)?;
    selector.append_child(&list)?;
    Ok(selector)
}

fn emphasize_button(
    document: &Document,
    controls: &Controls,
    on_save: &SaveCallback,
) -> Result<HtmlElement, JsValue> {
    let toggle = &controls.emphasize;
    let button: HtmlElement = create(document, "button")?;
    button
        .class_list()
        .add_2("position-absolute", "lifeboat--emphasize-button")?;
    button.set_title(&toggle.title);
    button.set_attribute("aria-pressed", if toggle.active { "true" } else { "false" })?;

    let next = toggle.next.clone();
    let save = Rc::clone(on_save);
    on_click(&button, move |_| save(next.clone()));
    Ok(button)
}

fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T, JsValue> {
    document
        .create_element(tag)?
        .dyn_into::<T>()
        .map_err(JsValue::from)
}

/// The handler is owned by the JS function from here on.
fn on_click(target: &HtmlElement, handler: impl FnMut(Event) + 'static) {
    let handler = Closure::<dyn FnMut(Event)>::new(handler).into_js_value();
    target.set_onclick(Some(handler.unchecked_ref()));
}
