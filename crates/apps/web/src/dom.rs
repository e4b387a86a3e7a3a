//! Small DOM helpers and the legend surface backed by real elements.

use std::collections::BTreeMap;

use foundation::ids::ToggleId;
use layers::layer::Location;
use story::LegendSurface;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Window};

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn html_by_id(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn query_all(doc: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = doc.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect()
}

pub fn set_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

pub fn set_style(el: &HtmlElement, prop: &str, value: &str) {
    let _ = el.style().set_property(prop, value);
}

/// Runs `f` once after `ms` milliseconds.
pub fn set_timeout(ms: u32, f: impl FnOnce() + 'static) {
    let Ok(window) = window() else {
        return;
    };
    let cb = Closure::once(f);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        i32::try_from(ms).unwrap_or(i32::MAX),
    );
    cb.forget();
}

/// Registers a listener for the lifetime of the page.
pub fn listen(target: &web_sys::EventTarget, event: &str, f: impl FnMut() + 'static) {
    let cb = Closure::<dyn FnMut()>::new(f);
    let _ = target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
    cb.forget();
}

pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Legend panels and toggle buttons in the page.
///
/// Missing elements are logged once at construction and ignored afterwards.
pub struct DomLegendSurface {
    panels: BTreeMap<Location, HtmlElement>,
    buttons: BTreeMap<ToggleId, HtmlElement>,
}

impl DomLegendSurface {
    pub fn bind<'a>(
        doc: &Document,
        panels: impl IntoIterator<Item = (Location, &'a str)>,
        toggles: impl IntoIterator<Item = &'a ToggleId>,
    ) -> Self {
        let mut surface = Self {
            panels: BTreeMap::new(),
            buttons: BTreeMap::new(),
        };
        for (location, element_id) in panels {
            match html_by_id(doc, element_id) {
                Some(el) => {
                    surface.panels.insert(location, el);
                }
                None => warn!(panel = element_id, "legend panel element not found"),
            }
        }
        for id in toggles {
            match html_by_id(doc, id.as_str()) {
                Some(el) => {
                    surface.buttons.insert(id.clone(), el);
                }
                None => warn!(toggle = %id, "legend button not found"),
            }
        }
        surface
    }

    pub fn button(&self, id: &ToggleId) -> Option<&HtmlElement> {
        self.buttons.get(id)
    }
}

impl LegendSurface for DomLegendSurface {
    fn show_panel(&mut self, panel: Location, visible: bool) {
        if let Some(el) = self.panels.get(&panel) {
            set_style(el, "display", if visible { "block" } else { "none" });
        }
    }

    fn set_toggle_active(&mut self, toggle: &ToggleId, active: bool) {
        let Some(btn) = self.buttons.get(toggle) else {
            return;
        };
        set_class(btn, "active", active);
        set_class(btn, "inactive", !active);
        set_style(btn, "opacity", if active { "1" } else { "0.5" });
    }
}
