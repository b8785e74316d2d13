//! Browser glue: display-refresh scheduling, clock and DOM updates

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

type FrameClosure = Closure<dyn FnMut(f64)>;

/// Repeating `requestAnimationFrame` loop with an idempotent cancel
pub struct AnimationFrame {
    id: Rc<Cell<Option<i32>>>,
    closure: Rc<RefCell<Option<FrameClosure>>>,
}

impl AnimationFrame {
    /// Call `callback` with the frame timestamp once per display refresh until
    /// cancelled. The next frame is requested before the callback runs.
    pub fn start<F: FnMut(f64) + 'static>(mut callback: F) -> Self {
        let id = Rc::new(Cell::new(None));
        let closure: Rc<RefCell<Option<FrameClosure>>> = Rc::new(RefCell::new(None));

        let id_tick = id.clone();
        let closure_tick = closure.clone();
        *closure.borrow_mut() = Some(Closure::wrap(Box::new(move |time: f64| {
            if id_tick.get().is_none() {
                return;
            }
            id_tick.set(request(&closure_tick));
            callback(time);
        }) as Box<dyn FnMut(f64)>));

        id.set(request(&closure));
        Self { id, closure }
    }

    pub fn is_running(&self) -> bool {
        self.id.get().is_some()
    }

    /// Cancel the pending frame and release the callback. Safe to call twice.
    /// Must not be called from inside the callback itself.
    pub fn cancel(&self) {
        if let Some(id) = self.id.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
        self.closure.borrow_mut().take();
    }
}

impl Drop for AnimationFrame {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn request(closure: &Rc<RefCell<Option<FrameClosure>>>) -> Option<i32> {
    let window = web_sys::window()?;
    let slot = closure.borrow();
    let closure = slot.as_ref()?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .ok()
}

/// Monotonic clock in milliseconds
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn element(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn set_text(id: &str, text: &str) {
    if let Some(el) = element(id) {
        if el.text_content().as_deref() != Some(text) {
            el.set_text_content(Some(text));
        }
    }
}

/// Toggle the `hidden` class
pub fn set_hidden(id: &str, hidden: bool) {
    if let Some(el) = element(id) {
        let _ = el.class_list().toggle_with_force("hidden", hidden);
    }
}

pub fn set_style(id: &str, property: &str, value: &str) {
    if let Some(el) = element(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
        let _ = el.style().set_property(property, value);
    }
}

/// Attach an event listener that lives as long as the page
pub fn listen<F>(target: &web_sys::EventTarget, event: &str, handler: F)
where
    F: FnMut(web_sys::Event) + 'static,
{
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}
