//! Browser surface (feature `web`).
//!
//! Binds a [`ChatWidget`] to the live DOM through `web-sys`. Clicks on the
//! send control and keypresses in the input are routed to
//! [`ChatWidget::dispatch`] on the browser's event loop with
//! `wasm_bindgen_futures::spawn_local`.
//!
//! ```rust,ignore
//! let widget = chat_widget::web::mount(&ElementIds::default(), transport)?;
//! ```

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlTextAreaElement, js_sys};

use crate::dom::{HostDocument, HostElement};
use crate::error::{Result, WidgetError};
use crate::transport::ChatTransport;
use crate::widget::{ChatWidget, ElementIds, UiEvent};

/// The page's `document`.
#[derive(Debug, Clone)]
pub struct WebDocument(web_sys::Document);

impl WebDocument {
    /// The document of the current window, if there is one.
    #[must_use]
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(Self)
    }

    #[must_use]
    pub fn new(document: web_sys::Document) -> Self {
        Self(document)
    }
}

impl HostDocument for WebDocument {
    type Element = WebElement;

    fn get_element_by_id(&self, id: &str) -> Option<WebElement> {
        self.0
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(WebElement)
    }
}

/// An HTML element of a [`WebDocument`].
#[derive(Debug, Clone)]
pub struct WebElement(HtmlElement);

impl WebElement {
    #[must_use]
    pub fn as_html_element(&self) -> &HtmlElement {
        &self.0
    }
}

impl HostElement for WebElement {
    fn create_element(&self, tag: &str) -> Option<Self> {
        self.0
            .owner_document()?
            .create_element(tag)
            .ok()?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(Self)
    }

    fn text(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn set_class_name(&self, class_name: &str) {
        self.0.set_class_name(class_name);
    }

    fn value(&self) -> String {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        }
    }

    fn is_disabled(&self) -> bool {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.disabled()
        } else if let Some(button) = self.0.dyn_ref::<HtmlButtonElement>() {
            button.disabled()
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.disabled()
        } else {
            self.0.has_attribute("disabled")
        }
    }

    fn set_disabled(&self, disabled: bool) {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if let Some(button) = self.0.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.set_disabled(disabled);
        } else {
            let result = if disabled {
                self.0.set_attribute("disabled", "")
            } else {
                self.0.remove_attribute("disabled")
            };
            if let Err(e) = result {
                tracing::warn!(name: "web.disabled.failed", error = ?e, "Could not toggle disabled");
            }
        }
    }

    fn focus(&self) {
        if let Err(e) = self.0.focus() {
            tracing::debug!(name: "web.focus.failed", error = ?e, "Element refused focus");
        }
    }

    fn is_focused(&self) -> bool {
        let node: &web_sys::Node = self.0.as_ref();
        self.0
            .owner_document()
            .and_then(|doc| doc.active_element())
            .is_some_and(|active| active.is_same_node(Some(node)))
    }

    fn append_child(&self, child: &Self) {
        if let Err(e) = self.0.append_child(&child.0) {
            tracing::warn!(name: "web.append.failed", error = ?e, "Could not append child");
        }
    }

    fn remove(&self) {
        self.0.remove();
    }

    fn scroll_height(&self) -> usize {
        usize::try_from(self.0.scroll_height()).unwrap_or(0)
    }

    fn set_scroll_top(&self, top: usize) {
        self.0.set_scroll_top(i32::try_from(top).unwrap_or(i32::MAX));
    }
}

/// Bind a widget to the current page and route its DOM events.
///
/// Listeners live as long as the page; the returned handle may be dropped.
pub fn mount<T>(ids: &ElementIds, transport: T) -> Result<Rc<ChatWidget<T, WebDocument>>>
where
    T: ChatTransport + 'static,
{
    let document = WebDocument::current().ok_or(WidgetError::NoDocument)?;
    let widget = Rc::new(ChatWidget::bind(&document, ids, transport)?);

    let on_click = {
        let widget = Rc::clone(&widget);
        Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
            let widget = Rc::clone(&widget);
            spawn_local(async move {
                widget.dispatch(UiEvent::SendActivated).await;
            });
        })
    };
    listen(widget.send_control(), "click", on_click)?;

    let on_keypress = {
        let widget = Rc::clone(&widget);
        Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(move |ev: web_sys::KeyboardEvent| {
            let widget = Rc::clone(&widget);
            let key = ev.key();
            spawn_local(async move {
                widget.dispatch(UiEvent::KeyPress(key)).await;
            });
        })
    };
    listen(widget.input(), "keypress", on_keypress)?;

    tracing::info!(
        name: "web.mounted",
        transcript = %ids.transcript_id,
        input = %ids.input_id,
        send = %ids.send_id,
        "Chat widget mounted"
    );
    Ok(widget)
}

fn listen<F>(target: &WebElement, event: &str, handler: Closure<F>) -> Result<()>
where
    F: ?Sized + WasmClosure,
{
    let callback: &js_sys::Function = handler.as_ref().unchecked_ref();
    target
        .0
        .add_event_listener_with_callback(event, callback)
        .map_err(|e| WidgetError::Listener {
            event: event.to_string(),
            reason: format!("{e:?}"),
        })?;
    handler.forget();
    Ok(())
}
