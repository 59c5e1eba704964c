//! Document surfaces the widget can bind to.
//!
//! The widget never talks to a concrete rendering surface. It binds through
//! [`HostDocument`] / [`HostElement`]: look an element up by its stable id,
//! then set text, class, disabled state, input value, focus and scroll
//! position on it.
//!
//! Two surfaces ship with the crate:
//!
//! - [`Document`]: a headless element tree, used by the terminal host and the
//!   tests. Element text is stored as plain text and escaped when the
//!   document is serialized.
//! - `web::WebDocument` (feature `web`): the browser DOM through `web-sys`.
//!
//! # Example
//!
//! ```rust
//! use chat_widget::dom::Document;
//!
//! let doc = Document::new();
//! let list = doc.create_element("div");
//! list.set_id("chatMessages");
//! doc.body().append_child(&list);
//!
//! let found = doc.get_element_by_id("chatMessages").unwrap();
//! assert!(found.same_node(&list));
//! ```

mod document;

pub use document::{Document, Element};

use std::fmt::Debug;

/// A page the widget can look its elements up in.
pub trait HostDocument: Clone + Debug {
    type Element: HostElement;

    /// Find a connected element by its `id` attribute.
    fn get_element_by_id(&self, id: &str) -> Option<Self::Element>;
}

/// The element operations the widget performs.
///
/// Text is always set as text content, never parsed as markup.
pub trait HostElement: Clone + Debug {
    /// Create a detached element in the same document.
    fn create_element(&self, tag: &str) -> Option<Self>;

    fn text(&self) -> String;
    fn set_text(&self, text: &str);

    fn has_class(&self, class: &str) -> bool;
    fn set_class_name(&self, class_name: &str);

    /// Current value of a form control; empty for anything else.
    fn value(&self) -> String;
    fn set_value(&self, value: &str);

    fn is_disabled(&self) -> bool;
    fn set_disabled(&self, disabled: bool);

    fn focus(&self);
    fn is_focused(&self) -> bool;

    fn append_child(&self, child: &Self);
    fn remove(&self);

    fn scroll_height(&self) -> usize;
    fn set_scroll_top(&self, top: usize);
}

impl HostDocument for Document {
    type Element = Element;

    fn get_element_by_id(&self, id: &str) -> Option<Element> {
        Document::get_element_by_id(self, id)
    }
}

impl HostElement for Element {
    fn create_element(&self, tag: &str) -> Option<Self> {
        Some(self.document().create_element(tag))
    }

    fn text(&self) -> String {
        Element::text(self)
    }

    fn set_text(&self, text: &str) {
        Element::set_text(self, text);
    }

    fn has_class(&self, class: &str) -> bool {
        Element::has_class(self, class)
    }

    fn set_class_name(&self, class_name: &str) {
        Element::set_class_name(self, class_name);
    }

    fn value(&self) -> String {
        Element::value(self)
    }

    fn set_value(&self, value: &str) {
        Element::set_value(self, value);
    }

    fn is_disabled(&self) -> bool {
        Element::is_disabled(self)
    }

    fn set_disabled(&self, disabled: bool) {
        Element::set_disabled(self, disabled);
    }

    fn focus(&self) {
        Element::focus(self);
    }

    fn is_focused(&self) -> bool {
        Element::is_focused(self)
    }

    fn append_child(&self, child: &Self) {
        Element::append_child(self, child);
    }

    fn remove(&self) {
        Element::remove(self);
    }

    fn scroll_height(&self) -> usize {
        Element::scroll_height(self)
    }

    fn set_scroll_top(&self, top: usize) {
        Element::set_scroll_top(self, top);
    }
}
