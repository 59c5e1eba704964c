//! Transcript rendering helpers.

use crate::dom::HostElement;
use crate::wire::Role;

/// Class shared by every transcript bubble.
pub const BUBBLE_CLASS: &str = "message";
/// Class of user bubbles.
pub const USER_BUBBLE_CLASS: &str = "user-message";
/// Class of assistant bubbles.
pub const ASSISTANT_BUBBLE_CLASS: &str = "ai-message";
/// Class of the pending-reply marker.
pub const TYPING_CLASS: &str = "typing-indicator";

/// Number of animated dots in the typing marker.
const TYPING_DOTS: usize = 3;

fn role_class(role: Role) -> &'static str {
    match role {
        Role::User => USER_BUBBLE_CLASS,
        Role::Assistant => ASSISTANT_BUBBLE_CLASS,
    }
}

/// Role a rendered bubble was attributed to, if it is a bubble at all.
#[must_use]
pub fn bubble_role<E: HostElement>(element: &E) -> Option<Role> {
    if !element.has_class(BUBBLE_CLASS) {
        return None;
    }
    if element.has_class(USER_BUBBLE_CLASS) {
        Some(Role::User)
    } else if element.has_class(ASSISTANT_BUBBLE_CLASS) {
        Some(Role::Assistant)
    } else {
        None
    }
}

/// Append a bubble holding `text` verbatim and scroll it into view.
///
/// Returns `None` if the host refused to create the element.
pub fn append_bubble<E: HostElement>(transcript: &E, text: &str, role: Role) -> Option<E> {
    let bubble = transcript.create_element("div")?;
    bubble.set_class_name(&format!("{BUBBLE_CLASS} {}", role_class(role)));
    bubble.set_text(text);
    transcript.append_child(&bubble);
    scroll_to_bottom(transcript);
    Some(bubble)
}

/// Append the three-dot marker shown while a reply is pending.
pub fn append_typing_placeholder<E: HostElement>(transcript: &E) -> Option<E> {
    let marker = transcript.create_element("div")?;
    marker.set_class_name(TYPING_CLASS);
    for _ in 0..TYPING_DOTS {
        if let Some(dot) = transcript.create_element("span") {
            marker.append_child(&dot);
        }
    }
    transcript.append_child(&marker);
    scroll_to_bottom(transcript);
    Some(marker)
}

fn scroll_to_bottom<E: HostElement>(transcript: &E) {
    transcript.set_scroll_top(transcript.scroll_height());
}
