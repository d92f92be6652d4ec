use crate::api::models::Message;

/// Whole-area states that replace the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    Empty,
    Failed,
}

impl Placeholder {
    pub fn text(self) -> &'static str {
        match self {
            Placeholder::Loading => "Loading messages...",
            Placeholder::Empty => "No messages yet",
            Placeholder::Failed => "Failed to load messages",
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub message: &'a Message,
    /// Sent by the signed in user.
    pub own: bool,
}

/// The render target a [`Timeline`](super::Timeline) draws into.
///
/// Implementations own the widgets; the timeline owns the ordering.
pub trait Presentation {
    /// Drops every row, placeholder and the load-older affordance.
    fn clear(&mut self);

    fn show_placeholder(&mut self, placeholder: Placeholder);

    /// Adds a row below everything else.
    fn append(&mut self, entry: Entry<'_>);

    /// Inserts `entries` (oldest first) above the existing rows, keeping the
    /// rows the user is looking at in place.
    fn prepend(&mut self, entries: &[Entry<'_>]);

    /// Shows or hides the "load older" affordance above the oldest row.
    fn set_load_older(&mut self, visible: bool);

    fn scroll_to_newest(&mut self);

    fn clear_input(&mut self);

    fn alert(&mut self, text: &str);
}
