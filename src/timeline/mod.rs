//! The message timeline of the selected conversation.
//!
//! History is fetched newest page first and older pages are prepended on
//! demand; live messages from the push channel are appended at the tail.
//! Every async step is split into a request and a completion carrying a
//! [`Ticket`], so a shell can run the network call as its own task and a
//! completion that belongs to an earlier selection is simply dropped.

mod view;

pub use view::{Entry, Placeholder, Presentation};

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::models::{Message, MessageQuery, OutboundMessage};
use crate::api::{ApiError, ChannelEvent, ChannelHandle, Transport};

/// Messages per history page.
pub const PAGE_SIZE: usize = 20;

pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const CONNECT_FAILED: &str = "Failed to connect to chat. Please try again later.";

/// Generation of the timeline an async operation started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A history fetch the caller has to run and hand back.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub conversation_id: String,
    pub query: MessageQuery,
}

/// A push channel the caller has to open and hand back.
#[derive(Debug, Clone)]
pub struct ChannelRequest {
    pub ticket: Ticket,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send, nothing selected or no channel.
    Skipped,
    Sent,
    Failed,
}

pub struct Timeline<V: Presentation> {
    transport: Arc<dyn Transport>,
    viewer_id: String,
    view: V,
    conversation_id: Option<String>,
    messages: VecDeque<Message>,
    boundary: Option<f64>,
    has_older: bool,
    older_pending: bool,
    placeholder: Option<Placeholder>,
    channel: Option<ChannelHandle>,
    generation: u64,
}

/// Ascending by timestamp; the sort is stable so ties keep server order.
fn sort_page(page: &mut [Message]) {
    page.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}

impl<V: Presentation> Timeline<V> {
    pub fn new(transport: Arc<dyn Transport>, viewer_id: impl Into<String>, view: V) -> Self {
        Self {
            transport,
            viewer_id: viewer_id.into(),
            view,
            conversation_id: None,
            messages: VecDeque::new(),
            boundary: None,
            has_older: false,
            older_pending: false,
            placeholder: None,
            channel: None,
            generation: 0,
        }
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Visible messages, oldest first.
    pub fn messages(&self) -> &VecDeque<Message> {
        &self.messages
    }

    /// Exclusive upper bound for the next older page.
    pub fn boundary(&self) -> Option<f64> {
        self.boundary
    }

    /// Whether the load-older affordance is showing.
    pub fn has_older(&self) -> bool {
        self.has_older
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    fn entry<'a>(&self, message: &'a Message) -> Entry<'a> {
        Entry {
            message,
            own: message.sender.id == self.viewer_id,
        }
    }

    fn set_placeholder(&mut self, placeholder: Placeholder) {
        self.placeholder = Some(placeholder);
        self.view.show_placeholder(placeholder);
    }

    fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            log::debug!("Closing channel for {}", channel.conversation_id());
            channel.close();
        }
    }

    /// Resets everything for `conversation_id` and returns the first page fetch.
    ///
    /// Any open channel is closed and every ticket handed out before is
    /// invalidated.
    pub fn select(&mut self, conversation_id: &str) -> FetchRequest {
        self.close_channel();
        self.generation += 1;
        self.conversation_id = Some(conversation_id.to_string());
        self.messages.clear();
        self.boundary = None;
        self.has_older = false;
        self.older_pending = false;
        self.view.clear();
        self.set_placeholder(Placeholder::Loading);
        FetchRequest {
            ticket: self.ticket(),
            conversation_id: conversation_id.to_string(),
            query: MessageQuery::latest(PAGE_SIZE),
        }
    }

    /// Renders the first page. Returns how many messages were rendered.
    pub fn finish_load(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Message>, ApiError>,
    ) -> usize {
        if !self.is_current(ticket) {
            log::debug!("Discarding stale initial page");
            return 0;
        }
        // Live messages that beat the first page are dropped with the screen.
        self.view.clear();
        self.messages.clear();
        self.placeholder = None;
        let mut page = match result {
            Ok(page) => page,
            Err(e) => {
                log::error!("Error loading messages: {e}");
                self.set_placeholder(Placeholder::Failed);
                return 0;
            }
        };
        if page.is_empty() {
            self.set_placeholder(Placeholder::Empty);
            return 0;
        }

        sort_page(&mut page);
        self.boundary = Some(page[0].timestamp);
        let count = page.len();
        for message in page {
            let entry = self.entry(&message);
            self.view.append(entry);
            self.messages.push_back(message);
        }
        self.has_older = count >= PAGE_SIZE;
        self.view.set_load_older(self.has_older);
        self.view.scroll_to_newest();
        log::debug!(
            "Loaded {count} messages for {}",
            self.conversation_id.as_deref().unwrap_or_default()
        );
        count
    }

    /// Starts a fetch of the page before the boundary and hides the affordance.
    ///
    /// `None` when nothing is loaded yet or an older page is already on its way.
    pub fn request_older(&mut self) -> Option<FetchRequest> {
        let conversation_id = self.conversation_id.clone()?;
        let Some(before) = self.boundary else {
            log::debug!("No boundary yet, nothing older to load");
            return None;
        };
        if self.older_pending {
            log::debug!("Older page already requested");
            return None;
        }
        self.older_pending = true;
        if self.has_older {
            self.has_older = false;
            self.view.set_load_older(false);
        }
        Some(FetchRequest {
            ticket: self.ticket(),
            conversation_id,
            query: MessageQuery::before(PAGE_SIZE, before),
        })
    }

    /// Prepends an older page. Returns how many messages were added.
    pub fn finish_older(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Message>, ApiError>,
    ) -> usize {
        if !self.is_current(ticket) {
            log::debug!("Discarding stale older page");
            return 0;
        }
        self.older_pending = false;
        let mut page = match result {
            Ok(page) => page,
            Err(e) => {
                log::error!("Error loading older messages: {e}");
                return 0;
            }
        };
        if page.is_empty() {
            log::debug!("History exhausted");
            return 0;
        }

        sort_page(&mut page);
        // Only the fresh page moves the boundary; see DESIGN.md.
        self.boundary = Some(page[0].timestamp);
        let count = page.len();
        {
            let entries: Vec<Entry<'_>> = page.iter().map(|m| self.entry(m)).collect();
            self.view.prepend(&entries);
        }
        for message in page.into_iter().rev() {
            self.messages.push_front(message);
        }
        if count >= PAGE_SIZE {
            self.has_older = true;
            self.view.set_load_older(true);
        }
        count
    }

    /// Appends a message from the push channel at the tail, whatever its timestamp.
    pub fn receive_live(&mut self, message: Message) {
        if self.placeholder.take().is_some() {
            self.view.clear();
        }
        let entry = self.entry(&message);
        self.view.append(entry);
        self.messages.push_back(message);
        self.view.scroll_to_newest();
    }

    /// Channel request for the selected conversation, if any.
    pub fn request_channel(&self) -> Option<ChannelRequest> {
        Some(ChannelRequest {
            ticket: self.ticket(),
            conversation_id: self.conversation_id.clone()?,
        })
    }

    /// Installs a freshly opened channel and hands back its event stream.
    ///
    /// A channel that arrives for a superseded selection is closed on the spot.
    pub fn attach_channel(
        &mut self,
        ticket: Ticket,
        result: Result<ChannelHandle, ApiError>,
    ) -> Option<UnboundedReceiver<ChannelEvent>> {
        let mut channel = match result {
            Ok(channel) => channel,
            Err(e) => {
                if self.is_current(ticket) {
                    log::error!("Error connecting to WebSocket: {e}");
                    self.view.alert(CONNECT_FAILED);
                }
                return None;
            }
        };
        let superseded = !self.is_current(ticket)
            || self.conversation_id.as_deref() != Some(channel.conversation_id());
        if superseded {
            log::debug!("Dropping channel for superseded {}", channel.conversation_id());
            channel.close();
            return None;
        }
        self.close_channel();
        let events = channel.take_events();
        self.channel = Some(channel);
        events
    }

    /// Routes one channel event; events from an earlier selection are ignored.
    pub fn handle_event(&mut self, ticket: Ticket, event: ChannelEvent) {
        if !self.is_current(ticket) {
            return;
        }
        match event {
            ChannelEvent::Opened => log::info!("WebSocket connection established"),
            ChannelEvent::Message(message) => self.receive_live(message),
            ChannelEvent::ServerError(text) => {
                log::warn!("Server rejected message: {text}");
                self.view.alert(&text);
            }
            ChannelEvent::Failed(text) => log::error!("WebSocket error: {text}"),
            ChannelEvent::Closed => {
                log::info!("WebSocket connection closed");
                self.channel = None;
            }
        }
    }

    /// Transmits `content` on the channel without rendering it locally.
    pub fn send(&mut self, content: &str) -> SendOutcome {
        let content = content.trim();
        if content.is_empty() || self.conversation_id.is_none() {
            return SendOutcome::Skipped;
        }
        let Some(channel) = &self.channel else {
            return SendOutcome::Skipped;
        };
        let message = OutboundMessage {
            content: content.to_string(),
            timestamp: crate::utils::now_secs(),
        };
        let outcome = match channel.send(&message) {
            Ok(()) => SendOutcome::Sent,
            Err(e) => {
                log::error!("Error sending message: {e}");
                self.view.alert(SEND_FAILED);
                SendOutcome::Failed
            }
        };
        self.view.clear_input();
        outcome
    }

    /// Tears down the channel and invalidates outstanding tickets.
    pub fn close(&mut self) {
        self.close_channel();
        self.generation += 1;
        self.conversation_id = None;
        self.older_pending = false;
    }

    pub async fn load(&mut self, conversation_id: &str) -> usize {
        let request = self.select(conversation_id);
        let result = self
            .transport
            .fetch_messages(&request.conversation_id, request.query)
            .await;
        self.finish_load(request.ticket, result)
    }

    pub async fn load_older(&mut self) -> usize {
        let Some(request) = self.request_older() else {
            return 0;
        };
        let result = self
            .transport
            .fetch_messages(&request.conversation_id, request.query)
            .await;
        self.finish_older(request.ticket, result)
    }

    pub async fn connect(&mut self) -> Option<UnboundedReceiver<ChannelEvent>> {
        let request = self.request_channel()?;
        let result = self.transport.open_channel(&request.conversation_id).await;
        self.attach_channel(request.ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::User;
    use crate::api::OutboundFrame;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    enum Row {
        Message(String),
        Placeholder(Placeholder),
    }

    #[derive(Default)]
    struct RecordingView {
        rows: VecDeque<Row>,
        older: bool,
        scrolled: usize,
        input_cleared: usize,
        alerts: Vec<String>,
    }

    impl RecordingView {
        fn ids(&self) -> Vec<String> {
            self.rows
                .iter()
                .filter_map(|r| match r {
                    Row::Message(id) => Some(id.clone()),
                    Row::Placeholder(_) => None,
                })
                .collect()
        }
    }

    impl Presentation for RecordingView {
        fn clear(&mut self) {
            self.rows.clear();
            self.older = false;
        }
        fn show_placeholder(&mut self, placeholder: Placeholder) {
            self.rows.push_back(Row::Placeholder(placeholder));
        }
        fn append(&mut self, entry: Entry<'_>) {
            self.rows.push_back(Row::Message(entry.message.id.clone()));
        }
        fn prepend(&mut self, entries: &[Entry<'_>]) {
            for entry in entries.iter().rev() {
                self.rows.push_front(Row::Message(entry.message.id.clone()));
            }
        }
        fn set_load_older(&mut self, visible: bool) {
            self.older = visible;
        }
        fn scroll_to_newest(&mut self) {
            self.scrolled += 1;
        }
        fn clear_input(&mut self) {
            self.input_cleared += 1;
        }
        fn alert(&mut self, text: &str) {
            self.alerts.push(text.to_string());
        }
    }

    fn msg(id: &str, ts: f64, sender: &str) -> Message {
        Message {
            id: id.into(),
            content: format!("content {id}"),
            timestamp: ts,
            sender: User {
                id: sender.into(),
                name: sender.into(),
                username: sender.into(),
                status: Default::default(),
            },
            kind: None,
            status: None,
        }
    }

    /// Serves `count` messages at timestamps 1..=count the way the backend does.
    struct FakeTransport {
        messages: Vec<Message>,
        queries: Mutex<Vec<MessageQuery>>,
        fail: bool,
    }

    impl FakeTransport {
        fn with(count: usize) -> Self {
            Self {
                messages: (1..=count).map(|i| msg(&format!("m{i}"), i as f64, "bob")).collect(),
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::with(0)
            }
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn fetch_messages(
            &self,
            _id: &str,
            query: MessageQuery,
        ) -> Result<Vec<Message>, ApiError> {
            self.queries.lock().unwrap().push(query);
            if self.fail {
                return Err(ApiError::Status {
                    status: 500,
                    message: "Internal Server Error".into(),
                });
            }
            let mut page: Vec<Message> = self
                .messages
                .iter()
                .filter(|m| query.before.is_none_or(|b| m.timestamp < b))
                .cloned()
                .collect();
            page.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
            page.truncate(query.limit);
            Ok(page)
        }

        async fn open_channel(&self, _id: &str) -> Result<ChannelHandle, ApiError> {
            Err(ApiError::NotAuthenticated)
        }
    }

    fn timeline(transport: FakeTransport) -> (Timeline<RecordingView>, Arc<FakeTransport>) {
        let transport = Arc::new(transport);
        let tl = Timeline::new(transport.clone(), "alice", RecordingView::default());
        (tl, transport)
    }

    #[tokio::test]
    async fn load_renders_ascending_and_scrolls() {
        let (mut tl, _) = timeline(FakeTransport::with(5));
        assert_eq!(tl.load("c1").await, 5);
        assert_eq!(tl.view().ids(), vec!["m1", "m2", "m3", "m4", "m5"]);
        assert_eq!(tl.boundary(), Some(1.0));
        assert!(!tl.has_older());
        assert!(!tl.view().older);
        assert_eq!(tl.view().scrolled, 1);
    }

    #[tokio::test]
    async fn full_page_shows_affordance() {
        let (mut tl, transport) = timeline(FakeTransport::with(30));
        tl.load("c1").await;
        assert!(tl.has_older());
        assert!(tl.view().older);
        assert_eq!(tl.boundary(), Some(11.0));
        assert_eq!(transport.queries.lock().unwrap()[0], MessageQuery::latest(PAGE_SIZE));
    }

    #[tokio::test]
    async fn empty_conversation_shows_placeholder_only() {
        let (mut tl, _) = timeline(FakeTransport::with(0));
        tl.load("c1").await;
        assert_eq!(tl.view().rows, VecDeque::from(vec![Row::Placeholder(Placeholder::Empty)]));
        assert_eq!(tl.boundary(), None);
    }

    #[tokio::test]
    async fn failed_load_shows_error_and_leaves_boundary_unset() {
        let (mut tl, _) = timeline(FakeTransport::failing());
        tl.load("c1").await;
        assert_eq!(tl.view().rows, VecDeque::from(vec![Row::Placeholder(Placeholder::Failed)]));
        assert_eq!(tl.boundary(), None);
    }

    #[tokio::test]
    async fn load_older_without_boundary_issues_no_fetch() {
        let (mut tl, transport) = timeline(FakeTransport::with(0));
        assert_eq!(tl.load_older().await, 0);
        tl.load("c1").await;
        assert_eq!(tl.load_older().await, 0);
        assert_eq!(transport.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn older_page_goes_above_everything() {
        let (mut tl, transport) = timeline(FakeTransport::with(25));
        tl.load("c1").await;
        tl.receive_live(msg("live", 0.5, "bob"));
        assert_eq!(tl.load_older().await, 5);
        let ids = tl.view().ids();
        assert_eq!(&ids[..5], &["m1", "m2", "m3", "m4", "m5"]);
        assert_eq!(ids.last().map(String::as_str), Some("live"));
        assert_eq!(tl.boundary(), Some(1.0));
        assert!(!tl.has_older());
        assert_eq!(
            transport.queries.lock().unwrap()[1],
            MessageQuery::before(PAGE_SIZE, 6.0)
        );
        let model: Vec<&str> = tl.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(model, ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failed_older_keeps_view_without_affordance() {
        let (mut tl, _) = timeline(FakeTransport::with(20));
        tl.load("c1").await;
        let request = tl.request_older().unwrap();
        let before = tl.view().ids();
        tl.finish_older(request.ticket, Err(ApiError::Unauthorized));
        assert_eq!(tl.view().ids(), before);
        assert!(!tl.view().older);
        assert!(tl.view().alerts.is_empty());
        assert_eq!(tl.boundary(), Some(1.0));
    }

    #[tokio::test]
    async fn only_one_older_fetch_in_flight() {
        let (mut tl, _) = timeline(FakeTransport::with(40));
        tl.load("c1").await;
        assert!(tl.request_older().is_some());
        assert!(tl.request_older().is_none());
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let (mut tl, _) = timeline(FakeTransport::with(3));
        let first = tl.select("c1");
        let second = tl.select("c2");
        assert_eq!(tl.finish_load(first.ticket, Ok(vec![msg("x", 1.0, "bob")])), 0);
        assert_eq!(tl.view().rows, VecDeque::from(vec![Row::Placeholder(Placeholder::Loading)]));
        assert_eq!(tl.finish_load(second.ticket, Ok(vec![msg("y", 2.0, "bob")])), 1);
        assert_eq!(tl.view().ids(), vec!["y"]);
        tl.handle_event(first.ticket, ChannelEvent::Message(msg("z", 3.0, "bob")));
        assert_eq!(tl.view().ids(), vec!["y"]);
    }

    #[tokio::test]
    async fn first_page_replaces_early_live_messages() {
        let (mut tl, _) = timeline(FakeTransport::with(0));
        let request = tl.select("c1");
        let _out = wire_channel(&mut tl);
        tl.handle_event(request.ticket, ChannelEvent::Message(msg("live", 9.0, "bob")));
        assert_eq!(tl.view().ids(), vec!["live"]);

        let page = vec![msg("h2", 2.0, "bob"), msg("h1", 1.0, "bob")];
        assert_eq!(tl.finish_load(request.ticket, Ok(page)), 2);
        let model: Vec<&str> = tl.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(model, vec!["h1", "h2"]);
        assert_eq!(tl.view().ids(), vec!["h1", "h2"]);
    }

    #[tokio::test]
    async fn live_messages_append_regardless_of_timestamp() {
        let (mut tl, _) = timeline(FakeTransport::with(3));
        tl.load("c1").await;
        tl.receive_live(msg("old", -10.0, "bob"));
        tl.receive_live(msg("m2", 2.0, "bob"));
        assert_eq!(tl.view().ids(), vec!["m1", "m2", "m3", "old", "m2"]);
        assert_eq!(tl.boundary(), Some(1.0));
    }

    #[tokio::test]
    async fn live_message_replaces_empty_placeholder() {
        let (mut tl, _) = timeline(FakeTransport::with(0));
        tl.load("c1").await;
        tl.receive_live(msg("first", 9.0, "bob"));
        assert_eq!(tl.view().rows, VecDeque::from(vec![Row::Message("first".into())]));
    }

    fn wire_channel(tl: &mut Timeline<RecordingView>) -> mpsc::UnboundedReceiver<OutboundFrame> {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (_ev_tx, ev_rx) = mpsc::unbounded_channel();
        let ticket = tl.ticket();
        let handle = ChannelHandle::from_parts("c1", out_tx, ev_rx);
        assert!(tl.attach_channel(ticket, Ok(handle)).is_some());
        out_rx
    }

    #[tokio::test]
    async fn send_skips_blank_and_unconnected() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        assert_eq!(tl.send("hi"), SendOutcome::Skipped);
        tl.load("c1").await;
        assert_eq!(tl.send("hi"), SendOutcome::Skipped);
        let mut out = wire_channel(&mut tl);
        assert_eq!(tl.send(""), SendOutcome::Skipped);
        assert_eq!(tl.send("   "), SendOutcome::Skipped);
        assert!(out.try_recv().is_err());
        assert_eq!(tl.view().input_cleared, 0);
    }

    #[tokio::test]
    async fn send_transmits_without_local_echo() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        tl.load("c1").await;
        let mut out = wire_channel(&mut tl);
        let start = crate::utils::now_secs();
        assert_eq!(tl.send("hi"), SendOutcome::Sent);
        let OutboundFrame::Text(text) = out.try_recv().unwrap() else {
            panic!("expected a text frame");
        };
        let sent: OutboundMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(sent.content, "hi");
        assert!(sent.timestamp >= start && sent.timestamp <= crate::utils::now_secs());
        assert_eq!(tl.view().ids(), vec!["m1"]);
        assert_eq!(tl.view().input_cleared, 1);
    }

    #[tokio::test]
    async fn send_failure_alerts_and_still_clears_input() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        tl.load("c1").await;
        let out = wire_channel(&mut tl);
        drop(out);
        assert_eq!(tl.send("hi"), SendOutcome::Failed);
        assert_eq!(tl.view().alerts, vec![SEND_FAILED.to_string()]);
        assert_eq!(tl.view().input_cleared, 1);
    }

    #[tokio::test]
    async fn reselect_closes_channel_and_stale_channel_is_closed() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        tl.load("c1").await;
        let mut out = wire_channel(&mut tl);
        let stale = tl.request_channel().unwrap();
        tl.load("c2").await;
        assert!(!tl.has_channel());
        assert_eq!(out.try_recv().unwrap(), OutboundFrame::Close);

        let (late_tx, mut late_rx) = mpsc::unbounded_channel();
        let (_ev_tx, ev_rx) = mpsc::unbounded_channel();
        let late = ChannelHandle::from_parts("c1", late_tx, ev_rx);
        assert!(tl.attach_channel(stale.ticket, Ok(late)).is_none());
        assert_eq!(late_rx.try_recv().unwrap(), OutboundFrame::Close);
    }

    #[tokio::test]
    async fn connect_failure_alerts() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        tl.load("c1").await;
        assert!(tl.connect().await.is_none());
        assert_eq!(tl.view().alerts, vec![CONNECT_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn closed_event_drops_channel() {
        let (mut tl, _) = timeline(FakeTransport::with(1));
        tl.load("c1").await;
        let _out = wire_channel(&mut tl);
        let ticket = tl.ticket();
        let rejected = ChannelEvent::ServerError("Unauthorized access to conversation".into());
        tl.handle_event(ticket, rejected);
        assert_eq!(tl.view().alerts.len(), 1);
        tl.handle_event(ticket, ChannelEvent::Closed);
        assert!(!tl.has_channel());
        assert_eq!(tl.send("hi"), SendOutcome::Skipped);
    }

    #[test]
    fn own_messages_are_flagged() {
        let (tl, _) = timeline(FakeTransport::with(0));
        let mine = msg("a", 1.0, "alice");
        let theirs = msg("b", 1.0, "bob");
        assert!(tl.entry(&mine).own);
        assert!(!tl.entry(&theirs).own);
    }
}
