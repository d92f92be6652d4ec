use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

use crate::api::models::{Conversation, Message, RegisterRequest, User};
use crate::api::{ApiClient, ApiError, ChannelEvent, ChannelHandle};
use crate::app::AppState;
use crate::session::{self, Session};
use crate::timeline::{Entry, Placeholder, Presentation, Ticket, Timeline};
use crate::ui::commands::{self, Command, HELP};
use crate::utils::format_clock;

/// Renders a timeline as plain lines.
///
/// A terminal cannot insert above what it already printed, so older pages
/// are printed as a delimited block instead.
pub struct ConsoleView<W: Write> {
    out: W,
    /// Message rows printed since the last rule.
    rows: bool,
}

impl ConsoleView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleView<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: false }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            log::warn!("Console write failed: {e}");
        }
    }
}

pub fn format_entry(entry: &Entry<'_>) -> String {
    let who = if entry.own { "you" } else { entry.message.sender.name.as_str() };
    format!("[{}] {}: {}", format_clock(entry.message.timestamp), who, entry.message.content)
}

impl<W: Write> Presentation for ConsoleView<W> {
    fn clear(&mut self) {
        if std::mem::take(&mut self.rows) {
            self.line("----------------------------------------");
        }
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.line(&format!("  ({})", placeholder.text()));
    }

    fn append(&mut self, entry: Entry<'_>) {
        self.rows = true;
        self.line(&format_entry(&entry));
    }

    fn prepend(&mut self, entries: &[Entry<'_>]) {
        self.rows = true;
        self.line("  -- earlier messages --");
        for entry in entries {
            self.line(&format_entry(entry));
        }
        self.line("  -- end of earlier messages --");
    }

    fn set_load_older(&mut self, visible: bool) {
        if visible {
            self.line("  [/older loads earlier messages]");
        }
    }

    fn scroll_to_newest(&mut self) {}

    fn clear_input(&mut self) {}

    fn alert(&mut self, text: &str) {
        self.line(&format!("! {text}"));
    }
}

enum Completion {
    Loaded(Ticket, Result<Vec<Message>, ApiError>),
    Older(Ticket, Result<Vec<Message>, ApiError>),
    Channel(Ticket, Result<ChannelHandle, ApiError>),
    Event(Ticket, ChannelEvent),
}

/// The interactive line client.
pub struct Console<W: Write = io::Stdout> {
    state: AppState,
    config_path: Option<PathBuf>,
    session: Option<Session>,
    timeline: Option<Timeline<ConsoleView<W>>>,
    conversations: Vec<Conversation>,
    users: Vec<User>,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    /// Work started for the current selection.
    tasks: Vec<AbortHandle>,
}

fn say(text: impl AsRef<str>) {
    println!("{}", text.as_ref());
}

impl Console {
    pub fn new(state: AppState, config_path: Option<PathBuf>) -> Self {
        Self::empty(state, config_path)
    }

    pub async fn run(mut self) -> io::Result<()> {
        if self.state.token.is_some() {
            match Session::resume(&self.state).await {
                Ok(session) => {
                    say(format!("Signed in as {}", session.user().username));
                    self.start_session(session);
                    self.list().await;
                }
                Err(e) => self.report(e),
            }
        }
        if self.session.is_none() {
            self.check_server().await;
            say("Not signed in. Use /login or /register, /help for more.");
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line).await {
                            break;
                        }
                    }
                    None => break,
                },
                Some(done) = self.rx.recv() => self.complete(done),
            }
        }
        self.shutdown();
        Ok(())
    }

    async fn check_server(&self) {
        let reply = match ApiClient::new(&self.state.endpoints()) {
            Ok(client) => client.health().await,
            Err(e) => Err(e),
        };
        match reply {
            Ok(health) => log::info!("Server at {} is {}", self.state.api_url, health.status),
            Err(e) => {
                log::warn!("Health check failed: {e}");
                say(format!("! Server {} is not reachable", self.state.api_url));
            }
        }
    }

    fn start_session(&mut self, session: Session) {
        self.timeline = Some(session.timeline(ConsoleView::stdout()));
        self.session = Some(session);
    }

    /// Returns `false` when the user asked to quit.
    async fn handle_line(&mut self, line: &str) -> bool {
        let cmd = match commands::parse(line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return true,
            Err(usage) => {
                say(usage);
                return true;
            }
        };
        match cmd {
            Command::Login { username, password } => self.login(&username, &password).await,
            Command::Register { name, username, password } => {
                self.register(RegisterRequest { name, username, password }).await
            }
            Command::Logout => self.logout(),
            Command::List => self.list().await,
            Command::Open(key) => self.open(&key),
            Command::Older => self.older(),
            Command::Users => self.users().await,
            Command::New { name, members } => self.create(&name, &members).await,
            Command::Help => say(HELP),
            Command::Quit => return false,
            Command::Say(text) => self.send(&text),
        }
        true
    }

    async fn login(&mut self, username: &str, password: &str) {
        self.shutdown();
        match Session::login(&mut self.state, username, password).await {
            Ok(session) => {
                self.persist();
                say(format!("Signed in as {}", session.user().username));
                self.start_session(session);
                self.list().await;
            }
            Err(e) => say(format!("! Login failed: {e}")),
        }
    }

    async fn register(&mut self, request: RegisterRequest) {
        let client = match ApiClient::new(&self.state.endpoints()) {
            Ok(client) => client,
            Err(e) => return say(format!("! {e}")),
        };
        match client.register(&request).await {
            Ok(user) => say(format!(
                "Registration successful! Please /login {} <password>",
                user.username
            )),
            Err(e) => say(format!("! Registration failed: {e}")),
        }
    }

    fn logout(&mut self) {
        self.shutdown();
        self.session = None;
        self.timeline = None;
        self.conversations.clear();
        session::logout(&mut self.state);
        self.persist();
        say("Signed out.");
    }

    async fn list(&mut self) {
        let Some(client) = self.client() else { return };
        match client.conversations().await {
            Ok(conversations) => {
                self.conversations = conversations;
                if self.conversations.is_empty() {
                    say("No conversations yet");
                }
                for (i, conv) in self.conversations.iter().enumerate() {
                    say(format!("{:>3}. {} ({})", i + 1, conv.name, conv.member_summary()));
                }
            }
            Err(e) => {
                log::error!("Error loading conversations: {e}");
                say("! Failed to load conversations");
                if e.is_unauthorized() {
                    self.report(e);
                }
            }
        }
    }

    fn find_conversation(&self, key: &str) -> Option<Conversation> {
        if let Ok(n) = key.parse::<usize>() {
            if let Some(conv) = n.checked_sub(1).and_then(|i| self.conversations.get(i)) {
                return Some(conv.clone());
            }
        }
        self.conversations.iter().find(|c| c.id == key).cloned()
    }

    fn open(&mut self, key: &str) {
        let Some(conversation) = self.find_conversation(key) else {
            return say(format!("! No conversation {key}, try /list"));
        };
        self.select(&conversation);
    }

    async fn users(&mut self) {
        let Some(client) = self.client() else { return };
        match client.users().await {
            Ok(users) => {
                let me = self.session.as_ref().map(|s| s.user().id.clone());
                self.users = users
                    .into_iter()
                    .filter(|u| Some(&u.id) != me.as_ref())
                    .collect();
                if self.users.is_empty() {
                    say("No other users available");
                }
                for user in &self.users {
                    say(format!("  {} ({}) [{}]", user.name, user.username, user.id));
                }
            }
            Err(e) => {
                log::error!("Error loading users: {e}");
                say("! Failed to load users");
                if e.is_unauthorized() {
                    self.report(e);
                }
            }
        }
    }

    async fn create(&mut self, name: &str, members: &[String]) {
        let Some(client) = self.client() else { return };
        if self.users.is_empty() {
            if let Ok(users) = client.users().await {
                self.users = users;
            }
        }
        // Accept usernames as well as ids.
        let member_ids: Vec<String> = members
            .iter()
            .map(|m| {
                self.users
                    .iter()
                    .find(|u| &u.username == m)
                    .map(|u| u.id.clone())
                    .unwrap_or_else(|| m.clone())
            })
            .collect();
        match client.create_conversation(name, member_ids).await {
            Ok(conversation) => {
                say(format!("Created {}", conversation.name));
                self.list().await;
                self.select(&conversation);
            }
            Err(e) => {
                log::error!("Error creating conversation: {e}");
                say("! Failed to create conversation. Please try again.");
                if e.is_unauthorized() {
                    self.report(e);
                }
            }
        }
    }
}

impl<W: Write> Console<W> {
    fn empty(state: AppState, config_path: Option<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state,
            config_path,
            session: None,
            timeline: None,
            conversations: Vec::new(),
            users: Vec::new(),
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.state.save(self.config_path.as_deref()) {
            log::error!("Failed to save settings: {e}");
            say(format!("! Failed to save settings: {e}"));
        }
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Keeps `task` abortable and forgets the ones that already ended.
    fn track(&mut self, task: AbortHandle) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }

    fn shutdown(&mut self) {
        self.abort_tasks();
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.close();
        }
    }

    /// Prints an error; a rejected token ends the session.
    fn report(&mut self, err: ApiError) {
        if err.is_unauthorized() {
            self.shutdown();
            self.session = None;
            self.timeline = None;
            session::logout(&mut self.state);
            self.persist();
            say("! Session expired - please /login again");
        } else {
            say(format!("! {err}"));
        }
    }

    fn client(&self) -> Option<Arc<ApiClient>> {
        match &self.session {
            Some(session) => Some(Arc::clone(session.client())),
            None => {
                say("! Please /login first");
                None
            }
        }
    }

    fn select(&mut self, conversation: &Conversation) {
        self.abort_tasks();
        let Some(timeline) = self.timeline.as_mut() else {
            return say("! Please /login first");
        };
        say(format!("== {} ==", conversation.name));
        say(format!("Members: {}", conversation.member_names()));

        let request = timeline.select(&conversation.id);
        let transport = timeline.transport();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let result = transport
                .fetch_messages(&request.conversation_id, request.query)
                .await;
            let _ = tx.send(Completion::Loaded(request.ticket, result));
        });
        self.track(task.abort_handle());
    }

    fn older(&mut self) {
        let Some(timeline) = self.timeline.as_mut() else {
            return say("! Please /login first");
        };
        let Some(request) = timeline.request_older() else {
            return say("  (nothing older to load)");
        };
        let transport = timeline.transport();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let result = transport
                .fetch_messages(&request.conversation_id, request.query)
                .await;
            let _ = tx.send(Completion::Older(request.ticket, result));
        });
        self.track(task.abort_handle());
    }

    fn send(&mut self, text: &str) {
        let Some(timeline) = self.timeline.as_mut() else {
            return say("! Please /login first");
        };
        if timeline.conversation_id().is_none() {
            return say("! Open a conversation first (/list, /open)");
        }
        timeline.send(text);
    }

    fn complete(&mut self, done: Completion) {
        let Some(timeline) = self.timeline.as_mut() else {
            return;
        };
        match done {
            Completion::Loaded(ticket, result) => {
                let expired = matches!(result, Err(ApiError::Unauthorized));
                timeline.finish_load(ticket, result);
                if expired {
                    return self.report(ApiError::Unauthorized);
                }
                if let Some(request) = timeline.request_channel().filter(|r| r.ticket == ticket) {
                    let transport = timeline.transport();
                    let tx = self.tx.clone();
                    let task = tokio::spawn(async move {
                        let result = transport.open_channel(&request.conversation_id).await;
                        let _ = tx.send(Completion::Channel(request.ticket, result));
                    });
                    self.track(task.abort_handle());
                }
            }
            Completion::Older(ticket, result) => {
                timeline.finish_older(ticket, result);
            }
            Completion::Channel(ticket, result) => {
                if let Some(mut events) = timeline.attach_channel(ticket, result) {
                    let tx = self.tx.clone();
                    let task = tokio::spawn(async move {
                        while let Some(event) = events.recv().await {
                            if tx.send(Completion::Event(ticket, event)).is_err() {
                                break;
                            }
                        }
                    });
                    self.track(task.abort_handle());
                }
            }
            Completion::Event(ticket, event) => timeline.handle_event(ticket, event),
        }
    }
}
