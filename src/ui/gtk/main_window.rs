use std::cell::RefCell;
use std::rc::{Rc, Weak};

use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use tokio::task::AbortHandle;

use crate::api::models::{Conversation, Message};
use crate::api::{ApiError, ChannelHandle};
use crate::session::Session;
use crate::timeline::{Ticket, Timeline};
use crate::ui::gtk::chat_view::ChatView;
use crate::ui::gtk::sidebar::Sidebar;
use crate::ui::gtk::Settings;
use crate::utils::run_async_to_main;

/// Everything the main window's handlers share.
struct Shell {
    app: Application,
    window: adw::ApplicationWindow,
    overlay: adw::ToastOverlay,
    sidebar: Sidebar,
    chat: ChatView,
    timeline: RefCell<Timeline<ChatView>>,
    /// Work started for the current selection.
    tasks: RefCell<Vec<AbortHandle>>,
    session: Session,
    settings: Rc<Settings>,
}

impl Shell {
    fn toast(&self, text: &str) {
        self.overlay.add_toast(adw::Toast::new(text));
    }

    fn abort_tasks(&self) {
        for task in self.tasks.borrow_mut().drain(..) {
            task.abort();
        }
    }

    fn sign_out(&self) {
        self.abort_tasks();
        self.timeline.borrow_mut().close();
        self.settings.forget_token();
        crate::ui::gtk::login::show_login_window(&self.app, self.settings.clone());
        self.window.close();
    }

    fn report(&self, context: &str, err: ApiError) {
        log::error!("{context}: {err}");
        if err.is_unauthorized() {
            self.sign_out();
        } else {
            self.toast(&format!("{context}: {err}"));
        }
    }
}

fn refresh_conversations(shell: &Rc<Shell>, then_select: Option<Conversation>) {
    let client = shell.session.client().clone();
    let weak = Rc::downgrade(shell);
    run_async_to_main(async move { client.conversations().await }, move |res| {
        let Some(shell) = weak.upgrade() else { return };
        match res {
            Ok(items) => shell.sidebar.set_items(items),
            Err(err) => return shell.report("Failed to load conversations", err),
        }
        if let Some(conv) = then_select {
            select(&shell, &conv);
        }
    });
}

fn select(shell: &Rc<Shell>, conv: &Conversation) {
    shell.abort_tasks();
    shell.chat.set_header(&conv.name, &conv.member_names());
    let request = shell.timeline.borrow_mut().select(&conv.id);
    let transport = shell.timeline.borrow().transport();
    let ticket = request.ticket;
    let weak = Rc::downgrade(shell);
    let task = run_async_to_main(
        async move {
            transport
                .fetch_messages(&request.conversation_id, request.query)
                .await
        },
        move |result| {
            if let Some(shell) = weak.upgrade() {
                on_loaded(&shell, ticket, result);
            }
        },
    );
    shell.tasks.borrow_mut().push(task);
}

fn on_loaded(shell: &Rc<Shell>, ticket: Ticket, result: Result<Vec<Message>, ApiError>) {
    let expired = matches!(result, Err(ApiError::Unauthorized));
    let request = {
        let mut timeline = shell.timeline.borrow_mut();
        timeline.finish_load(ticket, result);
        timeline.request_channel().filter(|r| r.ticket == ticket)
    };
    if expired {
        return shell.sign_out();
    }
    let Some(request) = request else { return };
    let transport = shell.timeline.borrow().transport();
    let weak = Rc::downgrade(shell);
    let task = run_async_to_main(
        async move { transport.open_channel(&request.conversation_id).await },
        move |result| {
            if let Some(shell) = weak.upgrade() {
                on_channel(&shell, ticket, result);
            }
        },
    );
    shell.tasks.borrow_mut().push(task);
}

fn on_channel(shell: &Rc<Shell>, ticket: Ticket, result: Result<ChannelHandle, ApiError>) {
    let Some(mut events) = shell.timeline.borrow_mut().attach_channel(ticket, result) else {
        return;
    };
    let weak: Weak<Shell> = Rc::downgrade(shell);
    glib::spawn_future_local(async move {
        while let Some(event) = events.recv().await {
            let Some(shell) = weak.upgrade() else { break };
            shell.timeline.borrow_mut().handle_event(ticket, event);
        }
    });
}

fn load_older(shell: &Rc<Shell>) {
    let Some(request) = shell.timeline.borrow_mut().request_older() else {
        return;
    };
    let transport = shell.timeline.borrow().transport();
    let ticket = request.ticket;
    let weak = Rc::downgrade(shell);
    let task = run_async_to_main(
        async move {
            transport
                .fetch_messages(&request.conversation_id, request.query)
                .await
        },
        move |result| {
            if let Some(shell) = weak.upgrade() {
                shell.timeline.borrow_mut().finish_older(ticket, result);
            }
        },
    );
    shell.tasks.borrow_mut().push(task);
}

pub fn show_main_window(app: &Application, session: Session, settings: Rc<Settings>) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Chatter")
        .default_width(960)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();

    let split = adw::Flap::builder()
        .reveal_flap(true)
        .locked(true)
        .modal(false)
        .build();

    let sidebar = Sidebar::new();
    split.set_flap(Some(&sidebar.widget()));

    let chat = ChatView::new(&overlay);
    split.set_content(Some(&chat.widget()));

    overlay.set_child(Some(&split));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    header.set_title_widget(Some(&gtk::Label::new(Some(&session.user().username))));

    let new_chat_btn = gtk::Button::with_label("New Chat");
    new_chat_btn.add_css_class("suggested-action");
    let logout_btn = gtk::Button::with_label("Log out");
    header.pack_end(&new_chat_btn);
    header.pack_start(&logout_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));

    let timeline = RefCell::new(session.timeline(chat.clone()));
    let shell = Rc::new(Shell {
        app: app.clone(),
        window: window.clone(),
        overlay,
        sidebar,
        chat,
        timeline,
        tasks: RefCell::new(Vec::new()),
        session,
        settings,
    });

    {
        let weak = Rc::downgrade(&shell);
        shell.sidebar.connect_selected(move |conv| {
            if let Some(shell) = weak.upgrade() {
                select(&shell, &conv);
            }
        });
    }
    {
        let weak = Rc::downgrade(&shell);
        shell.chat.connect_older(move || {
            if let Some(shell) = weak.upgrade() {
                load_older(&shell);
            }
        });
    }
    {
        let weak = Rc::downgrade(&shell);
        shell.chat.connect_send(move || {
            if let Some(shell) = weak.upgrade() {
                let text = shell.chat.input_text();
                shell.timeline.borrow_mut().send(&text);
            }
        });
    }
    {
        let weak = Rc::downgrade(&shell);
        logout_btn.connect_clicked(move |_| {
            if let Some(shell) = weak.upgrade() {
                shell.sign_out();
            }
        });
    }
    {
        let weak = Rc::downgrade(&shell);
        new_chat_btn.connect_clicked(move |_| {
            if let Some(shell) = weak.upgrade() {
                show_new_chat_dialog(&shell);
            }
        });
    }
    {
        // The window owns the shell; it goes away with it.
        let shell = shell.clone();
        window.connect_close_request(move |_| {
            shell.abort_tasks();
            shell.timeline.borrow_mut().close();
            glib::Propagation::Proceed
        });
    }

    window.present();
    refresh_conversations(&shell, None);
}

fn show_new_chat_dialog(shell: &Rc<Shell>) {
    let dialog = gtk::Dialog::builder()
        .title("Start New Conversation")
        .transient_for(&shell.window)
        .modal(true)
        .build();
    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_margin_top(12);
    content.set_margin_bottom(12);
    content.set_margin_start(12);
    content.set_margin_end(12);

    let name_entry = gtk::Entry::new();
    name_entry.set_placeholder_text(Some("Conversation name"));
    name_entry.set_hexpand(true);
    content.append(&name_entry);

    let users_box = gtk::Box::new(gtk::Orientation::Vertical, 4);
    users_box.append(&gtk::Label::new(Some("Loading users...")));
    content.append(&users_box);

    dialog.set_child(Some(&content));
    let _ = dialog.add_button("Cancel", gtk::ResponseType::Cancel);
    let ok_btn = dialog.add_button("Create", gtk::ResponseType::Ok);
    ok_btn.add_css_class("suggested-action");
    dialog.set_default_response(gtk::ResponseType::Ok);

    // (user id, checkbox) for everyone but the signed in user.
    let checks: Rc<RefCell<Vec<(String, gtk::CheckButton)>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let client = shell.session.client().clone();
        let me = shell.session.user().id.clone();
        let users_box = users_box.clone();
        let checks = checks.clone();
        run_async_to_main(async move { client.users().await }, move |res| {
            while let Some(child) = users_box.first_child() {
                users_box.remove(&child);
            }
            let users = match res {
                Ok(users) => users,
                Err(err) => {
                    log::error!("Error loading users: {err}");
                    users_box.append(&gtk::Label::new(Some("Failed to load users")));
                    return;
                }
            };
            for user in users.into_iter().filter(|u| u.id != me) {
                let label = format!("{} ({})", user.name, user.username);
                let check = gtk::CheckButton::with_label(&label);
                users_box.append(&check);
                checks.borrow_mut().push((user.id, check));
            }
            if checks.borrow().is_empty() {
                users_box.append(&gtk::Label::new(Some("No other users available")));
            }
        });
    }

    let weak = Rc::downgrade(shell);
    dialog.connect_response(move |dlg, resp| {
        let Some(shell) = weak.upgrade() else { return dlg.close() };
        if resp != gtk::ResponseType::Ok {
            return dlg.close();
        }
        let name = name_entry.text().trim().to_string();
        if name.is_empty() {
            return shell.toast("Please enter a conversation name");
        }
        let member_ids: Vec<String> = checks
            .borrow()
            .iter()
            .filter(|(_, check)| check.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        if member_ids.is_empty() {
            return shell.toast("Please select at least one user");
        }

        let client = shell.session.client().clone();
        let weak = Rc::downgrade(&shell);
        run_async_to_main(
            async move { client.create_conversation(&name, member_ids).await },
            move |res| {
                let Some(shell) = weak.upgrade() else { return };
                match res {
                    Ok(conv) => refresh_conversations(&shell, Some(conv)),
                    Err(err) => shell.report("Failed to create conversation", err),
                }
            },
        );
        dlg.close();
    });

    dialog.present();
}
