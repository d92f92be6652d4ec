use adw::prelude::*;
use gtk4 as gtk;

use crate::timeline::{Entry, Placeholder, Presentation};
use crate::utils::format_clock;

/// The message pane: header, scrolled rows with a load-older button on top,
/// and the input row.
#[derive(Clone)]
pub struct ChatView {
    root: gtk::Box,
    title: gtk::Label,
    members: gtk::Label,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    older_btn: gtk::Button,
    entry: gtk::Entry,
    send_btn: gtk::Button,
    toasts: adw::ToastOverlay,
}

fn message_row(entry: &Entry<'_>) -> gtk::Widget {
    let row = gtk::Box::new(gtk::Orientation::Vertical, 2);
    row.set_halign(if entry.own { gtk::Align::End } else { gtk::Align::Start });
    row.add_css_class(if entry.own { "sent" } else { "received" });
    if !entry.own {
        let sender = gtk::Label::new(Some(&entry.message.sender.name));
        sender.add_css_class("caption-heading");
        sender.set_halign(gtk::Align::Start);
        row.append(&sender);
    }
    let content = gtk::Label::new(Some(&entry.message.content));
    content.set_wrap(true);
    content.set_selectable(true);
    content.set_xalign(0.0);
    row.append(&content);
    let time = gtk::Label::new(Some(&format_clock(entry.message.timestamp)));
    time.add_css_class("dim-label");
    time.add_css_class("caption");
    time.set_halign(gtk::Align::End);
    row.append(&time);
    row.upcast()
}

impl ChatView {
    pub fn new(toasts: &adw::ToastOverlay) -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Select a conversation to start chatting"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        let members = gtk::Label::new(None);
        members.add_css_class("dim-label");
        members.set_halign(gtk::Align::Start);
        root.append(&title);
        root.append(&members);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        let older_btn = gtk::Button::with_label("Load older messages");
        older_btn.add_css_class("flat");
        older_btn.set_visible(false);
        messages_box.append(&older_btn);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self {
            root,
            title,
            members,
            scroller,
            messages_box,
            older_btn,
            entry,
            send_btn,
            toasts: toasts.clone(),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_header(&self, name: &str, members: &str) {
        self.title.set_label(name);
        self.members.set_label(&format!("Members: {members}"));
    }

    pub fn input_text(&self) -> String {
        self.entry.text().to_string()
    }

    pub fn connect_send<F: Fn() + 'static>(&self, f: F) {
        let f = std::rc::Rc::new(f);
        {
            let f = f.clone();
            self.send_btn.connect_clicked(move |_| f());
        }
        self.entry.connect_activate(move |_| f());
    }

    pub fn connect_older<F: Fn() + 'static>(&self, f: F) {
        self.older_btn.connect_clicked(move |_| f());
    }
}

impl Presentation for ChatView {
    fn clear(&mut self) {
        let older: &gtk::Widget = self.older_btn.upcast_ref();
        let mut child = self.messages_box.first_child();
        while let Some(widget) = child {
            child = widget.next_sibling();
            if &widget != older {
                self.messages_box.remove(&widget);
            }
        }
        self.older_btn.set_visible(false);
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        let label = gtk::Label::new(Some(placeholder.text()));
        label.add_css_class("dim-label");
        label.set_vexpand(true);
        self.messages_box.append(&label);
    }

    fn append(&mut self, entry: Entry<'_>) {
        self.messages_box.append(&message_row(&entry));
    }

    fn prepend(&mut self, entries: &[Entry<'_>]) {
        let adj = self.scroller.vadjustment();
        let (old_upper, old_value) = (adj.upper(), adj.value());
        let mut anchor: gtk::Widget = self.older_btn.clone().upcast();
        for entry in entries {
            let row = message_row(entry);
            self.messages_box.insert_child_after(&row, Some(&anchor));
            anchor = row;
        }
        // Keep the rows the user was reading where they were once the new
        // ones have been measured.
        glib::idle_add_local_once(move || {
            adj.set_value(old_value + (adj.upper() - old_upper));
        });
    }

    fn set_load_older(&mut self, visible: bool) {
        self.older_btn.set_visible(visible);
    }

    fn scroll_to_newest(&mut self) {
        let adj = self.scroller.vadjustment();
        glib::idle_add_local_once(move || {
            adj.set_value(adj.upper() - adj.page_size());
        });
    }

    fn clear_input(&mut self) {
        self.entry.set_text("");
    }

    fn alert(&mut self, text: &str) {
        self.toasts.add_toast(adw::Toast::new(text));
    }
}
