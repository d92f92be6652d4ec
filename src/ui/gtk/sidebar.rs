use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4 as gtk;

use crate::api::models::Conversation;

pub struct Sidebar {
    root: gtk::Box,
    list: gtk::ListBox,
    items: Rc<RefCell<Vec<Conversation>>>,
}

impl Sidebar {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let title = gtk::Label::new(Some("Conversations"));
        title.add_css_class("heading");
        title.set_halign(gtk::Align::Start);
        root.append(&title);

        let list = gtk::ListBox::new();
        list.set_selection_mode(gtk::SelectionMode::Single);
        root.append(&list);

        Self {
            root,
            list,
            items: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn set_items(&self, items: Vec<Conversation>) {
        while let Some(child) = self.list.first_child() {
            self.list.remove(&child);
        }
        if items.is_empty() {
            let empty = gtk::Label::new(Some("No conversations yet"));
            empty.add_css_class("dim-label");
            self.list.append(&empty);
        }
        for conv in &items {
            let row = gtk::ListBoxRow::new();
            let body = gtk::Box::new(gtk::Orientation::Vertical, 2);
            body.set_margin_top(8);
            body.set_margin_bottom(8);
            body.set_margin_start(8);
            body.set_margin_end(8);
            let name = gtk::Label::new(Some(&conv.name));
            name.set_halign(gtk::Align::Start);
            let count = gtk::Label::new(Some(&conv.member_summary()));
            count.add_css_class("dim-label");
            count.set_halign(gtk::Align::Start);
            body.append(&name);
            body.append(&count);
            row.set_child(Some(&body));
            self.list.append(&row);
        }
        *self.items.borrow_mut() = items;
    }

    /// Calls `f` with the conversation behind an activated row.
    pub fn connect_selected<F: Fn(Conversation) + 'static>(&self, f: F) {
        let items = self.items.clone();
        self.list.connect_row_activated(move |_, row| {
            let picked = usize::try_from(row.index())
                .ok()
                .and_then(|i| items.borrow().get(i).cloned());
            if let Some(conv) = picked {
                f(conv);
            }
        });
    }
}
