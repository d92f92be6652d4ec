use std::rc::Rc;

use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;

use crate::api::models::RegisterRequest;
use crate::api::ApiClient;
use crate::session::Session;
use crate::ui::gtk::Settings;
use crate::utils::run_async_to_main;

pub fn show_login_window(app: &Application, settings: Rc<Settings>) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Chatter Login")
        .default_width(420)
        .default_height(320)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Sign in to Chatter"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server = gtk::Label::new(Some(&settings.state.borrow().api_url));
    server.add_css_class("dim-label");
    server.set_halign(gtk::Align::Start);
    root.append(&server);

    let name_entry = gtk::Entry::new();
    name_entry.set_placeholder_text(Some("Full name (registration only)"));
    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Username"));
    if let Some(username) = settings.state.borrow().username.as_deref() {
        user_entry.set_text(username);
    }
    let pass_entry = gtk::PasswordEntry::new();
    pass_entry.set_placeholder_text(Some("Password"));

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&name_entry);
    form.append(&user_entry);
    form.append(&pass_entry);
    root.append(&form);

    let status = gtk::Label::new(None);
    status.add_css_class("dim-label");
    status.set_halign(gtk::Align::Start);
    root.append(&status);

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 8);
    buttons.set_halign(gtk::Align::End);
    let register_btn = gtk::Button::with_label("Register");
    let login_btn = gtk::Button::with_label("Log in");
    login_btn.add_css_class("suggested-action");
    buttons.append(&register_btn);
    buttons.append(&login_btn);
    root.append(&buttons);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    header.set_title_widget(Some(&gtk::Label::new(Some("Chatter"))));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_login = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let user_entry = user_entry.clone();
        let pass_entry = pass_entry.clone();
        let status = status.clone();
        let login_btn = login_btn.clone();
        let settings = settings.clone();
        move || {
            let username = user_entry.text().trim().to_string();
            let password = pass_entry.text().to_string();
            if username.is_empty() || password.is_empty() {
                overlay.add_toast(adw::Toast::new("Username and password are required"));
                return;
            }
            status.set_label("Logging in…");
            login_btn.set_sensitive(false);

            let mut state = settings.state.borrow().clone();
            let app = app.clone();
            let window = window.clone();
            let overlay = overlay.clone();
            let status = status.clone();
            let login_btn = login_btn.clone();
            let settings = settings.clone();
            run_async_to_main(
                async move {
                    let res = Session::login(&mut state, &username, &password).await;
                    (state, res)
                },
                move |(state, res)| {
                    login_btn.set_sensitive(true);
                    match res {
                        Ok(session) => {
                            *settings.state.borrow_mut() = state;
                            if let Err(e) = settings.save() {
                                let text = format!("Failed to save settings: {e}");
                                overlay.add_toast(adw::Toast::new(&text));
                            }
                            crate::ui::gtk::main_window::show_main_window(&app, session, settings);
                            window.close();
                        }
                        Err(err) => {
                            log::warn!("Login failed: {err}");
                            status.set_label("Login failed");
                            overlay.add_toast(adw::Toast::new(&err.to_string()));
                        }
                    }
                },
            );
        }
    };

    let on_register = {
        let overlay = toast_overlay.clone();
        let status = status.clone();
        let settings = settings.clone();
        let name_entry = name_entry.clone();
        let user_entry = user_entry.clone();
        let pass_entry = pass_entry.clone();
        move || {
            let request = RegisterRequest {
                name: name_entry.text().trim().to_string(),
                username: user_entry.text().trim().to_string(),
                password: pass_entry.text().to_string(),
            };
            if let Err(e) = request.validate() {
                overlay.add_toast(adw::Toast::new(&e.to_string()));
                return;
            }
            status.set_label("Registering…");
            let endpoints = settings.state.borrow().endpoints();
            let overlay = overlay.clone();
            let status = status.clone();
            run_async_to_main(
                async move { ApiClient::new(&endpoints)?.register(&request).await },
                move |res| match res {
                    Ok(user) => status.set_label(&format!(
                        "Registration successful! Log in as {}.",
                        user.username
                    )),
                    Err(err) => {
                        status.set_label("Registration failed");
                        overlay.add_toast(adw::Toast::new(&err.to_string()));
                    }
                },
            );
        }
    };

    let on_login: Rc<dyn Fn()> = Rc::new(on_login);
    {
        let on_login = on_login.clone();
        login_btn.connect_clicked(move |_| (on_login)());
    }
    {
        let on_login = on_login.clone();
        pass_entry.connect_activate(move |_| (on_login)());
    }
    register_btn.connect_clicked(move |_| on_register());

    window.present();
}
