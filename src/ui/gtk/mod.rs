//! GTK front end, built with `--features gtk`.

pub mod chat_view;
pub mod login;
pub mod main_window;
pub mod sidebar;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use adw::prelude::*;
use adw::Application;

use crate::app::AppState;
use crate::session::{self, Session};
use crate::utils::run_async_to_main;

/// Settings shared by the windows of one process.
pub struct Settings {
    pub state: RefCell<AppState>,
    path: Option<PathBuf>,
}

impl Settings {
    pub fn save(&self) -> Result<(), crate::app::StateError> {
        self.state.borrow().save(self.path.as_deref())
    }

    pub fn forget_token(&self) {
        session::logout(&mut self.state.borrow_mut());
        if let Err(e) = self.save() {
            log::error!("Failed to save settings: {e}");
        }
    }
}

pub fn run(state: AppState, path: Option<PathBuf>) -> glib::ExitCode {
    let settings = Rc::new(Settings {
        state: RefCell::new(state),
        path,
    });
    let app = Application::builder()
        .application_id("io.chatter.Client")
        .build();
    app.connect_activate(move |app| build_ui(app, settings.clone()));
    // Arguments were already handled by clap.
    app.run_with_args::<&str>(&[])
}

fn build_ui(app: &Application, settings: Rc<Settings>) {
    let state = settings.state.borrow().clone();
    if state.token.is_none() {
        login::show_login_window(app, settings);
        return;
    }

    let guard = app.hold();
    let app = app.clone();
    run_async_to_main(async move { Session::resume(&state).await }, move |res| {
        match res {
            Ok(session) => main_window::show_main_window(&app, session, settings),
            Err(err) => {
                log::warn!("Could not resume session: {err}");
                if err.is_unauthorized() {
                    settings.forget_token();
                }
                login::show_login_window(&app, settings);
            }
        }
        drop(guard);
    });
}
