pub mod api;
pub mod app;
pub mod session;
pub mod timeline;
pub mod ui;
pub mod utils;
