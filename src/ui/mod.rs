pub mod commands;
pub mod console;
#[cfg(feature = "gtk")]
pub mod gtk;
