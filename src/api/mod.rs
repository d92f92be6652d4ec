pub mod channel;
pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod transport;

pub use channel::{ChannelHandle, OutboundFrame};
pub use client::{ApiClient, Endpoints};
pub use error::ApiError;
pub use events::ChannelEvent;
pub use transport::Transport;
