use async_trait::async_trait;

use crate::api::channel::ChannelHandle;
use crate::api::models::{Message, MessageQuery};
use crate::api::ApiError;

/// What a conversation timeline needs from the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// One page of history, in whatever order the server returns it.
    async fn fetch_messages(
        &self,
        conversation_id: &str,
        query: MessageQuery,
    ) -> Result<Vec<Message>, ApiError>;

    async fn open_channel(&self, conversation_id: &str) -> Result<ChannelHandle, ApiError>;
}
