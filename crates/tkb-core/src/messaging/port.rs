use async_trait::async_trait;

use crate::{
    domain::{ChannelId, ChatUserId},
    messaging::types::{IncomingEvent, MessagingCapabilities, UserProfile},
    Result,
};

/// Cross-messenger port.
///
/// Connecting is the adapter's constructor; once a value exists it is connected.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// The relay's own chat identity, when the transport reports one.
    fn bot_user_id(&self) -> Option<ChatUserId>;

    /// Next batch of raw events; an empty batch means "nothing yet".
    async fn poll(&self) -> Result<Vec<IncomingEvent>>;

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()>;

    async fn lookup_user_profile(&self, user: &ChatUserId) -> Result<UserProfile>;
}
