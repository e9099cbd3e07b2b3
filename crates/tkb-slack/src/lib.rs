//! Slack adapter.
//!
//! Implements the `tkb-core` MessagingPort over the Slack Web API plus the RTM
//! websocket event stream.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::{net::TcpStream, sync::Mutex, time::timeout};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use tkb_core::{
    config::Config,
    domain::{ChannelId, ChatUserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{IncomingEvent, MessagingCapabilities, UserProfile},
    },
    Result,
};

mod api;
mod rtm;

use api::SlackApiClient;

/// How long one `poll` waits for a frame before reporting an empty batch.
const READ_WAIT: Duration = Duration::from_millis(250);

/// Slack accepts far longer texts, but messages past this are unreadable in a channel.
const MAX_MESSAGE_LEN: usize = 4000;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct SlackMessenger {
    api: SlackApiClient,
    bot_user: ChatUserId,
    socket: Mutex<Socket>,
}

impl SlackMessenger {
    /// Authenticate, open the RTM websocket and learn the bot's own user id.
    pub async fn connect(cfg: &Config) -> Result<Self> {
        let api = SlackApiClient::new(
            &cfg.slack_api_base,
            &cfg.slack_bot_token,
            cfg.request_timeout,
        )?;
        let session = api.rtm_connect().await?;
        let (socket, _response) = connect_async(session.url.as_str())
            .await
            .map_err(|e| Error::Transport(format!("slack websocket connect failed: {e}")))?;

        tracing::info!(bot_user = %session.bot_user, "connected to slack rtm");
        Ok(Self {
            api,
            bot_user: session.bot_user,
            socket: Mutex::new(socket),
        })
    }
}

#[async_trait]
impl MessagingPort for SlackMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    fn bot_user_id(&self) -> Option<ChatUserId> {
        Some(self.bot_user.clone())
    }

    async fn poll(&self) -> Result<Vec<IncomingEvent>> {
        let mut socket = self.socket.lock().await;
        let frame = match timeout(READ_WAIT, socket.next()).await {
            Err(_elapsed) => return Ok(Vec::new()),
            Ok(None) => return Err(Error::Disconnected("slack websocket stream ended".into())),
            Ok(Some(frame)) => frame.map_err(rtm::map_ws_error)?,
        };
        Ok(rtm::decode_frame(frame)?.into_iter().collect())
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()> {
        self.api.post_message(channel, text).await
    }

    async fn lookup_user_profile(&self, user: &ChatUserId) -> Result<UserProfile> {
        self.api.user_info(user).await
    }
}
