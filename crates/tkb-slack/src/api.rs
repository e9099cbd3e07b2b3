//! Slack Web API calls the relay needs: `rtm.connect`, `chat.postMessage`, `users.info`.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use tkb_core::{
    domain::{ChannelId, ChatUserId},
    errors::Error,
    messaging::types::UserProfile,
    Result,
};

/// Every Web API response: `ok` plus either an `error` code or the method's fields.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    data: T,
}

#[derive(Debug, Deserialize)]
struct RtmConnect {
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "self", default)]
    me: Option<RtmSelf>,
}

#[derive(Debug, Deserialize)]
struct RtmSelf {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Ack {}

#[derive(Debug, Deserialize)]
struct UsersInfo {
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackProfile {
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<SlackUser> for UserProfile {
    fn from(user: SlackUser) -> Self {
        let display_name = non_empty(user.profile.real_name)
            .or_else(|| non_empty(user.real_name))
            .unwrap_or(user.name);
        UserProfile {
            id: ChatUserId(user.id),
            display_name,
            first_name: non_empty(user.profile.first_name),
            email: non_empty(user.profile.email),
        }
    }
}

/// Result of `rtm.connect`: where to open the websocket and who we are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RtmSession {
    pub url: String,
    pub bot_user: ChatUserId,
}

#[derive(Clone, Debug)]
pub(crate) struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl SlackApiClient {
    pub(crate) fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("slack http client: {e}")))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    fn get(&self, method: &str) -> RequestBuilder {
        self.http
            .get(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.token)
    }

    fn post(&self, method: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.token)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, req: RequestBuilder) -> Result<T> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(format!("slack {method} request error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("slack {method} failed: {status}")));
        }
        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|e| Error::Transport(format!("slack {method} json error: {e}")))?;
        if !envelope.ok {
            return Err(Error::Transport(format!(
                "slack {method} failed: {}",
                envelope.error.as_deref().unwrap_or("unknown error")
            )));
        }
        Ok(envelope.data)
    }

    pub(crate) async fn rtm_connect(&self) -> Result<RtmSession> {
        let data: RtmConnect = self.call("rtm.connect", self.get("rtm.connect")).await?;
        let url = non_empty(data.url)
            .ok_or_else(|| Error::Transport("slack rtm.connect did not return url".into()))?;
        let bot_user = data
            .me
            .map(|me| ChatUserId(me.id))
            .ok_or_else(|| Error::Transport("slack rtm.connect did not return self".into()))?;
        Ok(RtmSession { url, bot_user })
    }

    pub(crate) async fn post_message(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let payload = json!({
            "channel": channel.0,
            "text": text,
            "mrkdwn": true,
        });
        let _: Ack = self
            .call("chat.postMessage", self.post("chat.postMessage").json(&payload))
            .await?;
        Ok(())
    }

    pub(crate) async fn user_info(&self, user: &ChatUserId) -> Result<UserProfile> {
        let req = self.get("users.info").query(&[("user", user.0.as_str())]);
        let data: UsersInfo = self.call("users.info", req).await?;
        data.user
            .map(UserProfile::from)
            .ok_or_else(|| Error::Transport(format!("slack users.info returned no user {user}")))
    }
}
