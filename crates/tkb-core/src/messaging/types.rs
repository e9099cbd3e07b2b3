use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChatUserId};

pub const MESSAGE_EVENT: &str = "message";

/// Raw transport event as delivered by the chat service.
///
/// Every field is optional: the stream carries hellos, presence changes, edits and
/// other noise next to the plain messages we act on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel: Option<ChannelId>,
    #[serde(default)]
    pub user: Option<ChatUserId>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A plain chat message with every field the handler needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub channel: ChannelId,
    pub sender: ChatUserId,
    pub text: String,
    pub event_type: String,
}

impl IncomingEvent {
    pub fn message(channel: &str, user: &str, text: &str) -> Self {
        Self {
            event_type: Some(MESSAGE_EVENT.to_string()),
            subtype: None,
            channel: Some(ChannelId(channel.to_string())),
            user: Some(ChatUserId(user.to_string())),
            text: Some(text.to_string()),
        }
    }

    /// `Some` only for plain message events that name a sender, a channel and a text.
    pub fn as_message(&self) -> Option<IncomingMessage> {
        let event_type = self.event_type.as_deref()?;
        let sender = self.user.clone()?;
        if event_type != MESSAGE_EVENT || self.subtype.is_some() {
            return None;
        }
        Some(IncomingMessage {
            channel: self.channel.clone()?,
            sender,
            text: self.text.clone()?,
            event_type: event_type.to_string(),
        })
    }
}

/// Chat user profile used for self-assignment and note attribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: ChatUserId,
    pub display_name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// Limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_accepted() {
        let ev: IncomingEvent = serde_json::from_str(
            r#"{"type":"message","channel":"C1","user":"U1","text":"issue 4821","ts":"1.2"}"#,
        )
        .unwrap();
        let msg = ev.as_message().unwrap();
        assert_eq!(msg.channel, ChannelId("C1".into()));
        assert_eq!(msg.sender, ChatUserId("U1".into()));
        assert_eq!(msg.text, "issue 4821");
    }

    #[test]
    fn missing_type_or_sender_is_skipped() {
        let mut ev = IncomingEvent::message("C1", "U1", "help");
        ev.event_type = None;
        assert!(ev.as_message().is_none());

        let mut ev = IncomingEvent::message("C1", "U1", "help");
        ev.user = None;
        assert!(ev.as_message().is_none());
    }

    #[test]
    fn subtypes_and_other_events_are_skipped() {
        let mut ev = IncomingEvent::message("C1", "U1", "help");
        ev.subtype = Some("message_changed".into());
        assert!(ev.as_message().is_none());

        let hello: IncomingEvent = serde_json::from_str(r#"{"type":"hello"}"#).unwrap();
        assert!(hello.as_message().is_none());
    }
}
