//! Decoding of RTM websocket frames into transport events.

use tokio_tungstenite::tungstenite::{self, Message as WsMessage};

use tkb_core::{errors::Error, messaging::types::IncomingEvent, Result};

/// `Ok(None)` for frames that carry no event (control frames, non-JSON payloads).
pub(crate) fn decode_frame(message: WsMessage) -> Result<Option<IncomingEvent>> {
    match message {
        WsMessage::Text(text) => Ok(parse_event(&text)),
        WsMessage::Binary(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(parse_event(text)),
            Err(e) => {
                tracing::warn!(error = %e, "skipping non-utf8 slack frame");
                Ok(None)
            }
        },
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => Ok(None),
        WsMessage::Close(frame) => Err(Error::Disconnected(match frame {
            Some(frame) => format!(
                "slack closed the websocket: {} {}",
                frame.code,
                frame.reason.as_str()
            ),
            None => "slack closed the websocket".to_string(),
        })),
    }
}

fn parse_event(text: &str) -> Option<IncomingEvent> {
    match serde_json::from_str::<IncomingEvent>(text) {
        Ok(event) => {
            tracing::trace!(event_type = ?event.event_type, "slack frame");
            Some(event)
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping unparseable slack frame");
            None
        }
    }
}

pub(crate) fn map_ws_error(e: tungstenite::Error) -> Error {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            Error::Disconnected("slack websocket closed".into())
        }
        other => Error::Transport(format!("slack websocket error: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use tkb_core::domain::ChatUserId;

    use super::*;

    #[test]
    fn text_message_frame_becomes_event() {
        let frame = WsMessage::text(
            r#"{"type":"message","channel":"C1","user":"U5","text":"issue 4821","ts":"1.2"}"#,
        );
        let event = decode_frame(frame).unwrap().unwrap();
        let msg = event.as_message().unwrap();
        assert_eq!(msg.sender, ChatUserId("U5".into()));
        assert_eq!(msg.text, "issue 4821");
    }

    #[test]
    fn hello_is_decoded_but_not_a_message() {
        let event = decode_frame(WsMessage::text(r#"{"type":"hello"}"#))
            .unwrap()
            .unwrap();
        assert!(event.as_message().is_none());
    }

    #[test]
    fn garbage_and_control_frames_are_skipped() {
        assert!(decode_frame(WsMessage::text("not json")).unwrap().is_none());
        assert!(decode_frame(WsMessage::binary(vec![0xff, 0xfe]))
            .unwrap()
            .is_none());
        assert!(decode_frame(WsMessage::Ping(Default::default()))
            .unwrap()
            .is_none());
    }

    #[test]
    fn close_frame_is_a_disconnect() {
        let err = decode_frame(WsMessage::Close(None)).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn closed_connection_error_is_a_disconnect() {
        assert!(map_ws_error(tungstenite::Error::ConnectionClosed).is_fatal());
        let tls = std::io::Error::other("tls alert");
        assert!(!map_ws_error(tungstenite::Error::Io(tls)).is_fatal());
    }
}
