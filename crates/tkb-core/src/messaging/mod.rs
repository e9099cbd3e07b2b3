//! Cross-messenger abstractions (Slack today; the loop only sees the port).

pub mod port;
pub mod throttled;
pub mod types;
