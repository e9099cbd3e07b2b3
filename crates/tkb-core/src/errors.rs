/// Core error type for the ticket bot.
///
/// Adapter crates map their specific errors into this type so the poll loop
/// can handle failures consistently (chat reply vs log-and-continue vs fatal).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport disconnected: {0}")]
    Disconnected(String),

    #[error("tracker error: {0}")]
    Tracker(String),
}

impl Error {
    pub fn issue_not_found(id: impl std::fmt::Display) -> Self {
        Error::NotFound {
            kind: "issue",
            id: id.to_string(),
        }
    }

    /// Chat-facing text for errors the sender can act on. `None` means log only.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Error::NotFound { kind, id } => {
                let mut kind = kind.to_string();
                if let Some(first) = kind.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                Some(format!("{kind} *{id}* not found."))
            }
            Error::Validation(msg) => Some(format!("Rejected by tracker: {msg}")),
            _ => None,
        }
    }

    /// Errors that end the poll loop instead of being logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Disconnected(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
