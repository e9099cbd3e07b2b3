//! Issue-tracker abstractions (Redmine today).

pub mod port;
pub mod types;
