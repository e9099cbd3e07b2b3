//! Chat command matcher: text -> `Command` via an ordered list of patterns.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::domain::IssueId;

/// A classified chat command with its captured parameters.
///
/// Name parameters (`status`, `user`) are lowercased; free text keeps the sender's casing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    IssueInfo { issue_id: IssueId },
    SetStatus { issue_id: IssueId, status: String },
    Assign { issue_id: IssueId, user: String },
    AssignSelf { issue_id: IssueId },
    SetSubject { issue_id: IssueId, subject: String },
    AddNote { issue_id: IssueId, note: String },
    AddChild { issue_id: IssueId, subject: String },
    ListIssues { user: String },
    ListOwnIssues,
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Help,
    IssueLink,
    SetStatus,
    Assign,
    AssignSelf,
    SetSubject,
    AddNote,
    AddChild,
    IssueInfo,
    ListIssues,
    ListOwnIssues,
}

/// Precedence order: first match wins.
const PATTERNS: &[(Kind, &str)] = &[
    (Kind::Help, r"^help$"),
    (Kind::IssueLink, r"/issues/(?P<issue_id>\d{3,6})(?:\D|$)"),
    (Kind::SetStatus, r"^issue (?P<issue_id>\d{3,6}) status (?P<param>\S.*)$"),
    (Kind::Assign, r"^issue (?P<issue_id>\d{3,6}) assign (?P<param>\S.*)$"),
    (Kind::AssignSelf, r"^issue (?P<issue_id>\d{3,6}) assign$"),
    (Kind::SetSubject, r"^issue (?P<issue_id>\d{3,6}) subject (?P<param>\S.*)$"),
    (Kind::AddNote, r"^issue (?P<issue_id>\d{3,6}) note (?P<param>\S.*)$"),
    (Kind::AddChild, r"^issue (?P<issue_id>\d{3,6}) add (?P<param>\S.*)$"),
    (Kind::IssueInfo, r"^issue (?P<issue_id>\d{3,6})$"),
    (Kind::ListIssues, r"^issues (?P<param>\S.*)$"),
    (Kind::ListOwnIssues, r"^issues$"),
];

fn compiled() -> &'static [(Kind, Regex)] {
    static COMPILED: OnceLock<Vec<(Kind, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|(kind, pattern)| {
                // Case-insensitive matching classifies exactly like matching lowercased text.
                let re = Regex::new(&format!("(?is){pattern}")).expect("valid command regex");
                (*kind, re)
            })
            .collect()
    })
}

/// Classify a chat message. `None` means "not for us": no reply is sent.
pub fn match_command(text: &str) -> Option<Command> {
    let text = text.trim();
    compiled()
        .iter()
        .find_map(|(kind, re)| build(*kind, &re.captures(text)?))
}

fn build(kind: Kind, caps: &Captures<'_>) -> Option<Command> {
    let issue_id = || caps.name("issue_id")?.as_str().parse::<IssueId>().ok();
    let param = || caps.name("param").map(|m| m.as_str().trim().to_string());
    let name_param = || param().map(|p| p.to_lowercase());

    Some(match kind {
        Kind::Help => Command::Help,
        Kind::IssueLink | Kind::IssueInfo => Command::IssueInfo {
            issue_id: issue_id()?,
        },
        Kind::SetStatus => Command::SetStatus {
            issue_id: issue_id()?,
            status: name_param()?,
        },
        Kind::Assign => Command::Assign {
            issue_id: issue_id()?,
            user: name_param()?,
        },
        Kind::AssignSelf => Command::AssignSelf {
            issue_id: issue_id()?,
        },
        Kind::SetSubject => Command::SetSubject {
            issue_id: issue_id()?,
            subject: param()?,
        },
        Kind::AddNote => Command::AddNote {
            issue_id: issue_id()?,
            note: param()?,
        },
        Kind::AddChild => Command::AddChild {
            issue_id: issue_id()?,
            subject: param()?,
        },
        Kind::ListIssues => Command::ListIssues { user: name_param()? },
        Kind::ListOwnIssues => Command::ListOwnIssues,
    })
}
