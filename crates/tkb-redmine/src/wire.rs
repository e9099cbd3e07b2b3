//! Redmine REST JSON shapes (only the fields the bot reads or writes).

use serde::{Deserialize, Serialize};

use tkb_core::{
    domain::{IssueId, ProjectId, StatusId, TrackerUserId},
    tracker::types::{Issue, IssueChanges, IssueStatus, NamedRef, NewIssue},
};

#[derive(Debug, Deserialize)]
pub(crate) struct IssueEnvelope {
    pub issue: RedmineIssue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuesPage {
    #[serde(default)]
    pub issues: Vec<RedmineIssue>,
    #[serde(default)]
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusesEnvelope {
    pub issue_statuses: Vec<IssueStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorsEnvelope {
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdName {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdOnly {
    pub id: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RedmineIssue {
    pub id: u32,
    #[serde(default)]
    pub project: Option<IdName>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IdName>,
    #[serde(default)]
    pub assigned_to: Option<IdName>,
    #[serde(default)]
    pub parent: Option<IdOnly>,
    /// Direct children only; Redmine nests grandchildren inside each entry.
    #[serde(default)]
    pub children: Vec<IdOnly>,
}

fn named<Id>(r: IdName, id: impl Fn(u32) -> Id) -> NamedRef<Id> {
    NamedRef {
        id: id(r.id),
        name: r.name,
    }
}

impl From<RedmineIssue> for Issue {
    fn from(r: RedmineIssue) -> Self {
        Issue {
            id: Some(IssueId(r.id)),
            project: r.project.map(|p| named(p, ProjectId)),
            subject: r.subject,
            description: r.description.unwrap_or_default(),
            status: r.status.map(|s| named(s, StatusId)),
            assigned_to: r.assigned_to.map(|u| named(u, TrackerUserId)),
            parent: r.parent.map(|p| IssueId(p.id)),
            children: r.children.into_iter().map(|c| IssueId(c.id)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct IssuePayload<'a> {
    pub issue: IssueFields<'a>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct IssueFields<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<StatusId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<TrackerUserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_issue_id: Option<IssueId>,
}

impl<'a> From<&'a NewIssue> for IssuePayload<'a> {
    fn from(n: &'a NewIssue) -> Self {
        IssuePayload {
            issue: IssueFields {
                project_id: Some(n.project),
                subject: Some(&n.subject),
                assigned_to_id: n.assigned_to,
                parent_issue_id: n.parent,
                ..IssueFields::default()
            },
        }
    }
}

impl<'a> From<&'a IssueChanges> for IssuePayload<'a> {
    fn from(c: &'a IssueChanges) -> Self {
        IssuePayload {
            issue: IssueFields {
                subject: c.subject.as_deref(),
                description: c.description.as_deref(),
                status_id: c.status,
                assigned_to_id: c.assigned_to,
                ..IssueFields::default()
            },
        }
    }
}
