use serde::{Deserialize, Serialize};

use crate::domain::{IssueId, ProjectId, StatusId, TrackerUserId};

/// A record the tracker references by id and reports with its display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef<Id> {
    pub id: Id,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issue {
    /// Absent until the tracker has assigned one.
    pub id: Option<IssueId>,
    pub project: Option<NamedRef<ProjectId>>,
    pub subject: String,
    pub description: String,
    /// Absent on an issue whose status was never set.
    pub status: Option<NamedRef<StatusId>>,
    pub assigned_to: Option<NamedRef<TrackerUserId>>,
    pub parent: Option<IssueId>,
    pub children: Vec<IssueId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub id: StatusId,
    pub name: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    Open,
    Closed,
    Any,
    Id(StatusId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueFilter {
    pub assigned_to: Option<TrackerUserId>,
    pub status: StatusFilter,
}

impl IssueFilter {
    pub fn open_assigned_to(user: TrackerUserId) -> Self {
        Self {
            assigned_to: Some(user),
            status: StatusFilter::Open,
        }
    }
}

/// Fields of an issue to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIssue {
    pub project: ProjectId,
    pub subject: String,
    pub parent: Option<IssueId>,
    pub assigned_to: Option<TrackerUserId>,
}

/// Changed fields of an existing issue; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueChanges {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<StatusId>,
    pub assigned_to: Option<TrackerUserId>,
}

impl IssueChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
