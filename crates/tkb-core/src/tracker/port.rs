use async_trait::async_trait;

use crate::{
    domain::IssueId,
    tracker::types::{Issue, IssueChanges, IssueFilter, IssueStatus, NewIssue},
    Result,
};

/// Hexagonal port for the issue tracker.
///
/// Every call is a network round trip; implementations map a missing issue to
/// `Error::NotFound`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch one issue. With `include_children` the direct child ids are populated.
    async fn get_issue(&self, id: IssueId, include_children: bool) -> Result<Issue>;

    async fn list_statuses(&self) -> Result<Vec<IssueStatus>>;

    /// All issues matching `filter` (every page).
    async fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    async fn create_issue(&self, new: &NewIssue) -> Result<Issue>;

    /// Persist the changed fields of an existing issue.
    async fn save_issue(&self, id: IssueId, changes: &IssueChanges) -> Result<()>;
}
