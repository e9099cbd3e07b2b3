//! Executes a matched `Command` against the tracker and renders the reply.
//!
//! Every mutation is fetch -> save -> re-fetch -> render, so the reply shows what the
//! tracker accepted rather than what we asked for.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    commands::Command,
    directory::UserDirectory,
    domain::{IssueId, TrackerUserId},
    errors::Error,
    formatting::{help_text, issue_repr, issue_repr_detailed, render_issue_list},
    messaging::types::UserProfile,
    tracker::{
        port::IssueTracker,
        types::{Issue, IssueChanges, IssueFilter, NewIssue},
    },
    utils::note_timestamp,
    Result,
};

pub struct CommandHandler {
    tracker: Arc<dyn IssueTracker>,
    directory: UserDirectory,
}

impl CommandHandler {
    pub fn new(tracker: Arc<dyn IssueTracker>, directory: UserDirectory) -> Self {
        Self { tracker, directory }
    }

    pub async fn handle(&self, command: Command, caller: &UserProfile) -> Result<String> {
        self.handle_at(command, caller, Utc::now()).await
    }

    /// Same as `handle` with an explicit clock for note attribution.
    pub async fn handle_at(
        &self,
        command: Command,
        caller: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<String> {
        match command {
            Command::Help => Ok(help_text()),
            Command::IssueInfo { issue_id } => self.issue_info(issue_id).await,
            Command::SetStatus { issue_id, status } => self.set_status(issue_id, &status).await,
            Command::Assign { issue_id, user } => {
                let target = self.directory.resolve_name(&user);
                self.assign(issue_id, target).await
            }
            Command::AssignSelf { issue_id } => {
                let target = self.directory.resolve_profile(caller);
                self.assign(issue_id, target).await
            }
            Command::SetSubject { issue_id, subject } => {
                self.tracker.get_issue(issue_id, false).await?;
                self.save_and_render(
                    issue_id,
                    IssueChanges {
                        subject: Some(subject),
                        ..IssueChanges::default()
                    },
                )
                .await
            }
            Command::AddNote { issue_id, note } => {
                self.add_note(issue_id, &note, caller, now).await
            }
            Command::AddChild { issue_id, subject } => self.add_child(issue_id, subject).await,
            Command::ListIssues { user } => {
                let target = self.directory.resolve_name(&user);
                self.list_issues(target).await
            }
            Command::ListOwnIssues => {
                let target = self.directory.resolve_profile(caller);
                self.list_issues(target).await
            }
        }
    }

    async fn issue_info(&self, issue_id: IssueId) -> Result<String> {
        let issue = self.tracker.get_issue(issue_id, true).await?;
        let children = self.fetch_children(&issue).await?;
        Ok(issue_repr_detailed(&issue, &children))
    }

    async fn fetch_children(&self, issue: &Issue) -> Result<Vec<Issue>> {
        let mut children = Vec::with_capacity(issue.children.len());
        for child in &issue.children {
            children.push(self.tracker.get_issue(*child, false).await?);
        }
        Ok(children)
    }

    async fn set_status(&self, issue_id: IssueId, status_name: &str) -> Result<String> {
        self.tracker.get_issue(issue_id, false).await?;
        let statuses = self.tracker.list_statuses().await?;

        let wanted = status_name.trim().to_lowercase();
        let Some(status) = statuses.iter().find(|s| s.name.to_lowercase() == wanted) else {
            let names = statuses
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Ok(format!("Unknown status, possible: {names}"));
        };

        self.save_and_render(
            issue_id,
            IssueChanges {
                status: Some(status.id),
                ..IssueChanges::default()
            },
        )
        .await
    }

    async fn assign(&self, issue_id: IssueId, target: Option<TrackerUserId>) -> Result<String> {
        self.tracker.get_issue(issue_id, false).await?;
        let Some(user) = target else {
            return Ok(self.unknown_user());
        };
        self.save_and_render(
            issue_id,
            IssueChanges {
                assigned_to: Some(user),
                ..IssueChanges::default()
            },
        )
        .await
    }

    async fn add_note(
        &self,
        issue_id: IssueId,
        note: &str,
        caller: &UserProfile,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let issue = self.tracker.get_issue(issue_id, false).await?;
        let description = append_note(&issue.description, &caller.display_name, now, note);
        self.tracker
            .save_issue(
                issue_id,
                &IssueChanges {
                    description: Some(description),
                    ..IssueChanges::default()
                },
            )
            .await?;
        Ok(format!("Note added to issue *{issue_id}*."))
    }

    async fn add_child(&self, parent_id: IssueId, subject: String) -> Result<String> {
        let parent = self.tracker.get_issue(parent_id, false).await?;
        let project = parent
            .project
            .as_ref()
            .ok_or_else(|| Error::Tracker(format!("issue {parent_id} has no project")))?;

        let child = self
            .tracker
            .create_issue(&NewIssue {
                project: project.id,
                subject,
                parent: Some(parent_id),
                assigned_to: parent.assigned_to.as_ref().map(|a| a.id),
            })
            .await?;
        tracing::info!(parent = %parent_id, child = ?child.id, "created child issue");

        self.issue_info(parent_id).await
    }

    async fn list_issues(&self, target: Option<TrackerUserId>) -> Result<String> {
        let Some(user) = target else {
            return Ok(self.unknown_user());
        };
        let issues = self
            .tracker
            .filter_issues(&IssueFilter::open_assigned_to(user))
            .await?;
        Ok(render_issue_list(&issues))
    }

    async fn save_and_render(&self, issue_id: IssueId, changes: IssueChanges) -> Result<String> {
        self.tracker.save_issue(issue_id, &changes).await?;
        let issue = self.tracker.get_issue(issue_id, false).await?;
        Ok(issue_repr(&issue))
    }

    fn unknown_user(&self) -> String {
        format!(
            "Unknown user, possible: {}",
            self.directory.known_names().join(", ")
        )
    }
}

/// Description with an attributed note block appended.
pub fn append_note(description: &str, author: &str, at: DateTime<Utc>, note: &str) -> String {
    let block = format!("*Note from {author} ({}):*\n{note}", note_timestamp(at));
    if description.trim().is_empty() {
        block
    } else {
        format!("{}\n\n{block}", description.trim_end())
    }
}
