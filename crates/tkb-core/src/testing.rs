//! In-memory fakes of both ports for unit tests.

use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{ChannelId, ChatUserId, IssueId, ProjectId, StatusId, TrackerUserId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{IncomingEvent, MessagingCapabilities, UserProfile},
    },
    tracker::{
        port::IssueTracker,
        types::{Issue, IssueChanges, IssueFilter, IssueStatus, NamedRef, NewIssue, StatusFilter},
    },
    Result,
};

pub const STATUSES: &[(u32, &str, bool)] = &[
    (1, "New", false),
    (2, "In Progress", false),
    (4, "Feedback", false),
    (5, "Closed", true),
];

pub const USERS: &[(u32, &str)] = &[(5, "Alice"), (7, "Bob"), (9, "Carol")];

fn status_ref(name: &str) -> NamedRef<StatusId> {
    let id = STATUSES
        .iter()
        .find(|(_, n, _)| *n == name)
        .map(|(id, _, _)| *id)
        .unwrap_or(99);
    NamedRef {
        id: StatusId(id),
        name: name.to_string(),
    }
}

fn user_ref(id: TrackerUserId) -> Option<NamedRef<TrackerUserId>> {
    USERS
        .iter()
        .find(|(uid, _)| *uid == id.0)
        .map(|(_, name)| NamedRef {
            id,
            name: name.to_string(),
        })
}

pub fn issue(
    id: u32,
    subject: &str,
    status: &str,
    assignee: Option<&str>,
    parent: Option<u32>,
) -> Issue {
    Issue {
        id: Some(IssueId(id)),
        project: Some(NamedRef {
            id: ProjectId(1),
            name: "Website".to_string(),
        }),
        subject: subject.to_string(),
        description: String::new(),
        status: Some(status_ref(status)),
        assigned_to: assignee.map(|name| {
            let id = USERS
                .iter()
                .find(|(_, n)| *n == name)
                .map(|(id, _)| *id)
                .unwrap_or(1);
            NamedRef {
                id: TrackerUserId(id),
                name: name.to_string(),
            }
        }),
        parent: parent.map(IssueId),
        children: Vec::new(),
    }
}

pub fn profile(
    id: &str,
    display_name: &str,
    first_name: Option<&str>,
    email: Option<&str>,
) -> UserProfile {
    UserProfile {
        id: ChatUserId(id.to_string()),
        display_name: display_name.to_string(),
        first_name: first_name.map(str::to_string),
        email: email.map(str::to_string),
    }
}

// ============== Tracker ==============

#[derive(Default)]
struct TrackerState {
    issues: BTreeMap<IssueId, Issue>,
    saves: Vec<(IssueId, IssueChanges)>,
    created: Vec<NewIssue>,
    filters: Vec<IssueFilter>,
    next_id: u32,
    broken: HashSet<IssueId>,
}

#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn with_issues(issues: impl IntoIterator<Item = Issue>) -> Self {
        let mut state = TrackerState {
            next_id: 9000,
            ..TrackerState::default()
        };
        for i in issues {
            if let Some(id) = i.id {
                state.issues.insert(id, i);
            }
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Any `get_issue` of this id fails with a tracker error.
    pub fn break_issue(&self, id: u32) {
        self.state.lock().unwrap().broken.insert(IssueId(id));
    }

    pub fn stored(&self, id: u32) -> Issue {
        self.state.lock().unwrap().issues[&IssueId(id)].clone()
    }

    pub fn saves(&self) -> Vec<(IssueId, IssueChanges)> {
        self.state.lock().unwrap().saves.clone()
    }

    pub fn created(&self) -> Vec<NewIssue> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn filters(&self) -> Vec<IssueFilter> {
        self.state.lock().unwrap().filters.clone()
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get_issue(&self, id: IssueId, include_children: bool) -> Result<Issue> {
        let state = self.state.lock().unwrap();
        if state.broken.contains(&id) {
            return Err(Error::Tracker(format!("HTTP 500 fetching issue {id}")));
        }
        let mut issue = state
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::issue_not_found(id))?;
        if include_children {
            issue.children = state
                .issues
                .values()
                .filter(|i| i.parent == Some(id))
                .filter_map(|i| i.id)
                .collect();
        }
        Ok(issue)
    }

    async fn list_statuses(&self) -> Result<Vec<IssueStatus>> {
        Ok(STATUSES
            .iter()
            .map(|(id, name, closed)| IssueStatus {
                id: StatusId(*id),
                name: name.to_string(),
                is_closed: *closed,
            })
            .collect())
    }

    async fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut state = self.state.lock().unwrap();
        state.filters.push(filter.clone());
        let closed: HashSet<u32> = STATUSES
            .iter()
            .filter(|(_, _, c)| *c)
            .map(|(id, _, _)| *id)
            .collect();
        Ok(state
            .issues
            .values()
            .filter(|i| match filter.assigned_to {
                Some(user) => i.assigned_to.as_ref().map(|a| a.id) == Some(user),
                None => true,
            })
            .filter(|i| {
                let status = i.status.as_ref().map(|s| s.id.0).unwrap_or(1);
                match filter.status {
                    StatusFilter::Open => !closed.contains(&status),
                    StatusFilter::Closed => closed.contains(&status),
                    StatusFilter::Any => true,
                    StatusFilter::Id(id) => id.0 == status,
                }
            })
            .cloned()
            .collect())
    }

    async fn create_issue(&self, new: &NewIssue) -> Result<Issue> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = IssueId(state.next_id);
        let issue = Issue {
            id: Some(id),
            project: Some(NamedRef {
                id: new.project,
                name: "Website".to_string(),
            }),
            subject: new.subject.clone(),
            description: String::new(),
            status: Some(status_ref("New")),
            assigned_to: new.assigned_to.and_then(user_ref),
            parent: new.parent,
            children: Vec::new(),
        };
        state.created.push(new.clone());
        state.issues.insert(id, issue.clone());
        Ok(issue)
    }

    async fn save_issue(&self, id: IssueId, changes: &IssueChanges) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.saves.push((id, changes.clone()));
        let issue = state
            .issues
            .get_mut(&id)
            .ok_or_else(|| Error::issue_not_found(id))?;
        if let Some(subject) = &changes.subject {
            issue.subject = subject.clone();
        }
        if let Some(description) = &changes.description {
            issue.description = description.clone();
        }
        if let Some(status) = changes.status {
            let name = STATUSES
                .iter()
                .find(|(sid, _, _)| *sid == status.0)
                .map(|(_, n, _)| n.to_string())
                .unwrap_or_default();
            issue.status = Some(NamedRef { id: status, name });
        }
        if let Some(user) = changes.assigned_to {
            issue.assigned_to = user_ref(user);
        }
        Ok(())
    }
}

// ============== Messenger ==============

#[derive(Default)]
struct MessengerState {
    batches: VecDeque<Result<Vec<IncomingEvent>>>,
    sent: Vec<(ChannelId, String)>,
    profiles: HashMap<ChatUserId, UserProfile>,
    profile_lookups: usize,
    failing_channels: HashSet<ChannelId>,
}

#[derive(Default)]
pub struct FakeMessenger {
    state: Mutex<MessengerState>,
    bot_user: Option<ChatUserId>,
    stop_when_drained: Option<CancellationToken>,
}

impl FakeMessenger {
    /// Serves `batches` in order, then cancels `stop` and keeps returning empty batches.
    pub fn scripted(
        batches: Vec<Result<Vec<IncomingEvent>>>,
        bot_user: Option<&str>,
        stop: CancellationToken,
    ) -> Self {
        Self {
            state: Mutex::new(MessengerState {
                batches: batches.into(),
                ..MessengerState::default()
            }),
            bot_user: bot_user.map(|u| ChatUserId(u.to_string())),
            stop_when_drained: Some(stop),
        }
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.id.clone(), profile);
    }

    pub fn fail_sends_to(&self, channel: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_channels
            .insert(ChannelId(channel.to_string()));
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, t)| t).collect()
    }

    pub fn profile_lookups(&self) -> usize {
        self.state.lock().unwrap().profile_lookups
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: 200,
        }
    }

    fn bot_user_id(&self) -> Option<ChatUserId> {
        self.bot_user.clone()
    }

    async fn poll(&self) -> Result<Vec<IncomingEvent>> {
        let next = self.state.lock().unwrap().batches.pop_front();
        match next {
            Some(batch) => batch,
            None => {
                if let Some(stop) = &self.stop_when_drained {
                    stop.cancel();
                }
                Ok(Vec::new())
            }
        }
    }

    async fn send_text(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_channels.contains(channel) {
            return Err(Error::Transport(format!("channel_not_found: {channel}")));
        }
        state.sent.push((channel.clone(), text.to_string()));
        Ok(())
    }

    async fn lookup_user_profile(&self, user: &ChatUserId) -> Result<UserProfile> {
        let mut state = self.state.lock().unwrap();
        state.profile_lookups += 1;
        Ok(state
            .profiles
            .get(user)
            .cloned()
            .unwrap_or_else(|| profile(&user.0, &user.0, None, None)))
    }
}
