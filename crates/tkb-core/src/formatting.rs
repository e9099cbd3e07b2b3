//! Chat reply rendering (Slack mrkdwn: `*bold*`, `_italic_`).

use std::collections::HashSet;

use crate::{domain::IssueId, tracker::types::Issue};

pub const NO_ISSUES_FOUND: &str = "No issues found.";
const CHILD_PREFIX: &str = "\n    > ";

/// `*{id}*: _{subject}_ *{status}* {assignee}`.
pub fn issue_repr(issue: &Issue) -> String {
    let id = issue
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "Not saved".to_string());
    let status = issue.status.as_ref().map(|s| s.name.as_str()).unwrap_or("New");
    let assignee = match &issue.assigned_to {
        Some(user) => format!("(assigned to {})", user.name),
        None => "(unassigned)".to_string(),
    };
    format!("*{id}*: _{}_ *{status}* {assignee}", issue.subject)
}

/// Issue line followed by one indented line per child.
pub fn issue_repr_detailed(issue: &Issue, children: &[Issue]) -> String {
    let mut out = issue_repr(issue);
    for child in children {
        out.push_str(CHILD_PREFIX);
        out.push_str(&issue_repr(child));
    }
    out
}

pub fn help_text() -> String {
    [
        "*help* - show help",
        "*issue <issue_id>* - show issue info (a link to the issue works too)",
        "*issue <issue_id> status <status>* - change issue status",
        "*issue <issue_id> assign <user_name>* - change issue assignee",
        "*issue <issue_id> assign* - assign issue to yourself",
        "*issue <issue_id> subject <text>* - change issue subject",
        "*issue <issue_id> note <text>* - add a note to the issue description",
        "*issue <issue_id> add <subject>* - create a child issue",
        "*issues <user_name>* - list open issues of a user",
        "*issues* - list your open issues",
    ]
    .join("\n")
}

/// Open issues of one user split for display.
#[derive(Debug, Default)]
pub struct IssuePartition<'a> {
    /// Issues without a parent.
    pub stories: Vec<&'a Issue>,
    /// Issues whose parent is not part of the same result set.
    pub standalone: Vec<&'a Issue>,
}

/// Split a result set into stories and standalone tickets.
///
/// Issues whose parent is in the set are shown under that parent and appear in neither list.
pub fn partition_issues(issues: &[Issue]) -> IssuePartition<'_> {
    let ids: HashSet<IssueId> = issues.iter().filter_map(|i| i.id).collect();
    let mut out = IssuePartition::default();
    for issue in issues {
        match issue.parent {
            None => out.stories.push(issue),
            Some(parent) if !ids.contains(&parent) => out.standalone.push(issue),
            Some(_) => {}
        }
    }
    out
}

/// Two labelled sections; every listed issue shows its in-set children indented beneath it.
pub fn render_issue_list(issues: &[Issue]) -> String {
    let part = partition_issues(issues);
    if part.stories.is_empty() && part.standalone.is_empty() {
        return NO_ISSUES_FOUND.to_string();
    }

    let mut out = String::from("*Stories:*");
    push_section(&mut out, &part.stories, issues);
    out.push_str("\n*Standalone tickets:*");
    push_section(&mut out, &part.standalone, issues);
    out
}

fn push_section(out: &mut String, section: &[&Issue], all: &[Issue]) {
    if section.is_empty() {
        out.push_str("\n_none_");
    }
    for issue in section {
        let children: Vec<Issue> = all
            .iter()
            .filter(|i| i.parent.is_some() && i.parent == issue.id)
            .cloned()
            .collect();
        out.push('\n');
        out.push_str(&issue_repr_detailed(issue, &children));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::issue;

    #[test]
    fn renders_issue_line() {
        let i = issue(4821, "Login broken", "In Progress", Some("Alice"), None);
        assert_eq!(
            issue_repr(&i),
            "*4821*: _Login broken_ *In Progress* (assigned to Alice)"
        );
    }

    #[test]
    fn renders_defaults_for_unsaved_issue() {
        let i = Issue {
            subject: "Draft".into(),
            ..Issue::default()
        };
        assert_eq!(issue_repr(&i), "*Not saved*: _Draft_ *New* (unassigned)");
    }

    #[test]
    fn rendering_is_idempotent() {
        let i = issue(100, "Same", "New", None, Some(7));
        assert_eq!(issue_repr(&i), issue_repr(&i));
        assert_eq!(issue_repr_detailed(&i, &[]), issue_repr_detailed(&i, &[]));
    }

    #[test]
    fn detailed_repr_indents_children() {
        let parent = issue(100, "Story", "New", None, None);
        let kids = vec![
            issue(101, "One", "Closed", Some("Bob"), Some(100)),
            issue(102, "Two", "New", None, Some(100)),
        ];
        assert_eq!(
            issue_repr_detailed(&parent, &kids),
            "*100*: _Story_ *New* (unassigned)\n    > *101*: _One_ *Closed* (assigned to Bob)\n    > *102*: _Two_ *New* (unassigned)"
        );
    }

    #[test]
    fn partitions_stories_and_standalone_tickets() {
        let a = issue(100, "A", "New", None, None);
        let b = issue(101, "B", "New", None, Some(100));
        let c = issue(102, "C", "New", None, Some(999));
        let all = vec![a.clone(), b, c.clone()];

        let part = partition_issues(&all);
        assert_eq!(part.stories, vec![&a]);
        assert_eq!(part.standalone, vec![&c]);
    }

    #[test]
    fn list_renders_sections() {
        let all = vec![
            issue(100, "A", "New", Some("Alice"), None),
            issue(101, "B", "New", Some("Alice"), Some(100)),
            issue(102, "C", "Feedback", Some("Alice"), Some(999)),
        ];
        assert_eq!(
            render_issue_list(&all),
            "*Stories:*\n*100*: _A_ *New* (assigned to Alice)\n    > *101*: _B_ *New* (assigned to Alice)\n*Standalone tickets:*\n*102*: _C_ *Feedback* (assigned to Alice)"
        );
    }

    #[test]
    fn standalone_tickets_show_their_children() {
        let all = vec![
            issue(200, "Orphan", "New", None, Some(999)),
            issue(201, "Subtask", "New", None, Some(200)),
        ];
        assert_eq!(
            render_issue_list(&all),
            "*Stories:*\n_none_\n*Standalone tickets:*\n*200*: _Orphan_ *New* (unassigned)\n    > *201*: _Subtask_ *New* (unassigned)"
        );
    }

    #[test]
    fn list_marks_empty_section() {
        let all = vec![issue(102, "C", "New", None, Some(999))];
        let out = render_issue_list(&all);
        assert!(out.starts_with("*Stories:*\n_none_\n*Standalone tickets:*"));
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(render_issue_list(&[]), NO_ISSUES_FOUND);
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        assert_eq!(help.lines().count(), 10);
        assert!(help.starts_with("*help* - show help"));
    }
}
