//! Redmine adapter.
//!
//! Implements the `tkb-core` IssueTracker port over the Redmine REST API (JSON).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use tkb_core::{
    config::Config,
    domain::IssueId,
    errors::Error,
    tracker::{
        port::IssueTracker,
        types::{Issue, IssueChanges, IssueFilter, IssueStatus, NewIssue, StatusFilter},
    },
    Result,
};

mod wire;

use wire::{ErrorsEnvelope, IssueEnvelope, IssuePayload, IssuesPage, StatusesEnvelope};

const API_KEY_HEADER: &str = "X-Redmine-API-Key";
const PAGE_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct RedmineClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl RedmineClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        verify_tls: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| Error::Config(format!("redmine http client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.redmine_url.clone(),
            cfg.redmine_api_key.clone(),
            cfg.redmine_verify_tls,
            cfg.request_timeout,
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
    }

    /// Send and map non-success statuses. `issue` names the record for 404s.
    async fn send(&self, req: RequestBuilder, op: &str, issue: Option<IssueId>) -> Result<Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Tracker(format!("redmine {op} request error: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        match (status, issue) {
            (StatusCode::NOT_FOUND, Some(id)) => Err(Error::issue_not_found(id)),
            (StatusCode::UNPROCESSABLE_ENTITY, _) => {
                let errors = serde_json::from_str::<ErrorsEnvelope>(&body).unwrap_or_default();
                Err(Error::Validation(if errors.errors.is_empty() {
                    format!("redmine {op} rejected")
                } else {
                    errors.errors.join(", ")
                }))
            }
            _ => Err(Error::Tracker(format!(
                "redmine {op} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            ))),
        }
    }

    async fn json<T: DeserializeOwned>(resp: Response, op: &str) -> Result<T> {
        resp.json::<T>()
            .await
            .map_err(|e| Error::Tracker(format!("redmine {op} json error: {e}")))
    }
}

fn status_param(status: StatusFilter) -> String {
    match status {
        StatusFilter::Open => "open".to_string(),
        StatusFilter::Closed => "closed".to_string(),
        StatusFilter::Any => "*".to_string(),
        StatusFilter::Id(id) => id.to_string(),
    }
}

#[async_trait]
impl IssueTracker for RedmineClient {
    async fn get_issue(&self, id: IssueId, include_children: bool) -> Result<Issue> {
        let mut req = self.request(Method::GET, &format!("/issues/{id}.json"));
        if include_children {
            req = req.query(&[("include", "children")]);
        }
        let resp = self.send(req, "get issue", Some(id)).await?;
        let env: IssueEnvelope = Self::json(resp, "get issue").await?;
        Ok(env.issue.into())
    }

    async fn list_statuses(&self) -> Result<Vec<IssueStatus>> {
        let req = self.request(Method::GET, "/issue_statuses.json");
        let resp = self.send(req, "list statuses", None).await?;
        let env: StatusesEnvelope = Self::json(resp, "list statuses").await?;
        Ok(env.issue_statuses)
    }

    async fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let mut params = vec![("status_id", status_param(filter.status))];
        if let Some(user) = filter.assigned_to {
            params.push(("assigned_to_id", user.to_string()));
        }

        let mut out: Vec<Issue> = Vec::new();
        loop {
            let req = self
                .request(Method::GET, "/issues.json")
                .query(&params)
                .query(&[
                    ("limit", PAGE_SIZE.to_string()),
                    ("offset", out.len().to_string()),
                ]);
            let resp = self.send(req, "filter issues", None).await?;
            let page: IssuesPage = Self::json(resp, "filter issues").await?;

            let fetched = page.issues.len();
            out.extend(page.issues.into_iter().map(Issue::from));
            if fetched == 0 || out.len() >= page.total_count {
                break;
            }
        }

        tracing::debug!(count = out.len(), ?filter, "filtered issues");
        Ok(out)
    }

    async fn create_issue(&self, new: &NewIssue) -> Result<Issue> {
        let req = self
            .request(Method::POST, "/issues.json")
            .json(&IssuePayload::from(new));
        let resp = self.send(req, "create issue", None).await?;
        let env: IssueEnvelope = Self::json(resp, "create issue").await?;
        Ok(env.issue.into())
    }

    async fn save_issue(&self, id: IssueId, changes: &IssueChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let req = self
            .request(Method::PUT, &format!("/issues/{id}.json"))
            .json(&IssuePayload::from(changes));
        self.send(req, "save issue", Some(id)).await?;
        Ok(())
    }
}
