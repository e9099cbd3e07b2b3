use std::{
    collections::BTreeMap,
    env, fs,
    path::Path,
    time::Duration,
};

use crate::{domain::TrackerUserId, errors::Error, Result};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

/// Typed configuration, loaded once at startup and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    // Chat
    pub slack_bot_token: String,
    pub slack_api_base: String,

    // Tracker
    pub redmine_url: String,
    pub redmine_api_key: String,
    pub redmine_verify_tls: bool,
    pub redmine_users: BTreeMap<String, TrackerUserId>,

    // Runtime constants
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load from the environment (plus `.env`), merging an optional JSON users file
    /// (`{"name": id}`) over `REDMINE_USERS`.
    pub fn load(users_file: Option<&Path>) -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str, users_file)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        users_file: Option<&Path>,
    ) -> Result<Self> {
        let slack_bot_token = required(&lookup, "SLACK_BOT_TOKEN")?;
        let slack_api_base = lookup("SLACK_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let redmine_url = required(&lookup, "REDMINE_URL")?
            .trim_end_matches('/')
            .to_string();
        let redmine_api_key = required(&lookup, "REDMINE_API_KEY")?;
        let redmine_verify_tls = lookup("REDMINE_VERIFY_TLS")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let mut redmine_users = parse_users_csv(lookup("REDMINE_USERS"))?;
        if let Some(path) = users_file {
            redmine_users.extend(load_users_file(path)?);
        }

        let poll_interval =
            Duration::from_millis(parse_u64(&lookup, "POLL_INTERVAL_MS")?.unwrap_or(1000));
        let request_timeout =
            Duration::from_millis(parse_u64(&lookup, "REQUEST_TIMEOUT_MS")?.unwrap_or(10_000));

        Ok(Self {
            slack_bot_token,
            slack_api_base,
            redmine_url,
            redmine_api_key,
            redmine_verify_tls,
            redmine_users,
            poll_interval,
            request_timeout,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .and_then(non_empty)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// `alice=5, Bob=7` -> {alice: 5, bob: 7}. Names are stored lowercased.
fn parse_users_csv(v: Option<String>) -> Result<BTreeMap<String, TrackerUserId>> {
    let mut out = BTreeMap::new();
    for entry in v.unwrap_or_default().split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, id)) = entry.split_once('=') else {
            return Err(Error::Config(format!(
                "REDMINE_USERS entry {entry:?} is not name=id"
            )));
        };
        let id = id.trim().parse::<u32>().map_err(|_| {
            Error::Config(format!("REDMINE_USERS entry {entry:?} has a non-numeric id"))
        })?;
        out.insert(name.trim().to_lowercase(), TrackerUserId(id));
    }
    Ok(out)
}

fn load_users_file(path: &Path) -> Result<BTreeMap<String, TrackerUserId>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read users file {}: {e}", path.display()))
    })?;
    let users: BTreeMap<String, TrackerUserId> = serde_json::from_str(&raw).map_err(|e| {
        Error::Config(format!(
            "users file {} must be a JSON object of name -> id: {e}",
            path.display()
        ))
    })?;
    Ok(users
        .into_iter()
        .map(|(name, id)| (name.trim().to_lowercase(), id))
        .collect())
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
