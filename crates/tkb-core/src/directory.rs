//! Static user-name table and the per-process chat profile cache.

use std::collections::{BTreeMap, HashMap};

use crate::{
    domain::{ChatUserId, TrackerUserId},
    messaging::{port::MessagingPort, types::UserProfile},
    utils::capitalize,
    Result,
};

/// Name -> tracker user id table, loaded from config.
///
/// Keys are kept lowercased so lookups are case-insensitive and `known_names` sorts
/// alphabetically.
#[derive(Clone, Debug, Default)]
pub struct UserDirectory {
    users: BTreeMap<String, TrackerUserId>,
}

impl UserDirectory {
    pub fn new(users: BTreeMap<String, TrackerUserId>) -> Self {
        let users = users
            .into_iter()
            .map(|(name, id)| (name.trim().to_lowercase(), id))
            .collect();
        Self { users }
    }

    pub fn resolve_name(&self, name: &str) -> Option<TrackerUserId> {
        self.users.get(&name.trim().to_lowercase()).copied()
    }

    /// Email first, then the first name.
    pub fn resolve_profile(&self, profile: &UserProfile) -> Option<TrackerUserId> {
        if let Some(id) = profile
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .and_then(|e| self.resolve_name(e))
        {
            return Some(id);
        }

        let first_name = profile
            .first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| profile.display_name.split_whitespace().next())?;
        self.resolve_name(first_name)
    }

    /// Every configured name, capitalized, in table order.
    pub fn known_names(&self) -> Vec<String> {
        self.users.keys().map(|k| capitalize(k)).collect()
    }
}

/// Read-through memo of chat profiles; entries are never invalidated.
#[derive(Debug, Default)]
pub struct ProfileCache {
    profiles: HashMap<ChatUserId, UserProfile>,
}

impl ProfileCache {
    pub async fn resolve(
        &mut self,
        messenger: &dyn MessagingPort,
        user: &ChatUserId,
    ) -> Result<UserProfile> {
        if let Some(p) = self.profiles.get(user) {
            return Ok(p.clone());
        }
        let profile = messenger.lookup_user_profile(user).await?;
        self.profiles.insert(user.clone(), profile.clone());
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
