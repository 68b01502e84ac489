//! Container environment: profile predicates and placeholder resolution.
//!
//! The environment is deliberately passive: a set of active/default profiles
//! plus a flat property map. Callers borrow it immutably for the duration of
//! one registration pass; it is never consulted through global state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Profile that is considered active when no profiles were activated
/// explicitly.
pub const RESERVED_DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("could not resolve placeholder '${{{key}}}' in \"{text}\"")]
    Unresolved { key: String, text: String },
}

#[derive(Debug, Clone)]
pub struct Environment {
    active_profiles: BTreeSet<String>,
    default_profiles: BTreeSet<String>,
    properties: BTreeMap<String, String>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            active_profiles: BTreeSet::new(),
            default_profiles: BTreeSet::from([RESERVED_DEFAULT_PROFILE.to_string()]),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_active_profiles<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut env = Self::new();
        env.set_active_profiles(profiles);
        env
    }

    pub fn set_active_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_profiles = profiles.into_iter().map(Into::into).collect();
    }

    pub fn set_default_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_profiles = profiles.into_iter().map(Into::into).collect();
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn active_profiles(&self) -> impl Iterator<Item = &str> {
        self.active_profiles.iter().map(String::as_str)
    }

    /// Whether at least one of the given profile expressions is in effect.
    ///
    /// A leading `!` negates a name. When no profiles were activated, the
    /// default profiles (normally just `default`) stand in for the active
    /// set. An empty list matches nothing.
    #[must_use]
    pub fn accepts_profiles(&self, profiles: &[&str]) -> bool {
        profiles.iter().any(|p| self.profile_matches(p))
    }

    fn profile_matches(&self, profile: &str) -> bool {
        let profile = profile.trim();
        if let Some(negated) = profile.strip_prefix('!') {
            let negated = negated.trim();
            return !negated.is_empty() && !self.is_profile_in_effect(negated);
        }
        !profile.is_empty() && self.is_profile_in_effect(profile)
    }

    fn is_profile_in_effect(&self, profile: &str) -> bool {
        if self.active_profiles.is_empty() {
            self.default_profiles.contains(profile)
        } else {
            self.active_profiles.contains(profile)
        }
    }

    /// Substitute every `${key}` / `${key:fallback}` token in `text`.
    ///
    /// A key with no property value and no inline fallback fails the whole
    /// resolution.
    pub fn resolve_required_placeholders(&self, text: &str) -> Result<String, PlaceholderError> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

        let mut out = String::with_capacity(text.len());
        let mut last = 0usize;
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).expect("whole match");
            let token = &caps[1];
            let (key, fallback) = match token.split_once(':') {
                Some((key, fallback)) => (key, Some(fallback)),
                None => (token, None),
            };

            let value = self
                .properties
                .get(key)
                .map(String::as_str)
                .or(fallback)
                .ok_or_else(|| PlaceholderError::Unresolved {
                    key: key.to_string(),
                    text: text.to_string(),
                })?;

            out.push_str(&text[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
