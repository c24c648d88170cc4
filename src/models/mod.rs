//! Domain types for session token issuance
//!
//! `EntryId` is validated once at construction and immutable afterwards;
//! `PrivilegeSet` is built fresh per request and never persisted;
//! `SessionToken` is an opaque provider token, only ever cleaned, never
//! parsed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// A digit, an underscore, then 8+ alphanumerics
static ENTRY_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]_[A-Za-z0-9]{8,}$").expect("valid entry id pattern"));

/// A validated media entry identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for EntryId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if ENTRY_ID_PATTERN.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(AppError::validation(
                "entryId",
                format!("'{value}' must match the pattern {}", ENTRY_ID_PATTERN.as_str()),
            ))
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered privilege tokens joined into the outbound privileges string
///
/// Invariant: at most one `sview:` and one `eventsessioncontextid:` entry
/// survive composition; an explicit entry id replaces the configured
/// defaults for those prefixes rather than appending duplicates.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeSet {
    entries: Vec<String>,
}

impl PrivilegeSet {
    pub fn from_defaults(defaults: &[String]) -> Self {
        Self {
            entries: defaults.to_vec(),
        }
    }

    /// Scope the set to an explicit entry id
    ///
    /// Default `sview:`/`eventsessioncontextid:` entries are dropped and the
    /// entry-scoped replacements appended after the remaining defaults.
    pub fn with_entry(mut self, entry_id: &EntryId) -> Self {
        self.entries
            .retain(|p| !p.starts_with("sview:") && !p.starts_with("eventsessioncontextid:"));
        self.entries.push(format!("sview:{entry_id}"));
        self.entries
            .push(format!("eventsessioncontextid:{entry_id}"));
        self
    }

    /// Append caller-supplied privileges verbatim at the end
    pub fn with_extra(mut self, extra: &[String]) -> Self {
        self.entries.extend_from_slice(extra);
        self
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Render the comma-joined privileges string for the outbound request
    pub fn render(&self) -> String {
        self.entries.join(",")
    }
}

/// An opaque provider session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Clean a raw provider token and wrap it; `None` if nothing remains
    ///
    /// Providers sometimes return the token wrapped in JSON string quotes;
    /// all `"` characters and surrounding whitespace are stripped. The
    /// cleanup is idempotent.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let cleaned = clean_token(raw);
        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip all quote characters and surrounding whitespace from a raw token
pub fn clean_token(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_accepts_valid_patterns() {
        for valid in ["1_abcdefgh", "9_AbC12345", "7_longerentry99", "0_00000000"] {
            assert!(valid.parse::<EntryId>().is_ok(), "expected {valid} to parse");
        }
    }

    #[test]
    fn entry_id_rejects_invalid_patterns() {
        for invalid in [
            "",
            "abcdefgh",
            "1-abcdefgh",
            "1_short",
            "_abcdefgh",
            "1_abc defgh",
            "1_abcdefg!",
            "x_abcdefgh",
            "12_abcdefgh",
            "1_",
        ] {
            assert!(
                invalid.parse::<EntryId>().is_err(),
                "expected {invalid:?} to be rejected"
            );
        }
    }

    #[test]
    fn entry_id_validation_error_names_the_field() {
        let err = "nope".parse::<EntryId>().unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "entryId"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn privileges_without_entry_keep_default_order() {
        let defaults = vec![
            "setrole:PLAYBACK_BASE_ROLE".to_string(),
            "privacycontext:ctx1".to_string(),
            "enableentitlement".to_string(),
        ];
        let set = PrivilegeSet::from_defaults(&defaults);
        assert_eq!(
            set.render(),
            "setrole:PLAYBACK_BASE_ROLE,privacycontext:ctx1,enableentitlement"
        );
    }

    #[test]
    fn entry_replaces_default_scoped_privileges() {
        let defaults = vec![
            "setrole:PLAYBACK_BASE_ROLE".to_string(),
            "sview:1_default99".to_string(),
            "eventsessioncontextid:1_default99".to_string(),
            "privacycontext:ctx1".to_string(),
            "enableentitlement".to_string(),
        ];
        let entry: EntryId = "9_abcdefgh".parse().unwrap();
        let set = PrivilegeSet::from_defaults(&defaults).with_entry(&entry);
        let rendered = set.render();

        let sview_count = set
            .entries()
            .iter()
            .filter(|p| p.starts_with("sview:"))
            .count();
        let ctx_count = set
            .entries()
            .iter()
            .filter(|p| p.starts_with("eventsessioncontextid:"))
            .count();
        assert_eq!(sview_count, 1);
        assert_eq!(ctx_count, 1);
        assert!(rendered.contains("sview:9_abcdefgh"));
        assert!(rendered.contains("eventsessioncontextid:9_abcdefgh"));
        assert!(!rendered.contains("1_default99"));
        // remaining defaults keep their position, entry privileges go last
        assert_eq!(
            rendered,
            "setrole:PLAYBACK_BASE_ROLE,privacycontext:ctx1,enableentitlement,\
             sview:9_abcdefgh,eventsessioncontextid:9_abcdefgh"
        );
    }

    #[test]
    fn extra_privileges_append_verbatim_after_entry() {
        let defaults = vec!["enableentitlement".to_string()];
        let entry: EntryId = "1_abcdefgh".parse().unwrap();
        let set = PrivilegeSet::from_defaults(&defaults)
            .with_entry(&entry)
            .with_extra(&["disableentitlementforentry:1_abcdefgh".to_string()]);
        assert_eq!(
            set.render(),
            "enableentitlement,sview:1_abcdefgh,eventsessioncontextid:1_abcdefgh,\
             disableentitlementforentry:1_abcdefgh"
        );
    }

    #[test]
    fn token_cleanup_strips_quotes_and_whitespace() {
        assert_eq!(clean_token("\"abc\""), "abc");
        assert_eq!(clean_token("  tok123  \n"), "tok123");
        assert_eq!(clean_token("a\"b\"c"), "abc");
    }

    #[test]
    fn token_cleanup_is_idempotent() {
        let once = clean_token("\" djJ8MTIzfGFiYw== \"");
        let twice = clean_token(&once);
        assert_eq!(once, twice);
        assert_eq!(once, "djJ8MTIzfGFiYw==");
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(SessionToken::from_raw("").is_none());
        assert!(SessionToken::from_raw("\"\"").is_none());
        assert!(SessionToken::from_raw("   ").is_none());
    }
}
