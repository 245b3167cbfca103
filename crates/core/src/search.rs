//! Layout search filters.
//!
//! Predicates are combined conjunctively: scope, category, tags, text, then
//! the inclusive `created_at` range. The PostgreSQL store translates a
//! [`LayoutSearch`] into SQL; the in-memory store evaluates the predicate
//! methods below directly.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default page size for layout search.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Maximum page size for layout search.
pub const MAX_SEARCH_LIMIT: i64 = 200;

/// Maximum number of tags accepted in a single filter.
pub const MAX_FILTER_TAGS: usize = 20;

define_text_enum! {
    /// Whether a layout must carry all requested tags or any one of them.
    TagMatch ("tag match") {
        All = "all",
        Any = "any",
    }
}

impl Default for TagMatch {
    fn default() -> Self {
        TagMatch::All
    }
}

define_text_enum! {
    /// Which layouts a search considers before any other predicate.
    SearchScope ("search scope") {
        /// Only layouts the caller owns.
        Owned = "owned",
        /// Owned layouts plus those shared directly or through a team.
        Accessible = "accessible",
        /// Public layouts of any owner.
        Public = "public",
    }
}

impl Default for SearchScope {
    fn default() -> Self {
        SearchScope::Owned
    }
}

/// A validated layout search request.
#[derive(Debug, Clone)]
pub struct LayoutSearch {
    pub user_id: DbId,
    pub scope: SearchScope,
    /// Case-insensitive substring matched against title and description.
    pub text: Option<String>,
    pub category_id: Option<DbId>,
    pub tag_ids: Vec<DbId>,
    pub tag_match: TagMatch,
    pub is_public: Option<bool>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub limit: i64,
    pub offset: i64,
}

impl LayoutSearch {
    /// An unfiltered search over the caller's own layouts.
    pub fn owned_by(user_id: DbId) -> Self {
        Self {
            user_id,
            scope: SearchScope::Owned,
            text: None,
            category_id: None,
            tag_ids: Vec::new(),
            tag_match: TagMatch::All,
            is_public: None,
            date_from: None,
            date_to: None,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
        }
    }

    /// Normalise free-form input and reject contradictory filters.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.text = self
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let unique: BTreeSet<DbId> = self.tag_ids.iter().copied().collect();
        if unique.len() > MAX_FILTER_TAGS {
            return Err(CoreError::Validation(format!(
                "At most {MAX_FILTER_TAGS} tags may be used in one search"
            )));
        }
        self.tag_ids = unique.into_iter().collect();

        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CoreError::Validation(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }

        self.limit = clamp_limit(Some(self.limit), DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        self.offset = clamp_offset(Some(self.offset));
        Ok(self)
    }

    /// The lowercase text pattern, if a text filter is present.
    pub fn text_pattern(&self) -> Option<String> {
        self.text.as_ref().map(|t| t.to_lowercase())
    }

    pub fn matches_text(&self, title: &str, description: &str) -> bool {
        match self.text_pattern() {
            Some(needle) => {
                title.to_lowercase().contains(&needle)
                    || description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    pub fn matches_tags(&self, present: &[DbId]) -> bool {
        if self.tag_ids.is_empty() {
            return true;
        }
        match self.tag_match {
            TagMatch::All => self.tag_ids.iter().all(|t| present.contains(t)),
            TagMatch::Any => self.tag_ids.iter().any(|t| present.contains(t)),
        }
    }

    pub fn matches_dates(&self, created_at: Timestamp) -> bool {
        self.date_from.map_or(true, |from| created_at >= from)
            && self.date_to.map_or(true, |to| created_at <= to)
    }
}

/// Parse a comma-separated id list such as `"3,5,8"`.
pub fn parse_id_list(raw: &str) -> Result<Vec<DbId>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<DbId>()
                .map_err(|_| CoreError::Validation(format!("Invalid id '{s}' in list")))
        })
        .collect()
}

/// Clamp a caller-supplied limit into `1..=max`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a caller-supplied offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
