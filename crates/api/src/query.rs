//! Shared query parameter types for API handlers.

use layoutsmith_core::error::CoreError;
use layoutsmith_core::search::{
    clamp_limit, clamp_offset, parse_id_list, LayoutSearch, SearchScope, TagMatch,
    DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
use layoutsmith_core::types::{DbId, Timestamp};
use serde::Deserialize;

/// Query parameters for `GET /layouts/search`.
///
/// `tag_ids` is a comma-separated list (`?tag_ids=3,5`).
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category_id: Option<DbId>,
    pub tag_ids: Option<String>,
    #[serde(default)]
    pub tag_match: TagMatch,
    pub is_public: Option<bool>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    #[serde(default)]
    pub scope: SearchScope,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchParams {
    /// Build a validated search for `user_id`.
    pub fn into_search(self, user_id: DbId) -> Result<LayoutSearch, CoreError> {
        let tag_ids = match self.tag_ids.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_id_list(raw)?,
            _ => Vec::new(),
        };

        LayoutSearch {
            user_id,
            scope: self.scope,
            text: self.q,
            category_id: self.category_id,
            tag_ids,
            tag_match: self.tag_match,
            is_public: self.is_public,
            date_from: self.date_from,
            date_to: self.date_to,
            limit: clamp_limit(self.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT),
            offset: clamp_offset(self.offset),
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_owned_scope_and_all_tags() {
        let search = SearchParams::default().into_search(7).unwrap();
        assert_eq!(search.user_id, 7);
        assert_eq!(search.scope, SearchScope::Owned);
        assert_eq!(search.tag_match, TagMatch::All);
        assert_eq!(search.limit, DEFAULT_SEARCH_LIMIT);
        assert!(search.tag_ids.is_empty());
    }

    #[test]
    fn parses_tag_list_and_clamps_limit() {
        let params = SearchParams {
            tag_ids: Some("3, 5".to_string()),
            limit: Some(10_000),
            ..Default::default()
        };
        let search = params.into_search(1).unwrap();
        assert_eq!(search.tag_ids, vec![3, 5]);
        assert_eq!(search.limit, MAX_SEARCH_LIMIT);
    }

    #[test]
    fn rejects_garbage_tag_list() {
        let params = SearchParams {
            tag_ids: Some("3,abc".to_string()),
            ..Default::default()
        };
        assert!(params.into_search(1).is_err());
    }
}
