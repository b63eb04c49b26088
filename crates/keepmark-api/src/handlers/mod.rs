//! HTTP handlers, one module per resource.

pub mod auth;
pub mod bookmarks;
pub mod health;
pub mod notes;

use serde::Deserialize;

use keepmark_core::validation::parse_tag_filter;
use keepmark_core::{Identity, ListQuery};

/// Query string accepted by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Free-text search; any term in any indexed field matches.
    pub q: Option<String>,
    /// Comma-separated tags; records sharing at least one are kept.
    pub tags: Option<String>,
}

impl ListParams {
    /// Scope to the caller's records, or to the ownerless pool when anonymous.
    pub fn into_list_query(self, caller: Option<&Identity>) -> ListQuery {
        let mut query = ListQuery::for_owner(caller.map(|c| c.id));
        if let Some(q) = self.q.filter(|q| !q.trim().is_empty()) {
            query = query.with_search(q);
        }
        if let Some(tags) = self.tags.as_deref().and_then(parse_tag_filter) {
            query = query.with_tags(tags);
        }
        query
    }
}
