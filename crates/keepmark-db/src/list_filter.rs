//! WHERE-clause generation for note and bookmark listing.
//!
//! Both content tables share the same shape for listing: an owner pool, an
//! optional full-text query against `search_tsv`, and an optional tag
//! overlap. The builder emits a parameterized fragment plus the values to
//! bind in order.

use uuid::Uuid;

use keepmark_core::ListQuery;

/// Text search configuration used for `search_tsv` and queries against it.
pub const TEXT_SEARCH_CONFIG: &str = "english";

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Single UUID parameter.
    Uuid(Uuid),
    /// String parameter.
    String(String),
    /// Array of strings (tag overlap).
    StringArray(Vec<String>),
}

/// Bind a list of [`QueryParam`]s onto a `sqlx` query in order.
macro_rules! bind_query_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params {
            q = match param {
                $crate::list_filter::QueryParam::Uuid(id) => q.bind(id),
                $crate::list_filter::QueryParam::String(s) => q.bind(s),
                $crate::list_filter::QueryParam::StringArray(arr) => q.bind(arr),
            };
        }
        q
    }};
}
pub(crate) use bind_query_params;

/// Turn free text into a `websearch_to_tsquery` input where any term matches.
///
/// Returns `None` for blank input so no search clause is emitted.
pub fn any_terms_query(search: &str) -> Option<String> {
    let terms: Vec<&str> = search
        .split_whitespace()
        .filter(|t| !t.eq_ignore_ascii_case("or"))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" or "))
    }
}

/// Generates the WHERE clause for a [`ListQuery`].
///
/// # Example
///
/// ```rust,ignore
/// let builder = ListFilterQueryBuilder::new(&query, 0);
/// let (sql, params) = builder.build();
/// // sql: "owner_id = $1 AND tags && $2::text[]"
/// ```
pub struct ListFilterQueryBuilder<'a> {
    query: &'a ListQuery,
    param_offset: usize,
}

impl<'a> ListFilterQueryBuilder<'a> {
    /// `param_offset` is the number of parameters already in the statement.
    pub fn new(query: &'a ListQuery, param_offset: usize) -> Self {
        Self {
            query,
            param_offset,
        }
    }

    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        // Owner pools never mix: a user sees only their rows, anonymous only ownerless ones
        match self.query.owner_id {
            Some(owner_id) => {
                param_idx += 1;
                clauses.push(format!("owner_id = ${}", param_idx));
                params.push(QueryParam::Uuid(owner_id));
            }
            None => clauses.push("owner_id IS NULL".to_string()),
        }

        if let Some(tsquery) = self.query.search.as_deref().and_then(any_terms_query) {
            param_idx += 1;
            clauses.push(format!(
                "search_tsv @@ websearch_to_tsquery('{}', ${})",
                TEXT_SEARCH_CONFIG, param_idx
            ));
            params.push(QueryParam::String(tsquery));
        }

        if let Some(tags) = self.query.tags.as_ref().filter(|t| !t.is_empty()) {
            param_idx += 1;
            clauses.push(format!("tags && ${}::text[]", param_idx));
            params.push(QueryParam::StringArray(tags.clone()));
        }

        (clauses.join(" AND "), params)
    }
}
