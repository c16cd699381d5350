//! Search route handlers.
//!
//! `/search` renders the full results page; `/search/predictive` returns the
//! dropdown fragment requested as the customer types.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::shopify::types::{PredictiveResults, SearchResults};
use crate::state::AppState;

/// Results per search page.
const SEARCH_PAGE_SIZE: i64 = 24;

/// Suggestions per result type in the predictive dropdown.
const PREDICTIVE_LIMIT: i64 = 4;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub cursor: Option<String>,
}

impl SearchQuery {
    fn term(&self) -> &str {
        self.q.trim()
    }
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search/index.html")]
pub struct SearchPageTemplate {
    pub query: String,
    pub results: SearchResults,
    pub is_first_page: bool,
}

/// Predictive search dropdown fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/predictive.html")]
pub struct PredictiveTemplate {
    pub query: String,
    pub results: PredictiveResults,
}

/// Display the full search page.
///
/// An empty query renders the form without searching.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<SearchPageTemplate> {
    let term = query.term();
    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());

    let results = if term.is_empty() {
        SearchResults::empty()
    } else {
        state
            .storefront()
            .search(term, SEARCH_PAGE_SIZE, cursor)
            .await?
    };

    Ok(SearchPageTemplate {
        query: term.to_string(),
        results,
        is_first_page: cursor.is_none(),
    })
}

/// Predictive search fragment.
///
/// Upstream failures render an empty dropdown.
#[instrument(skip(state))]
pub async fn predictive(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> PredictiveTemplate {
    let term = query.term();

    let results = state
        .storefront()
        .predictive_search(term, PREDICTIVE_LIMIT)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Predictive search failed");
            PredictiveResults::default()
        });

    PredictiveTemplate {
        query: term.to_string(),
        results,
    }
}
