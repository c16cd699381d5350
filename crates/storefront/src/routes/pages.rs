//! CMS page and store policy handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::shopify::types::{Page, Policy};
use crate::state::AppState;

/// CMS page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/show.html")]
pub struct PageTemplate {
    pub page: Page,
}

/// Policy index template.
#[derive(Template, WebTemplate)]
#[template(path = "policies/index.html")]
pub struct PoliciesIndexTemplate {
    pub policies: Vec<Policy>,
}

/// Single policy template.
#[derive(Template, WebTemplate)]
#[template(path = "policies/show.html")]
pub struct PolicyTemplate {
    pub policy: Policy,
}

/// Display a CMS page by handle.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<PageTemplate> {
    let page = state
        .storefront()
        .get_page(&handle)
        .await
        .map_err(AppError::from_lookup)?;

    Ok(PageTemplate { page })
}

/// List the store's published policies.
#[instrument(skip(state))]
pub async fn policies(State(state): State<AppState>) -> Result<PoliciesIndexTemplate> {
    let policies = state.storefront().get_policies().await?;
    Ok(PoliciesIndexTemplate { policies })
}

/// Display one policy (`privacy-policy`, `shipping-policy`, `terms-of-service`,
/// `refund-policy`).
#[instrument(skip(state))]
pub async fn policy(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<PolicyTemplate> {
    let policy = state
        .storefront()
        .get_policy(&handle)
        .await
        .map_err(AppError::from_lookup)?;

    Ok(PolicyTemplate { policy })
}
