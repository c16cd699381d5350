//! Crawler endpoints: `sitemap.xml` and `robots.txt`.

use askama::Template;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::error::Result;
use crate::shopify::types::{SitemapData, SitemapEntry};
use crate::state::AppState;

/// A `<url>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// XML sitemap template.
#[derive(Template)]
#[template(path = "sitemap.xml")]
pub struct SitemapTemplate {
    pub urls: Vec<SitemapUrl>,
}

fn sitemap_urls(state: &AppState, data: &SitemapData) -> Vec<SitemapUrl> {
    let url = |prefix: &str, entry: &SitemapEntry| SitemapUrl {
        loc: state
            .config()
            .absolute_url(&format!("/{prefix}/{}", entry.handle)),
        lastmod: entry.updated_at.map(|t| t.format("%Y-%m-%d").to_string()),
    };

    std::iter::once(SitemapUrl {
        loc: state.config().absolute_url("/"),
        lastmod: None,
    })
    .chain(data.products.iter().map(|e| url("products", e)))
    .chain(data.collections.iter().map(|e| url("collections", e)))
    .chain(data.pages.iter().map(|e| url("pages", e)))
    .collect()
}

/// `GET /sitemap.xml`
#[instrument(skip_all)]
pub async fn sitemap(State(state): State<AppState>) -> Result<Response> {
    let data = state.storefront().get_sitemap().await?;
    let body = SitemapTemplate {
        urls: sitemap_urls(&state, &data),
    }
    .render()?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        body,
    )
        .into_response())
}

/// Body of `robots.txt`; private pages are kept out of the index.
fn robots_body(sitemap_url: &str) -> String {
    format!(
        "User-agent: *\n\
         Disallow: /account\n\
         Disallow: /cart\n\
         Disallow: /checkout\n\
         Disallow: /discount/\n\
         Disallow: /search\n\
         \n\
         Sitemap: {sitemap_url}\n"
    )
}

/// `GET /robots.txt`
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        robots_body(&state.config().absolute_url("/sitemap.xml")),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_body() {
        let body = robots_body("https://shop.example.com/sitemap.xml");
        assert!(body.starts_with("User-agent: *\n"));
        assert!(body.contains("Disallow: /account\n"));
        assert!(body.ends_with("Sitemap: https://shop.example.com/sitemap.xml\n"));
    }

    #[test]
    fn test_sitemap_template_escapes() {
        let xml = SitemapTemplate {
            urls: vec![SitemapUrl {
                loc: "https://shop.example.com/products/a&b".to_string(),
                lastmod: Some("2024-01-15".to_string()),
            }],
        }
        .render()
        .unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://shop.example.com/products/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>2024-01-15</lastmod>"));
    }
}
