//! Page, policy, search, and sitemap conversion functions.

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    CollectionSummary, Connection, ContentHit, Page, Policy, PredictiveResults, SearchResults,
    SitemapData, SitemapEntry,
};

use super::super::queries::{
    self, ArticleNode, PageHitNode, PageNode, PredictiveNode, SearchResultNode, ShopPoliciesNode,
    SitemapNode,
};
use super::products::{convert_product_card, convert_product_cards};
use super::{convert_image, convert_page_info, convert_seo};

/// Convert a CMS page.
pub fn convert_page(page: PageNode) -> Page {
    Page {
        handle: page.handle,
        title: page.title,
        body: page.body,
        seo: convert_seo(page.seo),
    }
}

/// Convert the shop's policies, skipping any that are not configured.
pub fn convert_policies(shop: ShopPoliciesNode) -> Vec<Policy> {
    [
        shop.privacy_policy,
        shop.shipping_policy,
        shop.terms_of_service,
        shop.refund_policy,
    ]
    .into_iter()
    .flatten()
    .map(|p| Policy {
        handle: p.handle,
        title: p.title,
        body: p.body,
    })
    .collect()
}

fn page_hit(page: PageHitNode) -> ContentHit {
    ContentHit {
        url: format!("/pages/{}", page.handle),
        title: page.title,
    }
}

/// Articles are not rendered locally; hits link to the online store.
fn article_hit(article: ArticleNode, store: &str) -> ContentHit {
    ContentHit {
        url: format!(
            "https://{store}/blogs/{}/{}",
            article.blog.handle, article.handle
        ),
        title: article.title,
    }
}

/// Convert full search results, splitting the mixed result list by type.
pub fn convert_search(
    search: queries::Nodes<SearchResultNode>,
    store: &str,
) -> Result<SearchResults, ShopifyError> {
    let mut results = SearchResults {
        products: Connection {
            items: Vec::new(),
            page_info: convert_page_info(search.page_info),
        },
        pages: Vec::new(),
        articles: Vec::new(),
    };

    for node in search.nodes {
        match node {
            SearchResultNode::Product(card) => {
                results.products.items.push(convert_product_card(card)?);
            }
            SearchResultNode::Page(page) => results.pages.push(page_hit(page)),
            SearchResultNode::Article(article) => {
                results.articles.push(article_hit(article, store));
            }
        }
    }

    Ok(results)
}

/// Convert predictive search results.
pub fn convert_predictive(
    predictive: PredictiveNode,
    store: &str,
) -> Result<PredictiveResults, ShopifyError> {
    Ok(PredictiveResults {
        products: convert_product_cards(predictive.products)?,
        collections: predictive
            .collections
            .into_iter()
            .map(|c| CollectionSummary {
                handle: c.handle,
                title: c.title,
                image: c.image.map(convert_image),
            })
            .collect(),
        pages: predictive.pages.into_iter().map(page_hit).collect(),
        articles: predictive
            .articles
            .into_iter()
            .map(|a| article_hit(a, store))
            .collect(),
        queries: predictive.queries.into_iter().map(|q| q.text).collect(),
    })
}

fn sitemap_entries(nodes: Vec<SitemapNode>) -> Vec<SitemapEntry> {
    nodes
        .into_iter()
        .map(|n| SitemapEntry {
            handle: n.handle,
            updated_at: n.updated_at,
        })
        .collect()
}

/// Convert sitemap handles.
pub fn convert_sitemap(data: queries::SitemapData) -> SitemapData {
    SitemapData {
        products: sitemap_entries(data.products.nodes),
        collections: sitemap_entries(data.collections.nodes),
        pages: sitemap_entries(data.pages.nodes),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_search_splits_by_type() {
        let json = r#"{
            "nodes": [
                {"__typename": "Product", "id": "gid://shopify/Product/1", "handle": "board", "title": "Board",
                 "featuredImage": null, "priceRange": {"minVariantPrice": {"amount": "10", "currencyCode": "USD"}}},
                {"__typename": "Page", "handle": "about", "title": "About"},
                {"__typename": "Article", "handle": "launch", "title": "Launch", "blog": {"handle": "news"}}
            ],
            "pageInfo": {"hasNextPage": true, "hasPreviousPage": false, "startCursor": null, "endCursor": "abc"}
        }"#;
        let nodes: queries::Nodes<SearchResultNode> = serde_json::from_str(json).unwrap();
        let results = convert_search(nodes, "shop.myshopify.com").unwrap();

        assert_eq!(results.products.items.len(), 1);
        assert_eq!(results.pages[0].url, "/pages/about");
        assert_eq!(
            results.articles[0].url,
            "https://shop.myshopify.com/blogs/news/launch"
        );
        assert_eq!(results.products.page_info.end_cursor.as_deref(), Some("abc"));
        assert_eq!(results.total(), 3);
    }

    #[test]
    fn test_convert_policies_skips_missing() {
        let shop: ShopPoliciesNode = serde_json::from_str(
            r#"{"privacyPolicy": {"handle": "privacy-policy", "title": "Privacy", "body": "<p>x</p>"},
                "refundPolicy": null, "shippingPolicy": null, "termsOfService": null}"#,
        )
        .unwrap();
        let policies = convert_policies(shop);
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].handle, "privacy-policy");
    }
}
