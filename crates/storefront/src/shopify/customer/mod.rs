//! Shopify Customer Account API client.
//!
//! The Customer Account API provides access to customer authentication and
//! account management. Uses OAuth 2.0 with PKCE for authentication.
//!
//! # OAuth Flow
//!
//! 1. Generate state, nonce, and a [`PkceChallenge`]; keep them in the session
//! 2. Redirect the customer to [`CustomerClient::authorization_url`]
//! 3. Shopify redirects back with an authorization code
//! 4. Exchange the code and verifier with [`CustomerClient::exchange_code`]
//! 5. Use the access token for customer-scoped API calls

mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use skeleton_core::{AddressId, OrderId};
use tracing::instrument;

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Connection, PageInfo};
use crate::shopify::ShopifyError;

// ─────────────────────────────────────────────────────────────────────────────
// GraphQL Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GraphQLRequest {
    query: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

impl<T> GraphQLResponse<T> {
    fn into_result(self) -> Result<T, ShopifyError> {
        if let Some(errors) = self.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ShopifyError::OAuth(messages.join("; ")));
        }

        self.data
            .ok_or_else(|| ShopifyError::OAuth("No data in response".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfoNode {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl From<PageInfoNode> for PageInfo {
    fn from(info: PageInfoNode) -> Self {
        Self {
            has_next_page: info.has_next_page,
            has_previous_page: false,
            start_cursor: None,
            end_cursor: info.end_cursor,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Account Client
// ─────────────────────────────────────────────────────────────────────────────

/// Client for the Shopify Customer Account API.
///
/// Handles OAuth and provides methods for the customer's profile, orders,
/// and addresses.
#[derive(Clone)]
pub struct CustomerClient {
    inner: Arc<CustomerClientInner>,
}

struct CustomerClientInner {
    client: reqwest::Client,
    shop_id: String,
    api_version: String,
    client_id: String,
    client_secret: String,
}

impl CustomerClient {
    /// Create a new Customer Account API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self {
            inner: Arc::new(CustomerClientInner {
                client: reqwest::Client::new(),
                shop_id: config.customer_shop_id.clone(),
                api_version: config.api_version.clone(),
                client_id: config.customer_client_id.clone(),
                client_secret: config.customer_client_secret.expose_secret().to_string(),
            }),
        }
    }

    fn oauth_url(&self, endpoint: &str) -> String {
        format!(
            "https://shopify.com/{}/auth/oauth/{endpoint}",
            self.inner.shop_id
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the hosted login URL.
    ///
    /// `state` guards the callback against CSRF, `nonce` is echoed in the ID
    /// token, and `code_challenge` is the S256 PKCE challenge.
    #[must_use]
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> String {
        format!(
            "{}?\
            client_id={}&\
            response_type=code&\
            redirect_uri={}&\
            scope=openid%20email%20customer-account-api:full&\
            state={}&\
            nonce={}&\
            code_challenge={}&\
            code_challenge_method=S256",
            self.oauth_url("authorize"),
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(nonce),
            urlencoding::encode(code_challenge),
        )
    }

    /// Build the hosted logout URL.
    #[must_use]
    pub fn logout_url(&self, id_token: Option<&str>, post_logout_redirect_uri: &str) -> String {
        let mut url = format!(
            "{}?post_logout_redirect_uri={}",
            self.oauth_url("logout"),
            urlencoding::encode(post_logout_redirect_uri)
        );
        if let Some(id_token) = id_token {
            url.push_str("&id_token_hint=");
            url.push_str(&urlencoding::encode(id_token));
        }
        url
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.oauth_url("token"))
            .basic_auth(&self.inner.client_id, Some(&self.inner.client_secret))
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "{what} failed ({status}): {text}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into())
    }

    /// Exchange an authorization code (and its PKCE verifier) for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        self.token_request(
            &[
                ("grant_type", "authorization_code"),
                ("client_id", &self.inner.client_id),
                ("code", code),
                ("code_verifier", code_verifier),
                ("redirect_uri", redirect_uri),
            ],
            "Token exchange",
        )
        .await
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    #[instrument(skip_all)]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<CustomerAccessToken, ShopifyError> {
        self.token_request(
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.inner.client_id),
                ("refresh_token", refresh_token),
            ],
            "Token refresh",
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // GraphQL Execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a GraphQL query against the Customer Account API.
    async fn query<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &'static str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        let url = format!(
            "https://shopify.com/{}/account/customer/api/{}/graphql",
            self.inner.shop_id, self.inner.api_version
        );

        let request = GraphQLRequest { query, variables };

        let response = self
            .inner
            .client
            .post(&url)
            .header("Authorization", access_token)
            .header("Content-Type", "application/json")
            .header("User-Agent", concat!("skeleton-storefront/", env!("CARGO_PKG_VERSION")))
            .json(&request)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::OAuth("Customer access token rejected".to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Customer API request failed ({status}): {text}"
            )));
        }

        let gql_response: GraphQLResponse<T> = response.json().await?;
        gql_response.into_result()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the current customer's profile and addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_customer(&self, access_token: &str) -> Result<Customer, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerNode,
        }

        const QUERY: &str = r"
            query getCustomer {
                customer {
                    firstName
                    lastName
                    emailAddress { emailAddress }
                    phoneNumber { phoneNumber }
                    defaultAddress { id }
                    addresses(first: 50) {
                        nodes {
                            id firstName lastName company address1 address2 city
                            zoneCode territoryCode zip phoneNumber
                        }
                    }
                }
            }
        ";

        let response: Response = self.query(access_token, QUERY, None).await?;
        Ok(response.customer.into())
    }

    /// Update the current customer's name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip_all)]
    pub async fn update_customer(
        &self,
        access_token: &str,
        input: CustomerUpdateInput,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerUpdate")]
            customer_update: MutationResult,
        }

        const QUERY: &str = r"
            mutation customerUpdate($input: CustomerUpdateInput!) {
                customerUpdate(input: $input) {
                    userErrors { field message }
                }
            }
        ";

        let variables = serde_json::json!({ "input": input });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.customer_update.into_result()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Order Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a page of the customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access_token))]
    pub async fn get_orders(
        &self,
        access_token: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<OrderSummary>, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            customer: CustomerWithOrders,
        }

        #[derive(Deserialize)]
        struct CustomerWithOrders {
            orders: OrderConnection,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct OrderConnection {
            nodes: Vec<OrderSummaryNode>,
            page_info: PageInfoNode,
        }

        const QUERY: &str = r"
            query getOrders($first: Int!, $after: String) {
                customer {
                    orders(first: $first, after: $after, sortKey: PROCESSED_AT, reverse: true) {
                        nodes {
                            id
                            name
                            number
                            processedAt
                            financialStatus
                            fulfillments(first: 1) { nodes { status } }
                            totalPrice { amount currencyCode }
                        }
                        pageInfo { hasNextPage endCursor }
                    }
                }
            }
        ";

        let variables = serde_json::json!({ "first": first, "after": after });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        let orders = response.customer.orders;

        Ok(Connection {
            items: orders
                .nodes
                .into_iter()
                .map(OrderSummaryNode::into_summary)
                .collect::<Result<_, _>>()?,
            page_info: orders.page_info.into(),
        })
    }

    /// Get a single order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not belong to the customer, or an
    /// error if the API request fails.
    #[instrument(skip(self, access_token), fields(order_id = %order_id))]
    pub async fn get_order(
        &self,
        access_token: &str,
        order_id: &OrderId,
    ) -> Result<OrderDetail, ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            order: Option<OrderDetailNode>,
        }

        const QUERY: &str = r"
            query getOrder($orderId: ID!) {
                order(id: $orderId) {
                    id
                    name
                    number
                    processedAt
                    financialStatus
                    statusPageUrl
                    fulfillments(first: 1) { nodes { status } }
                    totalPrice { amount currencyCode }
                    subtotal { amount currencyCode }
                    totalTax { amount currencyCode }
                    totalShipping { amount currencyCode }
                    shippingAddress { formatted(withName: true) }
                    lineItems(first: 100) {
                        nodes {
                            title
                            variantTitle
                            quantity
                            price { amount currencyCode }
                            totalPrice { amount currencyCode }
                            image { url altText }
                        }
                    }
                }
            }
        ";

        let variables = serde_json::json!({ "orderId": order_id });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;

        response
            .order
            .ok_or_else(|| ShopifyError::NotFound(format!("Order not found: {order_id}")))?
            .into_detail()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Address Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new address for the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip_all)]
    pub async fn create_address(
        &self,
        access_token: &str,
        address: AddressInput,
        default_address: bool,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressCreate")]
            address_create: MutationResult,
        }

        const QUERY: &str = r"
            mutation createAddress($address: CustomerAddressInput!, $defaultAddress: Boolean) {
                customerAddressCreate(address: $address, defaultAddress: $defaultAddress) {
                    userErrors { field message }
                }
            }
        ";

        let variables = serde_json::json!({
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.address_create.into_result()
    }

    /// Update an existing address, optionally making it the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token, address), fields(address_id = %address_id))]
    pub async fn update_address(
        &self,
        access_token: &str,
        address_id: &AddressId,
        address: AddressInput,
        default_address: bool,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressUpdate")]
            address_update: MutationResult,
        }

        const QUERY: &str = r"
            mutation updateAddress($addressId: ID!, $address: CustomerAddressInput, $defaultAddress: Boolean) {
                customerAddressUpdate(addressId: $addressId, address: $address, defaultAddress: $defaultAddress) {
                    userErrors { field message }
                }
            }
        ";

        let variables = serde_json::json!({
            "addressId": address_id,
            "address": address,
            "defaultAddress": default_address,
        });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.address_update.into_result()
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or if there are validation errors.
    #[instrument(skip(self, access_token), fields(address_id = %address_id))]
    pub async fn delete_address(
        &self,
        access_token: &str,
        address_id: &AddressId,
    ) -> Result<(), ShopifyError> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "customerAddressDelete")]
            address_delete: MutationResult,
        }

        const QUERY: &str = r"
            mutation deleteAddress($addressId: ID!) {
                customerAddressDelete(addressId: $addressId) {
                    userErrors { field message }
                }
            }
        ";

        let variables = serde_json::json!({ "addressId": address_id });
        let response: Response = self.query(access_token, QUERY, Some(variables)).await?;
        response.address_delete.into_result()
    }
}

/// Payload shared by mutations whose result we only check for user errors.
#[derive(Debug, Deserialize)]
struct MutationResult {
    #[serde(rename = "userErrors")]
    user_errors: Vec<CustomerUserError>,
}

impl MutationResult {
    fn into_result(self) -> Result<(), ShopifyError> {
        if self.user_errors.is_empty() {
            Ok(())
        } else {
            Err(ShopifyError::UserError(user_errors_message(
                &self.user_errors,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> CustomerClient {
        CustomerClient::new(&ShopifyStorefrontConfig {
            store: "skeleton.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_public_token: "public".to_string(),
            storefront_private_token: SecretString::from("private"),
            customer_shop_id: "123456".to_string(),
            customer_client_id: "client-abc".to_string(),
            customer_client_secret: SecretString::from("secret"),
        })
    }

    #[test]
    fn test_authorization_url_includes_pkce() {
        let url = client().authorization_url(
            "https://shop.example/account/authorize",
            "state1",
            "nonce1",
            "challenge1",
        );

        assert!(url.starts_with("https://shopify.com/123456/auth/oauth/authorize?"));
        assert!(url.contains("client_id=client-abc"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fshop.example%2Faccount%2Fauthorize"));
        assert!(url.contains("state=state1"));
        assert!(url.contains("code_challenge=challenge1"));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn test_logout_url() {
        let client = client();
        let with_hint = client.logout_url(Some("idtok"), "https://shop.example/");
        assert!(with_hint.starts_with("https://shopify.com/123456/auth/oauth/logout?"));
        assert!(with_hint.ends_with("&id_token_hint=idtok"));

        let without = client.logout_url(None, "https://shop.example/");
        assert!(!without.contains("id_token_hint"));
    }

    #[test]
    fn test_mutation_result_user_errors() {
        let result: MutationResult = serde_json::from_str(
            r#"{"userErrors": [{"field": ["input", "firstName"], "message": "is too long"}]}"#,
        )
        .unwrap_or(MutationResult {
            user_errors: Vec::new(),
        });
        let err = result.into_result();
        assert!(matches!(err, Err(ShopifyError::UserError(m)) if m == "firstName: is too long"));
    }
}
