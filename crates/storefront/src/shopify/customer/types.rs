//! Types for Shopify Customer Account API OAuth and responses.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use skeleton_core::{AddressId, FinancialStatus, FulfillmentStatus, Money, OrderId};

use crate::shopify::ShopifyError;
use crate::shopify::types::Image;

// ─────────────────────────────────────────────────────────────────────────────
// OAuth Types
// ─────────────────────────────────────────────────────────────────────────────

/// Customer access token obtained via OAuth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAccessToken {
    /// The access token for API requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect), needed for logout.
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl CustomerAccessToken {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Check expiry against a given Unix timestamp.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let expires_at = self.obtained_at + expires_in;
            now >= (expires_at - 60)
        })
    }
}

/// Raw token response from Shopify OAuth endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for CustomerAccessToken {
    fn from(token: TokenResponse) -> Self {
        Self {
            access_token: token.access_token,
            id_token: token.id_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}

/// Random URL-safe string for OAuth `state`, `nonce`, and PKCE verifiers.
#[must_use]
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Secret kept in the session until the callback.
    pub verifier: String,
    /// `BASE64URL(SHA256(verifier))`, sent with the authorization request.
    pub challenge: String,
}

impl PkceChallenge {
    /// Generate a fresh verifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(random_token(64))
    }

    /// Derive the challenge for an existing verifier.
    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer Types
// ─────────────────────────────────────────────────────────────────────────────

/// A Shopify customer.
#[derive(Debug, Clone)]
pub struct Customer {
    /// The customer's email address.
    pub email: Option<String>,
    /// The customer's first name.
    pub first_name: Option<String>,
    /// The customer's last name.
    pub last_name: Option<String>,
    /// The customer's phone number.
    pub phone: Option<String>,
    /// The customer's saved addresses; the default address is flagged.
    pub addresses: Vec<Address>,
}

impl Customer {
    /// Get the customer's full name.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// The default address, if one is set.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }
}

/// A customer address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    /// The address ID.
    pub id: AddressId,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Address line 1.
    pub address1: Option<String>,
    /// Address line 2.
    pub address2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Province/state code.
    pub zone_code: Option<String>,
    /// Country code.
    pub territory_code: Option<String>,
    /// Postal/ZIP code.
    pub zip: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Whether this is the customer's default address.
    pub is_default: bool,
}

impl Address {
    /// Format the address as a single line.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        [
            &self.address1,
            &self.address2,
            &self.city,
            &self.zone_code,
            &self.zip,
            &self.territory_code,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// An order in the customer's history.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    /// The order ID.
    pub id: OrderId,
    /// The order name (e.g., "#1001").
    pub name: String,
    /// The order number.
    pub number: i64,
    /// When the order was processed.
    pub processed_at: DateTime<Utc>,
    /// The financial status.
    pub financial_status: FinancialStatus,
    /// Status of the latest fulfillment.
    pub fulfillment_status: FulfillmentStatus,
    /// The total price.
    pub total: Money,
}

/// A purchased line on an order.
#[derive(Debug, Clone)]
pub struct OrderLineItem {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: Option<Money>,
    pub total: Option<Money>,
    pub image: Option<Image>,
}

/// A single order with its lines and totals.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    /// Summary fields shared with the history list.
    pub summary: OrderSummary,
    /// Purchased lines.
    pub line_items: Vec<OrderLineItem>,
    /// Subtotal before shipping and tax.
    pub subtotal: Option<Money>,
    /// Total tax.
    pub total_tax: Option<Money>,
    /// Total shipping.
    pub total_shipping: Option<Money>,
    /// Shipping address, one formatted line per entry.
    pub shipping_address: Vec<String>,
    /// Shopify's hosted order status page.
    pub status_page_url: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Input Types
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating or updating an address.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Province/state code (e.g., "ON").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_code: Option<String>,
    /// Country code (e.g., "CA").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Input for updating customer information.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// User error from a mutation.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerUserError {
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Join mutation user errors, prefixing the field each one refers to.
pub(super) fn user_errors_message(errors: &[CustomerUserError]) -> String {
    errors
        .iter()
        .map(|e| match e.field.as_ref().and_then(|f| f.last()) {
            Some(field) => format!("{field}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MoneyNode {
    pub amount: String,
    pub currency_code: String,
}

impl MoneyNode {
    pub(super) fn parse(&self) -> Result<Money, ShopifyError> {
        Ok(Money::parse(&self.amount, &self.currency_code)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EmailNode {
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PhoneNode {
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddressNode {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub zone_code: Option<String>,
    pub territory_code: Option<String>,
    pub zip: Option<String>,
    pub phone_number: Option<String>,
}

impl AddressNode {
    pub(super) fn into_address(self, default_id: Option<&str>) -> Address {
        let is_default = default_id == Some(self.id.as_str());
        Address {
            id: AddressId::new(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            address1: self.address1,
            address2: self.address2,
            city: self.city,
            zone_code: self.zone_code,
            territory_code: self.territory_code,
            zip: self.zip,
            phone: self.phone_number,
            is_default,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct Nodes<T> {
    pub nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CustomerNode {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<EmailNode>,
    pub phone_number: Option<PhoneNode>,
    pub default_address: Option<IdNode>,
    pub addresses: Nodes<AddressNode>,
}

impl From<CustomerNode> for Customer {
    fn from(node: CustomerNode) -> Self {
        let default_id = node.default_address.map(|a| a.id);
        Self {
            email: node.email_address.and_then(|e| e.email_address),
            first_name: node.first_name.filter(|n| !n.is_empty()),
            last_name: node.last_name.filter(|n| !n.is_empty()),
            phone: node.phone_number.and_then(|p| p.phone_number),
            addresses: node
                .addresses
                .nodes
                .into_iter()
                .map(|a| a.into_address(default_id.as_deref()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct FulfillmentNode {
    pub status: Option<String>,
}

/// Map the latest fulfillment's event status onto the order-level status.
pub(super) fn fulfillment_status(fulfillments: &Nodes<FulfillmentNode>) -> FulfillmentStatus {
    match fulfillments.nodes.first().and_then(|f| f.status.as_deref()) {
        None => FulfillmentStatus::Unfulfilled,
        Some("SUCCESS") => FulfillmentStatus::Fulfilled,
        Some("OPEN" | "PENDING") => FulfillmentStatus::InProgress,
        Some(_) => FulfillmentStatus::Unknown,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderSummaryNode {
    pub id: String,
    pub name: String,
    pub number: i64,
    pub processed_at: DateTime<Utc>,
    pub financial_status: Option<FinancialStatus>,
    pub fulfillments: Nodes<FulfillmentNode>,
    pub total_price: MoneyNode,
}

impl OrderSummaryNode {
    pub(super) fn into_summary(self) -> Result<OrderSummary, ShopifyError> {
        Ok(OrderSummary {
            fulfillment_status: fulfillment_status(&self.fulfillments),
            id: OrderId::new(self.id),
            name: self.name,
            number: self.number,
            processed_at: self.processed_at,
            financial_status: self.financial_status.unwrap_or_default(),
            total: self.total_price.parse()?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LineItemImageNode {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LineItemNode {
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: Option<MoneyNode>,
    pub total_price: Option<MoneyNode>,
    pub image: Option<LineItemImageNode>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShippingAddressNode {
    pub formatted: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrderDetailNode {
    #[serde(flatten)]
    pub summary: OrderSummaryNode,
    pub line_items: Nodes<LineItemNode>,
    pub subtotal: Option<MoneyNode>,
    pub total_tax: Option<MoneyNode>,
    pub total_shipping: Option<MoneyNode>,
    pub shipping_address: Option<ShippingAddressNode>,
    pub status_page_url: Option<String>,
}

fn parse_optional(money: Option<&MoneyNode>) -> Result<Option<Money>, ShopifyError> {
    money.map(MoneyNode::parse).transpose()
}

impl OrderDetailNode {
    pub(super) fn into_detail(self) -> Result<OrderDetail, ShopifyError> {
        let line_items = self
            .line_items
            .nodes
            .into_iter()
            .map(|item| {
                Ok(OrderLineItem {
                    price: parse_optional(item.price.as_ref())?,
                    total: parse_optional(item.total_price.as_ref())?,
                    title: item.title,
                    variant_title: item.variant_title.filter(|t| !t.is_empty()),
                    quantity: item.quantity,
                    image: item.image.map(|i| Image {
                        url: i.url,
                        alt_text: i.alt_text,
                        width: None,
                        height: None,
                    }),
                })
            })
            .collect::<Result<Vec<_>, ShopifyError>>()?;

        Ok(OrderDetail {
            subtotal: parse_optional(self.subtotal.as_ref())?,
            total_tax: parse_optional(self.total_tax.as_ref())?,
            total_shipping: parse_optional(self.total_shipping.as_ref())?,
            summary: self.summary.into_summary()?,
            line_items,
            shipping_address: self
                .shipping_address
                .map(|a| a.formatted)
                .unwrap_or_default(),
            status_page_url: self.status_page_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_challenge_rfc7636_vector() {
        // RFC 7636 appendix B
        let pkce =
            PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_random_token_length() {
        let token = random_token(32);
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(32));
    }

    #[test]
    fn test_token_expiry_buffer() {
        let token = CustomerAccessToken {
            access_token: "t".to_string(),
            id_token: None,
            refresh_token: None,
            expires_in: Some(3600),
            obtained_at: 1_000,
        };
        assert!(!token.is_expired_at(1_000 + 3_500));
        assert!(token.is_expired_at(1_000 + 3_540));
    }

    #[test]
    fn test_customer_marks_default_address() {
        let node: CustomerNode = serde_json::from_str(
            r#"{
                "firstName": "Ada", "lastName": "",
                "emailAddress": {"emailAddress": "ada@example.com"},
                "phoneNumber": null,
                "defaultAddress": {"id": "gid://shopify/CustomerAddress/2"},
                "addresses": {"nodes": [
                    {"id": "gid://shopify/CustomerAddress/1", "firstName": null, "lastName": null, "company": null,
                     "address1": "1 Main St", "address2": null, "city": "Ottawa", "zoneCode": "ON",
                     "territoryCode": "CA", "zip": "K1A 0A1", "phoneNumber": null},
                    {"id": "gid://shopify/CustomerAddress/2", "firstName": null, "lastName": null, "company": null,
                     "address1": "2 Side St", "address2": "", "city": "Toronto", "zoneCode": "ON",
                     "territoryCode": "CA", "zip": null, "phoneNumber": null}
                ]}
            }"#,
        )
        .unwrap();
        let customer = Customer::from(node);

        assert_eq!(customer.full_name(), "Ada");
        assert_eq!(customer.email.as_deref(), Some("ada@example.com"));
        let default = customer.default_address().unwrap();
        assert_eq!(default.id.legacy_id(), "2");
        assert_eq!(default.formatted_single_line(), "2 Side St, Toronto, ON, CA");
    }

    #[test]
    fn test_order_summary_conversion() {
        let node: OrderSummaryNode = serde_json::from_str(
            r##"{
                "id": "gid://shopify/Order/77", "name": "#1001", "number": 1001,
                "processedAt": "2026-02-01T10:00:00Z", "financialStatus": "PAID",
                "fulfillments": {"nodes": [{"status": "SUCCESS"}]},
                "totalPrice": {"amount": "42.0", "currencyCode": "USD"}
            }"##,
        )
        .unwrap();
        let order = node.into_summary().unwrap();

        assert_eq!(order.id.legacy_id(), "77");
        assert_eq!(order.financial_status, FinancialStatus::Paid);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(order.total.display(), "$42.00");
    }

    #[test]
    fn test_user_errors_message() {
        let errors = vec![
            CustomerUserError {
                field: Some(vec!["address".to_string(), "zip".to_string()]),
                message: "is invalid".to_string(),
            },
            CustomerUserError {
                field: None,
                message: "Something else".to_string(),
            },
        ];
        assert_eq!(user_errors_message(&errors), "zip: is invalid; Something else");
    }
}
