//! Account route handlers.
//!
//! Every handler takes [`RequireShopifyCustomer`], so anonymous visitors are
//! sent through the hosted login and brought back afterwards. Profile and
//! address forms re-render their page with the outcome instead of erroring.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use skeleton_core::{AddressId, OrderId};
use tracing::{info, instrument};

use super::CursorQuery;
use crate::error::{AppError, FormOutcome, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireShopifyCustomer;
use crate::shopify::customer::{
    AddressInput, Customer, CustomerUpdateInput, OrderDetail, OrderSummary,
};
use crate::shopify::types::Connection;
use crate::state::AppState;

/// Orders per history page.
const ORDERS_PER_PAGE: u32 = 20;

// =============================================================================
// Templates
// =============================================================================

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub customer: Customer,
    pub orders: Connection<OrderSummary>,
    pub is_first_page: bool,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub order: OrderDetail,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub customer: Customer,
    pub outcome: Option<FormOutcome>,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub customer: Customer,
    pub outcome: Option<FormOutcome>,
}

// =============================================================================
// Forms
// =============================================================================

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl ProfileForm {
    fn into_input(self) -> CustomerUpdateInput {
        CustomerUpdateInput {
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
        }
    }
}

/// Address form data, shared by create and update.
#[derive(Debug, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zone_code: String,
    #[serde(default)]
    pub territory_code: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone_number: String,
    /// Checkbox; present when ticked.
    pub default: Option<String>,
}

impl AddressForm {
    fn is_default(&self) -> bool {
        self.default.is_some()
    }

    fn into_input(self) -> AddressInput {
        AddressInput {
            first_name: non_empty(self.first_name),
            last_name: non_empty(self.last_name),
            company: non_empty(self.company),
            address1: non_empty(self.address1),
            address2: non_empty(self.address2),
            city: non_empty(self.city),
            zone_code: non_empty(self.zone_code).map(|c| c.to_uppercase()),
            territory_code: non_empty(self.territory_code).map(|c| c.to_uppercase()),
            zip: non_empty(self.zip),
            phone_number: non_empty(self.phone_number),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// `/account` lands on the order history.
pub async fn index() -> Redirect {
    Redirect::to("/account/orders")
}

/// Display order history.
#[instrument(skip(state, token))]
pub async fn orders(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Query(query): Query<CursorQuery>,
) -> Result<OrdersTemplate> {
    let client = state.customer();
    let (customer, orders) = tokio::try_join!(
        client.get_customer(&token.access_token),
        client.get_orders(&token.access_token, ORDERS_PER_PAGE, query.cursor()),
    )?;

    Ok(OrdersTemplate {
        customer,
        orders,
        is_first_page: query.cursor().is_none(),
    })
}

/// Display a single order by its numeric ID.
#[instrument(skip(state, token))]
pub async fn order(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(id): Path<String>,
) -> Result<OrderTemplate> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("order {id}")));
    }

    let order = state
        .customer()
        .get_order(&token.access_token, &OrderId::from_legacy(&id))
        .await
        .map_err(AppError::from_lookup)?;

    Ok(OrderTemplate { order })
}

/// Display the profile form.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<ProfileTemplate> {
    let customer = state.customer().get_customer(&token.access_token).await?;
    Ok(ProfileTemplate {
        customer,
        outcome: None,
    })
}

/// Update the customer's name.
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<ProfileForm>,
) -> Result<ProfileTemplate> {
    add_breadcrumb("account", "update_profile", None);
    let client = state.customer();

    let outcome = FormOutcome::from_result(
        client
            .update_customer(&token.access_token, form.into_input())
            .await,
    );
    let customer = client.get_customer(&token.access_token).await?;

    Ok(ProfileTemplate {
        customer,
        outcome: Some(outcome),
    })
}

/// Display the address book.
#[instrument(skip_all)]
pub async fn addresses(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
) -> Result<AddressesTemplate> {
    let customer = state.customer().get_customer(&token.access_token).await?;
    Ok(AddressesTemplate {
        customer,
        outcome: None,
    })
}

/// Re-render the address book after a mutation.
async fn addresses_after(
    state: &AppState,
    access_token: &str,
    outcome: FormOutcome,
) -> Result<Response> {
    let customer = state.customer().get_customer(access_token).await?;
    Ok(AddressesTemplate {
        customer,
        outcome: Some(outcome),
    }
    .into_response())
}

/// Parse the numeric address ID from the path.
fn address_id(id: &str) -> Result<AddressId> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::NotFound(format!("address {id}")));
    }
    Ok(AddressId::from_legacy(id))
}

/// Add an address.
#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    add_breadcrumb("account", "create_address", None);
    let default = form.is_default();

    let result = state
        .customer()
        .create_address(&token.access_token, form.into_input(), default)
        .await;
    if result.is_ok() {
        info!("Customer address created");
    }

    addresses_after(&state, &token.access_token, FormOutcome::from_result(result)).await
}

/// Update an address.
#[instrument(skip(state, token, form))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(id): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let address_id = address_id(&id)?;
    add_breadcrumb("account", "update_address", Some(&[("address_id", &id)]));
    let default = form.is_default();

    let result = state
        .customer()
        .update_address(&token.access_token, &address_id, form.into_input(), default)
        .await;

    addresses_after(&state, &token.access_token, FormOutcome::from_result(result)).await
}

/// Delete an address.
#[instrument(skip(state, token))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireShopifyCustomer(token): RequireShopifyCustomer,
    Path(id): Path<String>,
) -> Result<Response> {
    let address_id = address_id(&id)?;
    add_breadcrumb("account", "delete_address", Some(&[("address_id", &id)]));

    let result = state
        .customer()
        .delete_address(&token.access_token, &address_id)
        .await;

    addresses_after(&state, &token.access_token, FormOutcome::from_result(result)).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_form_trims_and_uppercases() {
        let form = AddressForm {
            first_name: " Ada ".to_string(),
            address1: "1 Main St".to_string(),
            zone_code: "on".to_string(),
            territory_code: "ca".to_string(),
            default: Some("on".to_string()),
            ..AddressForm::default()
        };
        assert!(form.is_default());

        let input = form.into_input();
        assert_eq!(input.first_name.as_deref(), Some("Ada"));
        assert_eq!(input.zone_code.as_deref(), Some("ON"));
        assert_eq!(input.territory_code.as_deref(), Some("CA"));
        assert!(input.last_name.is_none());
        assert!(input.company.is_none());
    }

    #[test]
    fn test_address_id_from_path() {
        assert_eq!(
            address_id("42").unwrap().as_str(),
            "gid://shopify/CustomerAddress/42"
        );
        assert!(address_id("gid://shopify/CustomerAddress/42").is_err());
        assert!(address_id("").is_err());
    }
}
