//! Converts the active cart into an order.

use printshop_core::types::DbId;
use printshop_db::models::order::{Address, CreateOrder};
use printshop_db::repositories::{CartRepo, Conversion, OrderRepo};
use printshop_db::DbPool;
use serde::Deserialize;
use validator::Validate;

use crate::error::PipelineError;
use crate::orders::{self, OrderView};

const ORDER_CART_CONSTRAINT: &str = "uq_orders_cart_id";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[validate(length(min = 1, max = 255))]
    pub street_address_1: String,
    #[validate(length(max = 255))]
    pub street_address_2: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub city: String,
    #[validate(length(max = 120))]
    pub state: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 2, max = 60))]
    pub country: String,
}

impl From<AddressInput> for Address {
    fn from(input: AddressInput) -> Self {
        Self {
            street_address_1: input.street_address_1.trim().to_string(),
            street_address_2: trimmed(input.street_address_2),
            city: input.city.trim().to_string(),
            state: trimmed(input.state),
            postal_code: input.postal_code.trim().to_string(),
            country: input.country.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 120))]
    pub customer_first_name: String,
    #[validate(length(min = 1, max = 120))]
    pub customer_last_name: String,
    #[validate(length(max = 40))]
    pub customer_phone: Option<String>,
    #[validate(nested)]
    pub shipping_address: AddressInput,
    pub billing_address: Option<AddressInput>,
    #[serde(default)]
    pub use_shipping_as_billing: bool,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Field validation, including the billing address when one is used.
    pub fn check(&self) -> Result<(), PipelineError> {
        self.validate()
            .map_err(|e| PipelineError::validation(e.to_string()))?;
        if !self.use_shipping_as_billing {
            if let Some(billing) = &self.billing_address {
                billing
                    .validate()
                    .map_err(|e| PipelineError::validation(format!("billingAddress: {e}")))?;
            }
        }
        Ok(())
    }

    /// Shipping and billing addresses; billing copies shipping when asked to
    /// or when absent.
    pub fn addresses(&self) -> (Address, Address) {
        let shipping = Address::from(self.shipping_address.clone());
        let billing = match (&self.billing_address, self.use_shipping_as_billing) {
            (Some(billing), false) => Address::from(billing.clone()),
            _ => shipping.clone(),
        };
        (shipping, billing)
    }
}

/// Convert the caller's active cart into a `PENDING` order.
///
/// The cart lines, totals, order items and the cart status change are read
/// and written in one transaction under the cart lock. A second checkout of
/// the same cart finds no active cart and fails with
/// [`PipelineError::CartEmpty`].
pub async fn create_order_from_cart(
    pool: &DbPool,
    user_id: DbId,
    req: &CheckoutRequest,
) -> Result<OrderView, PipelineError> {
    req.check()?;

    let cart = CartRepo::find_active(pool, user_id)
        .await?
        .ok_or(PipelineError::CartEmpty)?;
    if OrderRepo::exists_for_cart(pool, cart.id).await? {
        return Err(PipelineError::DuplicateOrder);
    }

    let (shipping_address, billing_address) = req.addresses();
    let order = CreateOrder {
        user_id,
        cart_id: cart.id,
        customer_email: req.customer_email.trim().to_string(),
        customer_first_name: req.customer_first_name.trim().to_string(),
        customer_last_name: req.customer_last_name.trim().to_string(),
        customer_phone: trimmed(req.customer_phone.clone()),
        shipping_address,
        billing_address,
        notes: trimmed(req.notes.clone()),
    };

    let created = match OrderRepo::create_from_cart(pool, &order).await {
        Ok(Conversion::Created(created)) => created,
        // Empty, or another request converted the cart first.
        Ok(Conversion::CartEmpty | Conversion::CartInactive) => {
            return Err(PipelineError::CartEmpty)
        }
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some(ORDER_CART_CONSTRAINT) =>
        {
            return Err(PipelineError::DuplicateOrder)
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id,
        cart_id = cart.id,
        order_id = %created.id,
        order_number = %created.order_number,
        total = created.total_amount,
        "Order created from cart",
    );

    orders::get_order(pool, user_id, created.id).await
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use printshop_core::error::CoreError;
    use serde_json::json;

    use super::*;

    fn request(billing: Option<serde_json::Value>, same: bool) -> CheckoutRequest {
        let mut body = json!({
            "customerEmail": "ada@example.com",
            "customerFirstName": "Ada",
            "customerLastName": "Lovelace",
            "shippingAddress": {
                "streetAddress1": "1 Main St",
                "city": "Springfield",
                "postalCode": "12345",
                "country": "US"
            },
            "useShippingAsBilling": same
        });
        if let Some(billing) = billing {
            body["billingAddress"] = billing;
        }
        serde_json::from_value(body).unwrap()
    }

    fn other_address() -> serde_json::Value {
        json!({
            "streetAddress1": "9 Side Rd",
            "streetAddress2": "  ",
            "city": "Shelbyville",
            "postalCode": "54321",
            "country": "US"
        })
    }

    #[test]
    fn billing_defaults_to_shipping() {
        let (shipping, billing) = request(None, false).addresses();
        assert_eq!(shipping, billing);
        assert_eq!(shipping.city, "Springfield");
    }

    #[test]
    fn explicit_billing_is_kept() {
        let (shipping, billing) = request(Some(other_address()), false).addresses();
        assert_eq!(shipping.city, "Springfield");
        assert_eq!(billing.city, "Shelbyville");
        assert_eq!(billing.street_address_2, None);
    }

    #[test]
    fn use_shipping_as_billing_wins() {
        let (shipping, billing) = request(Some(other_address()), true).addresses();
        assert_eq!(shipping, billing);
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut req = request(None, true);
        req.customer_email = "not-an-email".into();
        assert_matches!(
            req.check(),
            Err(PipelineError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn empty_shipping_city_is_rejected() {
        let mut req = request(None, true);
        req.shipping_address.city = String::new();
        assert_matches!(
            req.check(),
            Err(PipelineError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn invalid_billing_only_matters_when_used() {
        let mut bad = other_address();
        bad["postalCode"] = json!("");
        assert_matches!(
            request(Some(bad.clone()), false).check(),
            Err(PipelineError::Core(CoreError::Validation(_)))
        );
        assert!(request(Some(bad), true).check().is_ok());
    }
}
