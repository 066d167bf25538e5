//! Cart, order and price arithmetic.
//!
//! All amounts are integer cents. The cart keeps two independent snapshots
//! per line (article and prompt), each as a contractual `*_at_time` value and
//! an `*_original` value that tracks the live price for drift detection.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{Cents, DbId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Flat shipping fee charged when an order has at least one item.
pub const FLAT_SHIPPING_CENTS: Cents = 499;

/// Order tax rate as an integer percentage.
pub const ORDER_TAX_PERCENT: Cents = 8;

/// Lifetime of a lazily created cart, in days.
pub const CART_TTL_DAYS: i64 = 30;

/// Basis points in one hundred percent.
const BASIS_POINTS: i64 = 10_000;

// ---------------------------------------------------------------------------
// Cart lines
// ---------------------------------------------------------------------------

/// The price-relevant snapshot of one cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    pub quantity: i32,
    pub price_at_time: Cents,
    pub original_price: Cents,
    pub prompt_price_at_time: Cents,
    pub prompt_original_price: Cents,
}

impl LineSnapshot {
    /// Unit price charged to the customer (article plus prompt surcharge).
    pub fn unit_total(&self) -> Cents {
        self.price_at_time + self.prompt_price_at_time
    }

    pub fn line_total(&self) -> Cents {
        self.unit_total() * Cents::from(self.quantity)
    }

    pub fn drift(&self) -> DriftFlags {
        DriftFlags {
            has_price_changed: self.price_at_time != self.original_price,
            has_prompt_price_changed: self.prompt_price_at_time != self.prompt_original_price,
        }
    }
}

/// Whether the live prices moved away from the contractual snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftFlags {
    pub has_price_changed: bool,
    pub has_prompt_price_changed: bool,
}

/// Aggregate figures shown for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub item_count: i64,
    pub total_price: Cents,
    pub has_items: bool,
}

/// `item_count = Σ quantity`, `total_price = Σ (price + prompt price) × quantity`.
pub fn summarize<'a>(lines: impl IntoIterator<Item = &'a LineSnapshot>) -> CartSummary {
    let (item_count, total_price) = lines.into_iter().fold((0i64, 0), |(count, total), l| {
        (count + i64::from(l.quantity), total + l.line_total())
    });
    CartSummary {
        item_count,
        total_price,
        has_items: item_count > 0,
    }
}

/// Quantities submitted on add are clamped to at least one.
pub fn normalize_add_quantity(quantity: Option<i32>) -> i32 {
    quantity.filter(|q| *q >= 1).unwrap_or(1)
}

/// Quantities submitted on update must be at least one.
pub fn validate_update_quantity(quantity: i32) -> Result<i32, CoreError> {
    if quantity < 1 {
        return Err(CoreError::Validation(format!(
            "Quantity must be at least 1 (got {quantity})"
        )));
    }
    Ok(quantity)
}

/// New value for an `*_original` snapshot, or `None` when it has not drifted.
pub fn drifted(stored_original: Cents, live: Cents) -> Option<Cents> {
    (stored_original != live).then_some(live)
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Monetary totals of an order, all in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Cents,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Cents,
}

/// Compute order totals from the cart snapshot.
///
/// The subtotal uses the article snapshot (`price_at_time`) only; the prompt
/// surcharge is not part of the order subtotal.
pub fn order_totals<'a>(lines: impl IntoIterator<Item = &'a LineSnapshot>) -> OrderTotals {
    let mut subtotal = 0;
    let mut copies = 0i64;
    for line in lines {
        subtotal += line.price_at_time * Cents::from(line.quantity);
        copies += i64::from(line.quantity);
    }
    let tax = (subtotal * ORDER_TAX_PERCENT).div_euclid(100);
    let shipping = if copies > 0 { FLAT_SHIPPING_CENTS } else { 0 };
    OrderTotals {
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// Which side of a price the entered amount refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalcMode {
    Net,
    Gross,
}

impl CalcMode {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.to_ascii_uppercase().as_str() {
            "NET" => Ok(Self::Net),
            "GROSS" => Ok(Self::Gross),
            other => Err(CoreError::Validation(format!(
                "Unknown calculation mode '{other}'. Must be NET or GROSS"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Net => "NET",
            Self::Gross => "GROSS",
        }
    }
}

/// A `(net, tax, gross)` triple with `gross = net + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceAmounts {
    pub net: Cents,
    pub tax: Cents,
    pub gross: Cents,
}

impl PriceAmounts {
    /// Derive the triple from an entered amount and a VAT rate in basis
    /// points (`1900` = 19 %). Rounding is half-up on the tax share.
    pub fn from_amount(amount: Cents, vat_basis_points: i64, mode: CalcMode) -> Result<Self, CoreError> {
        if amount < 0 {
            return Err(CoreError::Validation("Price must not be negative".into()));
        }
        if vat_basis_points < 0 {
            return Err(CoreError::Validation("VAT rate must not be negative".into()));
        }
        Ok(match mode {
            CalcMode::Net => {
                let tax = (amount * vat_basis_points + BASIS_POINTS / 2) / BASIS_POINTS;
                Self { net: amount, tax, gross: amount + tax }
            }
            CalcMode::Gross => {
                let divisor = BASIS_POINTS + vat_basis_points;
                let net = (amount * BASIS_POINTS + divisor / 2) / divisor;
                Self { net, tax: amount - net, gross: amount }
            }
        })
    }
}

/// The single owner of a price row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOwner {
    Article(DbId),
    Prompt(DbId),
}

impl PriceOwner {
    /// Build from the two nullable owner columns of a price row.
    pub fn from_columns(article_id: Option<DbId>, prompt_id: Option<DbId>) -> Result<Option<Self>, CoreError> {
        match (article_id, prompt_id) {
            (None, None) => Ok(None),
            (Some(id), None) => Ok(Some(Self::Article(id))),
            (None, Some(id)) => Ok(Some(Self::Prompt(id))),
            (Some(_), Some(_)) => Err(CoreError::Internal(
                "Price is owned by both an article and a prompt".into(),
            )),
        }
    }

    /// Reject moving an already-owned price to a different owner.
    pub fn ensure_assignable(current: Option<Self>, next: Self) -> Result<(), CoreError> {
        match current {
            Some(owner) if owner != next => Err(CoreError::Conflict(format!(
                "Price is already owned by {owner:?}; cannot reassign to {next:?}"
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
