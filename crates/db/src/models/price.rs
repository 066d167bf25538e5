//! Price rows. A price belongs to at most one article or one prompt.

use serde::Serialize;
use sqlx::FromRow;
use printshop_core::error::CoreError;
use printshop_core::pricing::{CalcMode, PriceAmounts, PriceOwner};
use printshop_core::types::{Cents, DbId, Timestamp};

/// A row from the `prices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Price {
    pub id: DbId,
    pub article_id: Option<DbId>,
    pub prompt_id: Option<DbId>,
    pub purchase_total_net: Cents,
    pub purchase_total_tax: Cents,
    pub purchase_total_gross: Cents,
    pub sales_total_net: Cents,
    pub sales_total_tax: Cents,
    pub sales_total_gross: Cents,
    pub purchase_vat_rate_id: Option<DbId>,
    pub sales_vat_rate_id: Option<DbId>,
    pub calc_mode: String,
    pub corresponds_to: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Price {
    /// The owner recorded on this row, if any.
    pub fn owner(&self) -> Result<Option<PriceOwner>, CoreError> {
        PriceOwner::from_columns(self.article_id, self.prompt_id)
    }
}

/// DTO for creating a price. `owner` may be left unset and assigned later.
#[derive(Debug, Clone)]
pub struct CreatePrice {
    pub owner: Option<PriceOwner>,
    pub purchase: PriceAmounts,
    pub sales: PriceAmounts,
    pub calc_mode: CalcMode,
}
