//! Prompt templates and their slot variants.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use printshop_core::prompt_compose::SlotVariantPart;
use printshop_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub title: String,
    pub prompt_text: Option<String>,
    pub category_id: Option<DbId>,
    pub subcategory_id: Option<DbId>,
    /// Legacy price reference, consulted when no price row names this prompt as owner.
    pub price_id: Option<DbId>,
    pub active: bool,
    pub example_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub title: String,
    pub prompt_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Slot types and variants
// ---------------------------------------------------------------------------

/// A row from the `prompt_slot_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotType {
    pub id: DbId,
    pub name: String,
    pub position: i32,
}

/// A slot variant joined with the position of its slot type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotVariant {
    pub id: DbId,
    pub slot_type_id: DbId,
    pub name: String,
    pub prompt: Option<String>,
    pub llm_id: Option<String>,
    pub example_image: Option<String>,
    pub slot_position: Option<i32>,
}

impl From<&SlotVariant> for SlotVariantPart {
    fn from(v: &SlotVariant) -> Self {
        SlotVariantPart {
            id: v.id,
            name: v.name.clone(),
            prompt: v.prompt.clone(),
            slot_position: v.slot_position,
        }
    }
}

/// DTO for creating a slot variant.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlotVariant {
    pub slot_type_id: DbId,
    pub name: String,
    pub prompt: Option<String>,
}
