//! Domain core for the print-on-demand artwork pipeline.
//!
//! Pure, database-free building blocks shared by every other crate:
//! error kinds, identifier types, the on-disk storage layout, the image
//! codec, prompt composition, canonical JSON and the cart/order pricing
//! rules.

pub mod canonical_json;
pub mod error;
pub mod imaging;
pub mod naming;
pub mod pricing;
pub mod prompt_compose;
pub mod roles;
pub mod storage;
pub mod types;
