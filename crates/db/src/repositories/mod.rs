//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod article_repo;
pub mod cart_item_repo;
pub mod cart_repo;
pub mod image_repo;
pub mod order_repo;
pub mod price_repo;
pub mod prompt_repo;
pub mod user_repo;

pub use article_repo::ArticleRepo;
pub use cart_item_repo::CartItemRepo;
pub use cart_repo::CartRepo;
pub use image_repo::{GeneratedImageRepo, UploadedImageRepo};
pub use order_repo::{Conversion, OrderRepo};
pub use price_repo::PriceRepo;
pub use prompt_repo::PromptRepo;
pub use user_repo::UserRepo;
