//! Request-level workflows that tie storage, the database, the image
//! providers and the print output together.
//!
//! - [`generation`] turns an upload plus a prompt into stored candidates.
//! - [`cart`] is the cart engine (add, merge, re-pack, price refresh).
//! - [`checkout`] converts the active cart into an order.
//! - [`orders`] lists orders and builds their print PDFs.
//! - [`example_images`] stores admin-provided catalog images.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod example_images;
pub mod generation;
pub mod orders;

pub use error::PipelineError;
