//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row and, where rows are inserted by the application, a create DTO.

pub mod cart;
pub mod catalog;
pub mod image;
pub mod order;
pub mod price;
pub mod prompt;
pub mod status;
pub mod user;
