pub mod admin;
pub mod cart;
pub mod generation;
pub mod images;
pub mod orders;
pub mod upload;
