pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod orders;
