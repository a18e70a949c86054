pub mod cart;
pub mod good;
pub mod order;
pub mod user;
