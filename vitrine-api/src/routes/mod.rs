/// API route handlers
///
/// One module per resource, nested under `/api` by the router builder.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod events;
pub mod health;
pub mod orders;
pub mod payment;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlist;
