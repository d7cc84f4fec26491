/// Database models for Vitrine
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: Customer/admin accounts with embedded addresses
/// - `category`: Product categories with derived slugs
/// - `product`: Catalog entries with variant stock and rating aggregates
/// - `order`: Checkout snapshots with status/payment state machines
/// - `review`: One-per-(user, product) ratings feeding product aggregates
/// - `wishlist`: One-per-user ordered product lists
/// - `cart`: One-per-user item collections consumed by checkout
/// - `setting`: Singleton store configuration
///
/// # Example
///
/// ```no_run
/// use vitrine_shared::models::user::{CreateUser, User, UserRole};
/// use vitrine_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: Some("Jo Doe".to_string()),
///     role: UserRole::Customer,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod review;
pub mod setting;
pub mod user;
pub mod wishlist;
