/// Common test utilities for integration tests
///
/// Shared infrastructure for the API integration tests:
/// - Test database setup with migrations
/// - Test Redis connection
/// - Customer and admin account creation
/// - JWT token generation
/// - Catalog seeding helpers

use sqlx::PgPool;
use uuid::Uuid;
use vitrine_api::app::{build_router, AppState};
use vitrine_api::config::Config;
use vitrine_shared::auth::jwt::{create_token, Claims, TokenType};
use vitrine_shared::auth::password;
use vitrine_shared::models::product::{CreateProduct, Product};
use vitrine_shared::models::user::{CreateUser, User, UserRole};
use vitrine_shared::redis::{RedisClient, RedisConfig};

/// Password used for every test account
pub const TEST_PASSWORD: &str = "TestP4ssword";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub redis: RedisClient,
    pub app: axum::Router,
    pub config: Config,
    pub customer: User,
    pub admin: User,
    pub customer_token: String,
    pub admin_token: String,
}

impl TestContext {
    /// Creates a new test context with fresh database and Redis
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        let redis_config = RedisConfig::from_env()?;
        let redis = RedisClient::new(redis_config).await?;

        let password_hash = password::hash_password(TEST_PASSWORD)?;

        let customer = User::create(
            &db,
            CreateUser {
                email: format!("customer-{}@example.com", Uuid::new_v4()),
                password_hash: password_hash.clone(),
                name: Some("Test Customer".to_string()),
                role: UserRole::Customer,
            },
        )
        .await?;

        let admin = User::create(
            &db,
            CreateUser {
                email: format!("admin-{}@example.com", Uuid::new_v4()),
                password_hash,
                name: Some("Test Admin".to_string()),
                role: UserRole::Admin,
            },
        )
        .await?;

        let customer_claims = Claims::new(customer.id, customer.role, TokenType::Access);
        let customer_token = create_token(&customer_claims, &config.jwt.secret)?;

        let admin_claims = Claims::new(admin.id, admin.role, TokenType::Access);
        let admin_token = create_token(&admin_claims, &config.jwt.secret)?;

        let state = AppState::new(db.clone(), redis.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            redis,
            app,
            config,
            customer,
            admin,
            customer_token,
            admin_token,
        })
    }

    /// Authorization header value for the customer account
    pub fn customer_auth(&self) -> String {
        format!("Bearer {}", self.customer_token)
    }

    /// Authorization header value for the admin account
    pub fn admin_auth(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Cleans up test data
    ///
    /// Deleting the accounts cascades to orders, reviews, wishlists and
    /// carts; seeded products are removed separately by the tests that
    /// create them.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.customer.id).await?;
        User::delete(&self.db, self.admin.id).await?;
        Ok(())
    }
}

/// Seeds one product directly through the model layer
pub async fn create_test_product(
    ctx: &TestContext,
    title: &str,
    price: f64,
    stock: i32,
) -> anyhow::Result<Product> {
    let product = Product::create(
        &ctx.db,
        CreateProduct {
            // Unique suffix keeps slugs from colliding across test runs
            title: format!("{} {}", title, Uuid::new_v4()),
            description: Some("Integration test product".to_string()),
            price,
            compare_at_price: None,
            stock,
            sizes: vec![],
            colors: vec![],
            category_id: None,
            image_url: None,
        },
    )
    .await?;

    Ok(product)
}
