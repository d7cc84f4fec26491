/// Database access layer
///
/// - `pool`: PostgreSQL connection pool construction and health checks
/// - `migrations`: sqlx migration runner

pub mod migrations;
pub mod pool;

pub use migrations::{get_migration_status, run_migrations, MigrationStatus};
pub use pool::{create_pool, DatabaseConfig};
