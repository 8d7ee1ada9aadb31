//! One-time admin password setup.
//!
//! Hashes the given password and stores it in the bot_config table; run
//! once per install before using /manage.

use brotherhood_kos::config::Settings;
use brotherhood_kos::database::{connection, Database};
use brotherhood_kos::services::AdminService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new()?;
    settings.validate()?;

    let password = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: set_password <new-password>"))?;

    let pool_config = connection::PoolConfig::from_settings(&settings.database);
    let pool = connection::create_pool(&pool_config).await?;
    connection::run_migrations(&pool).await?;

    let admin = AdminService::new(
        Database::new(pool),
        settings.api.shared_secret.clone(),
        settings.api.admin_session_ttl_minutes,
    );
    admin.set_password(&password).await?;

    println!("Admin password updated.");
    Ok(())
}
