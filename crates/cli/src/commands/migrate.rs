//! Database migration command.
//!
//! Migrations are embedded from `migrations/` at the workspace root, so
//! the binary carries them wherever it is deployed.

use super::CommandError;

/// Run all pending migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError` if the connection or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
