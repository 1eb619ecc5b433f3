//! Key-value configuration storage.

use sqlx::PgPool;

use super::RepositoryError;

/// Configuration key for the dashboard's low-stock alert threshold.
pub const STOCK_ALERT_THRESHOLD_KEY: &str = "stock_alert_threshold";

/// Default low-stock threshold when the setting is absent or malformed.
pub const DEFAULT_STOCK_ALERT_THRESHOLD: i32 = 5;

/// Parse a stored threshold value, falling back to the default.
#[must_use]
pub fn parse_threshold(value: Option<String>) -> i32 {
    value
        .and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|n| *n >= 0)
        .unwrap_or(DEFAULT_STOCK_ALERT_THRESHOLD)
}

/// Get a configuration value by its key.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<String>, RepositoryError> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT setting_value FROM configuration WHERE setting_key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;
    Ok(value.flatten())
}

/// Insert or update a configuration value.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_setting(pool: &PgPool, key: &str, value: &str) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO configuration (setting_key, setting_value) VALUES ($1, $2) \
         ON CONFLICT (setting_key) DO UPDATE SET setting_value = $2",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// The low-stock alert threshold the dashboard compares against.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn stock_alert_threshold(pool: &PgPool) -> Result<i32, RepositoryError> {
    let value = get_setting(pool, STOCK_ALERT_THRESHOLD_KEY).await?;
    Ok(parse_threshold(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(parse_threshold(Some("8".to_string())), 8);
        assert_eq!(parse_threshold(Some(" 12 ".to_string())), 12);
        assert_eq!(parse_threshold(Some("not a number".to_string())), 5);
        assert_eq!(parse_threshold(Some("-3".to_string())), 5);
        assert_eq!(parse_threshold(None), 5);
    }
}
