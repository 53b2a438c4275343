//! Cart maintenance commands.

use chrono::{DateTime, Duration, Utc};
use toko_storefront::db::{CartStore, PgStorage, RepositoryError};

use super::{CommandError, connect};

/// Errors from cart maintenance.
#[derive(Debug, thiserror::Error)]
pub enum CartsError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Delete anonymous cart rows not updated in the last `days` days.
///
/// User-owned rows are never touched.
///
/// # Errors
///
/// Returns `CartsError` if the database is unreachable or the delete fails.
pub async fn prune(days: u32) -> Result<(), CartsError> {
    let cutoff = cutoff(Utc::now(), days);
    let storage = PgStorage::new(connect().await?);

    let deleted = storage.prune_session_items(cutoff).await?;
    tracing::info!(deleted, %cutoff, "Pruned stale anonymous cart rows");
    Ok(())
}

fn cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_cutoff_is_days_before_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 8, 0, 0).single();
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single();
        assert_eq!(now.map(|now| cutoff(now, 30)), expected);
    }
}
