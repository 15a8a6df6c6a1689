//! Application services

pub mod booking;
pub mod slot;
pub mod slot_generation;

pub use booking::BookingService;
pub use slot::SlotService;
pub use slot_generation::{GenerationReport, ResetReport, SlotGenerationService};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::warn;

use crate::domain::{DomainError, DomainResult};

/// Run a storage operation under a deadline.
///
/// Dropping the inner future on expiry drops any open transaction with it,
/// which rolls it back.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &str, fut: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} exceeded {} ms, rolled back", operation, limit.as_millis());
            Err(DomainError::Timeout(format!(
                "{} did not complete within {} ms",
                operation,
                limit.as_millis()
            )))
        }
    }
}

/// Reject inverted instant ranges.
pub(crate) fn ensure_ordered(from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<()> {
    if from > to {
        return Err(DomainError::Validation(format!(
            "range start {} is after range end {}",
            from.to_rfc3339(),
            to.to_rfc3339()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_operations_time_out() {
        let result: DomainResult<()> = bounded(Duration::from_millis(10), "sleepy", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(DomainError::Timeout(_))));
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let result = bounded(Duration::from_secs(1), "quick", async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn inverted_range_is_invalid() {
        let now = Utc::now();
        assert!(ensure_ordered(now, now).is_ok());
        assert!(matches!(
            ensure_ordered(now, now - chrono::Duration::seconds(1)),
            Err(DomainError::Validation(_))
        ));
    }
}
