use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{BalanceSheetRecord, IncomeRecord, PriceRecord, ResultTable};

pub mod normalize;
pub mod schema;
pub mod simfin_client;

pub use simfin_client::SimFinClient;

/// Simple rate limiter for API requests.
///
/// Fixed delay before every request, no burst allowance. SimFin's free tier
/// allows 2 requests per second, so the default interval is 500 ms. Only
/// bounds a sequential caller; concurrent callers need their own pacing.
pub struct ApiRateLimiter {
    delay_ms: u64,
}

impl ApiRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let delay_ms = if requests_per_second > 0 {
            1_000 / requests_per_second as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Common trait for financial data providers
#[async_trait]
pub trait FinancialDataProvider {
    async fn fetch_prices(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<PriceRecord>;

    async fn fetch_income_statement(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<IncomeRecord>;

    async fn fetch_balance_sheet(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ResultTable<BalanceSheetRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_enforces_delay() {
        let limiter = ApiRateLimiter::new(10); // 10 requests per second

        let start = std::time::Instant::now();
        limiter.wait().await;
        limiter.wait().await;

        // Two waits at 10 rps should take at least ~200 ms
        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[test]
    fn test_rate_limiter_zero_rate_falls_back() {
        let limiter = ApiRateLimiter::new(0);
        assert_eq!(limiter.delay_ms, 1000);
    }
}
