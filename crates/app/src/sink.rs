//! Balance sink for the host binary

use async_trait::async_trait;
use banklink_core::BalanceSink;
use banklink_domain::{AccountBalance, Result};

/// Emits every balance signal as a structured log event
pub struct LoggingBalanceSink;

#[async_trait]
impl BalanceSink for LoggingBalanceSink {
    async fn publish(&self, balance: &AccountBalance) -> Result<()> {
        tracing::info!(
            key = %balance.key,
            label = %balance.label,
            value = balance.value,
            currency = %balance.currency,
            "balance"
        );
        Ok(())
    }
}
