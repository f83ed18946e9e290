//! Periodic balance poller
//!
//! Polls the monetary accounts of one user immediately on start and then on
//! a fixed interval, publishing one balance signal per account.

use std::sync::Arc;
use std::time::Duration;

use banklink_core::accounts::balance_signal;
use banklink_core::BalanceSink;
use banklink_domain::{BankLinkError, PollerConfig, Result};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;

/// Bound on how long `stop` waits for the loop to exit
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Settings for [`AccountPoller`]
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub user_id: u64,
    /// Prefix of published balance labels
    pub device_name: String,
}

impl PollerSettings {
    /// Settings from configuration; a user id is required.
    pub fn from_config(config: &PollerConfig) -> Result<Self> {
        let user_id = config
            .user_id
            .ok_or_else(|| BankLinkError::Config("poller.user_id is not set; run `pair` first".into()))?;
        Ok(Self {
            interval: Duration::from_secs(config.interval_secs.max(1)),
            user_id,
            device_name: config.device_name.clone(),
        })
    }
}

/// Background poller with explicit `start`/`stop` lifecycle
pub struct AccountPoller {
    client: ApiClient,
    sink: Arc<dyn BalanceSink>,
    settings: PollerSettings,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl AccountPoller {
    pub fn new(client: ApiClient, sink: Arc<dyn BalanceSink>, settings: PollerSettings) -> Self {
        Self {
            client,
            sink,
            settings,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start polling in the background.
    ///
    /// # Errors
    ///
    /// Returns error if the poller is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running().await {
            return Err(BankLinkError::Internal("poller already running".into()));
        }

        // Fresh token so a stopped poller can be started again
        self.cancellation_token = CancellationToken::new();

        let client = self.client.clone();
        let sink = Arc::clone(&self.sink);
        let settings = self.settings.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(client, sink, settings, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!(interval_secs = self.settings.interval.as_secs(), "account poller started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns error if the poller is not running or the loop does not exit
    /// within five seconds
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running().await {
            return Err(BankLinkError::Internal("poller not running".into()));
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("poller task panicked: {}", e);
                    return Err(BankLinkError::Internal("poller task panicked".into()));
                }
                Err(_) => {
                    warn!("poller task did not complete within timeout");
                    return Err(BankLinkError::Internal("poller task timeout".into()));
                }
            }
        }

        info!("account poller stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.task_handle.lock().await.is_some()
    }

    /// Poll once and publish every balance. Returns the number published.
    pub async fn poll_once(&self) -> Result<usize> {
        poll(&self.client, self.sink.as_ref(), &self.settings).await
    }

    async fn poll_loop(
        client: ApiClient,
        sink: Arc<dyn BalanceSink>,
        settings: PollerSettings,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("poll loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = poll(&client, sink.as_ref(), &settings).await {
                        warn!(error = %err, category = ?err.category(), "balance poll failed");
                    }
                }
            }
        }
    }
}

impl Drop for AccountPoller {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}

async fn poll(client: &ApiClient, sink: &dyn BalanceSink, settings: &PollerSettings) -> Result<usize> {
    let accounts = client.list_monetary_accounts(settings.user_id).await?;

    let mut published = 0;
    for account in &accounts {
        let Some(balance) = balance_signal(settings.user_id, &settings.device_name, account) else {
            warn!(account_id = account.id, value = %account.balance.value, "balance is not a number");
            continue;
        };
        match sink.publish(&balance).await {
            Ok(()) => published += 1,
            Err(err) => warn!(key = %balance.key, error = %err, "failed to publish balance"),
        }
    }

    debug!(accounts = accounts.len(), published, "balances polled");
    Ok(published)
}
