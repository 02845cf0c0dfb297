//! Periodic quote to oracle updates
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};

use crate::bindings::{OracleContract, PriceUpdate};
use crate::error::Error;
use crate::keypair::Keypair;
use crate::quote::{QuoteError, QuoteProvider};
use crate::submit::TransactionOutcome;

#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Symbol passed to the quote provider
    pub symbol: String,
    /// Symbol code stored as the update token
    pub token: i128,
    /// Time between two ticks
    pub interval: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            token: 1,
            interval: Duration::from_secs(60),
        }
    }
}

/// Failure of a single tick
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Submit(#[from] Error),
}

/// Pushes one quote per interval into the oracle
pub struct PricePump {
    config: PumpConfig,
    provider: Arc<dyn QuoteProvider>,
    oracle: OracleContract,
    signer: Keypair,
}

impl PricePump {
    pub fn new(
        config: PumpConfig,
        provider: Arc<dyn QuoteProvider>,
        oracle: OracleContract,
        signer: Keypair,
    ) -> Self {
        Self {
            config,
            provider,
            oracle,
            signer,
        }
    }

    /// Fetch a quote and submit it
    pub async fn tick(&self) -> Result<(PriceUpdate, TransactionOutcome), TickError> {
        let quote = self.provider.fetch_quote(&self.config.symbol).await?;
        let update = quote.to_update(self.config.token)?;
        tracing::info!(
            symbol = %self.config.symbol,
            state = ?quote.market_state,
            price = %update.price,
            timestamp = %update.timestamp,
            flags = %update.flags,
            "pushing quote"
        );
        let outcome = self.oracle.update(&self.signer, &update).await?;
        Ok((update, outcome))
    }

    /// Tick every interval until `shutdown` resolves, returns the number of ticks run.
    ///
    /// The first tick runs immediately. A tick always completes before the
    /// next one starts; a tick that overruns delays the next one instead of
    /// bursting. Tick failures are logged and the loop carries on.
    pub async fn run<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut ticks = 0u64;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(ticks, "price pump stopped");
                    return ticks;
                }
                _ = ticker.tick() => {}
            }

            ticks += 1;
            match self.tick().await {
                Ok((update, outcome)) => tracing::info!(
                    hash = %outcome.hash,
                    status = ?outcome.status,
                    price = %update.price,
                    "oracle updated"
                ),
                Err(e) => tracing::warn!(error = %e, "price pump tick failed"),
            }
        }
    }
}
