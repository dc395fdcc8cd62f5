//! Poll loop driving extract -> update on a fixed delay.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::Config;
use crate::extractor::SportEventDataExtractor;
use crate::fetcher::UpstreamClient;
use crate::store::{ChangeLoggingStore, EventStore, SportEventStateStore};

/// Single writer (the poll loop), many readers (HTTP handlers).
pub type SharedStore = Arc<RwLock<ChangeLoggingStore<SportEventStateStore>>>;

pub fn shared_store() -> SharedStore {
    Arc::new(RwLock::new(ChangeLoggingStore::new(SportEventStateStore::new())))
}

/// Service health state
#[derive(Clone, Default)]
pub struct HealthState {
    pub last_poll_time: Arc<RwLock<Option<DateTime<Utc>>>>,
    pub last_poll_count: Arc<RwLock<usize>>,
    pub error_count: Arc<RwLock<usize>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_success(&self, count: usize) {
        *self.last_poll_time.write().await = Some(Utc::now());
        *self.last_poll_count.write().await = count;
        *self.error_count.write().await = 0;
    }

    pub async fn record_error(&self) {
        *self.error_count.write().await += 1;
    }
}

pub struct IngestionService {
    config: Config,
    extractor: SportEventDataExtractor,
    store: SharedStore,
    health: HealthState,
}

impl IngestionService {
    pub fn new(config: Config, store: SharedStore, health: HealthState) -> Result<Self> {
        let client = UpstreamClient::new(&config).context("Failed to create HTTP client")?;
        let extractor = SportEventDataExtractor::from_config(&config, client);
        Ok(Self::with_extractor(config, extractor, store, health))
    }

    pub fn with_extractor(
        config: Config,
        extractor: SportEventDataExtractor,
        store: SharedStore,
        health: HealthState,
    ) -> Self {
        Self {
            config,
            extractor,
            store,
            health,
        }
    }

    /// Main polling loop.
    ///
    /// The next cycle starts only after the previous one finished, so cycles never overlap.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting poll loop (interval: {:?}, upstream: {})",
            self.config.poll_interval, self.config.base_api_url
        );

        loop {
            let start = Instant::now();

            match self.poll_once().await {
                Ok(count) => {
                    self.health.record_success(count).await;
                    info!("Poll completed: {} live events in {:?}", count, start.elapsed());
                }
                Err(e) => {
                    self.health.record_error().await;
                    error!("Poll failed, keeping previous snapshot: {:#}", e);
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Single poll iteration. The store is only touched when extraction succeeded.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let events = self
            .extractor
            .extract()
            .await
            .context("Extraction cycle failed")?;

        let mut store = self.store.write().await;
        store.update(events);
        Ok(store.list().len())
    }
}
