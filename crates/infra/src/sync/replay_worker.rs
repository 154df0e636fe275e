//! Background replay worker.
//!
//! Drives [`ReplayEngine::flush`] on a fixed interval and whenever a caller
//! asks for an immediate pass, for example after connectivity returns. Join
//! handles are tracked and cancellation is explicit. Per-send timeouts belong
//! to the engine, so a pass always runs to completion and every hung send is
//! recorded against its item.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fieldsync_core::{ReplayEngine, StaticTokenProvider};
//! use fieldsync_infra::sync::{ReplayWorker, ReplayWorkerConfig};
//!
//! # async fn example(engine: Arc<ReplayEngine>) -> fieldsync_domain::Result<()> {
//! let tokens = Arc::new(StaticTokenProvider::new("access-token"));
//! let mut worker = ReplayWorker::new(engine, tokens, ReplayWorkerConfig::default());
//!
//! worker.start()?;
//! worker.trigger();
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use fieldsync_core::{ReplayEngine, TokenProvider};
use fieldsync_domain::constants::DEFAULT_FLUSH_INTERVAL_SECS;
use fieldsync_domain::{FieldSyncError, FlushSummary, ReplayConfig, Result};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the replay worker.
#[derive(Debug, Clone)]
pub struct ReplayWorkerConfig {
    /// Interval between scheduled passes
    pub flush_interval: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
    /// When false, `start` leaves the worker idle
    pub enabled: bool,
}

impl Default for ReplayWorkerConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            join_timeout: Duration::from_secs(5),
            enabled: true,
        }
    }
}

impl From<&ReplayConfig> for ReplayWorkerConfig {
    fn from(config: &ReplayConfig) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            enabled: config.enabled,
            ..Self::default()
        }
    }
}

/// Replay worker with explicit lifecycle management.
pub struct ReplayWorker {
    engine: Arc<ReplayEngine>,
    tokens: Arc<dyn TokenProvider>,
    config: ReplayWorkerConfig,
    cancellation: CancellationToken,
    wake: Arc<Notify>,
    summaries: watch::Sender<Option<FlushSummary>>,
    task_handle: Option<JoinHandle<()>>,
}

impl ReplayWorker {
    pub fn new(
        engine: Arc<ReplayEngine>,
        tokens: Arc<dyn TokenProvider>,
        config: ReplayWorkerConfig,
    ) -> Self {
        let (summaries, _) = watch::channel(None);
        Self {
            engine,
            tokens,
            config,
            cancellation: CancellationToken::new(),
            wake: Arc::new(Notify::new()),
            summaries,
            task_handle: None,
        }
    }

    /// Start the worker, spawning the background replay task.
    ///
    /// A worker whose configuration disables replay stays idle and `start`
    /// returns `Ok(())` without spawning. Must be called from within a Tokio
    /// runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(FieldSyncError::Internal("Replay worker already running".to_string()));
        }

        if !self.config.enabled {
            info!("Replay disabled by configuration; worker not started");
            return Ok(());
        }

        info!("Starting replay worker");

        // Create fresh cancellation token
        self.cancellation = CancellationToken::new();

        let engine = Arc::clone(&self.engine);
        let tokens = Arc::clone(&self.tokens);
        let wake = Arc::clone(&self.wake);
        let summaries = self.summaries.clone();
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::replay_loop(engine, tokens, wake, summaries, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Replay worker started");

        Ok(())
    }

    /// Stop the worker and wait for the replay task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            return Err(FieldSyncError::Internal("Replay worker not running".to_string()));
        }

        info!("Stopping replay worker");

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Replay task panicked: {}", e);
                    return Err(FieldSyncError::Internal("Replay task panicked".to_string()));
                }
                Err(_) => {
                    warn!("Replay task did not complete within timeout");
                    return Err(FieldSyncError::Internal("Replay task timeout".to_string()));
                }
            }
        }

        info!("Replay worker stopped");
        self.cancellation = CancellationToken::new();

        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Request a pass as soon as possible.
    ///
    /// Triggers raised while a pass is running coalesce into one follow-up.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    /// Watch the summary of the most recent completed pass.
    pub fn subscribe(&self) -> watch::Receiver<Option<FlushSummary>> {
        self.summaries.subscribe()
    }

    async fn replay_loop(
        engine: Arc<ReplayEngine>,
        tokens: Arc<dyn TokenProvider>,
        wake: Arc<Notify>,
        summaries: watch::Sender<Option<FlushSummary>>,
        config: ReplayWorkerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Replay loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.flush_interval) => {
                    debug!("Scheduled replay pass");
                }
                _ = wake.notified() => {
                    debug!("Triggered replay pass");
                }
            }

            let started = Instant::now();
            let pass = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Replay loop cancelled mid-pass");
                    break;
                }
                pass = engine.flush(tokens.as_ref()) => pass,
            };

            match pass {
                Ok(summary) => {
                    if summary.processed > 0 {
                        info!(
                            processed = summary.processed,
                            succeeded = summary.succeeded,
                            failed = summary.failed,
                            abandoned = summary.abandoned,
                            remaining = summary.remaining,
                            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                            "Replay pass completed"
                        );
                    }
                    summaries.send_replace(Some(summary));
                }
                Err(e) => {
                    error!(error = %e, "Replay pass failed");
                }
            }
        }
    }
}

impl Drop for ReplayWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReplayWorker dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
