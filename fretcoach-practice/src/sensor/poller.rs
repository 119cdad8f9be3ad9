//! HTTP polling sensor feed
//!
//! Fetches once immediately on start, then once per interval. Each tick
//! spawns its own request, so a slow response never delays the next tick;
//! responses are applied in arrival order. Stopping cancels the timer and
//! discards the results of requests still in flight.

use super::{SensorFeed, SensorState};
use crate::client::ApiClient;
use fretcoach_common::config::StaleReadingPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Polls `POST /api/sensor/processed` on a fixed interval
pub struct SensorPoller {
    client: Arc<ApiClient>,
    period: Duration,
    policy: StaleReadingPolicy,
    tx: Arc<watch::Sender<SensorState>>,
    cancel_token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl SensorPoller {
    pub fn new(client: Arc<ApiClient>, period: Duration, policy: StaleReadingPolicy) -> Self {
        let (tx, _) = watch::channel(SensorState::default());
        Self {
            client,
            period,
            policy,
            tx: Arc::new(tx),
            cancel_token: None,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Latest state without subscribing
    pub fn current(&self) -> SensorState {
        self.tx.borrow().clone()
    }

    fn spawn_fetch(&self, token: &CancellationToken) {
        spawn_fetch(
            Arc::clone(&self.client),
            Arc::clone(&self.tx),
            token.clone(),
            self.policy,
        );
    }
}

fn spawn_fetch(
    client: Arc<ApiClient>,
    tx: Arc<watch::Sender<SensorState>>,
    token: CancellationToken,
    policy: StaleReadingPolicy,
) {
    tokio::spawn(async move {
        let result = client.fetch_processed().await;
        if token.is_cancelled() {
            debug!("Discarding sensor response received after stop");
            return;
        }
        tx.send_modify(|state| state.apply(result, policy));
    });
}

impl SensorFeed for SensorPoller {
    fn start(&mut self) {
        if self.is_running() {
            return;
        }

        info!(
            "Sensor poller started ({}ms interval, {})",
            self.period.as_millis(),
            self.client.base_url()
        );

        let token = CancellationToken::new();

        // Immediate fetch, independent of the timer
        self.spawn_fetch(&token);

        let client = Arc::clone(&self.client);
        let tx = Arc::clone(&self.tx);
        let loop_token = token.clone();
        let period = self.period;
        let policy = self.policy;

        self.task = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = timer.tick() => {
                        spawn_fetch(
                            Arc::clone(&client),
                            Arc::clone(&tx),
                            loop_token.clone(),
                            policy,
                        );
                    }
                }
            }
        }));
        self.cancel_token = Some(token);
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
            info!("Sensor poller stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.cancel_token.is_some()
    }

    fn subscribe(&self) -> watch::Receiver<SensorState> {
        self.tx.subscribe()
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
