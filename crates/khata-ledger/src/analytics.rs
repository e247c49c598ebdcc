//! # Analytics Recorder
//!
//! Daily per-shop counters are updated off the financial write path. The
//! services push an [`AnalyticsDelta`] after their transaction commits; a
//! single worker task applies deltas to `daily_analytics` with bounded
//! retries.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  record_sale ──┐                                                        │
//! │                │ try_send(delta)     ┌──────────────────────┐           │
//! │  collect order ┼────────────────────►│  bounded mpsc queue  │           │
//! │                │  (full → dropped,   └──────────┬───────────┘           │
//! │                │   warn!)                       │                       │
//! │                                                 ▼                       │
//! │                                      ┌──────────────────────┐           │
//! │                                      │  AnalyticsWorker     │           │
//! │                                      │  apply → retry with  │           │
//! │                                      │  doubling backoff    │           │
//! │                                      └──────────┬───────────┘           │
//! │                                                 ▼                       │
//! │                                      daily_analytics (upsert)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here ever reports failure back to the caller of a ledger
//! operation. A delta that exhausts its retries is logged and dropped.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use khata_core::{AnalyticsDelta, Money};
use khata_db::{AnalyticsRepository, Database, DbResult};

use crate::config::AnalyticsSettings;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug)]
enum AnalyticsCommand {
    Record(AnalyticsDelta),
    /// Replies once every delta queued before it has been handled.
    Flush(oneshot::Sender<()>),
    /// Drains the queue, then replies and exits.
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to the analytics worker.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    cmd_tx: mpsc::Sender<AnalyticsCommand>,
}

impl AnalyticsRecorder {
    /// Spawns the worker on the current runtime and returns its handle.
    pub fn start(db: Database, settings: AnalyticsSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(settings.queue_capacity);
        let worker = AnalyticsWorker { db, settings };

        tokio::spawn(async move {
            worker.run(cmd_rx).await;
        });

        AnalyticsRecorder { cmd_tx }
    }

    /// Queues a delta without waiting. A full or closed queue drops it.
    pub fn record(&self, delta: AnalyticsDelta) {
        match self.cmd_tx.try_send(AnalyticsCommand::Record(delta)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(AnalyticsCommand::Record(delta))) => {
                warn!(shop_id = %delta.shop_id, day = %delta.day, "Analytics queue full, delta dropped");
            }
            Err(err) => {
                warn!(error = %err, "Analytics worker stopped, delta dropped");
            }
        }
    }

    /// One order (or manual sale) worth `revenue`, with known `profit`.
    pub fn record_order(&self, shop_id: &str, at: DateTime<Utc>, revenue: Money, profit: Money) {
        self.record(AnalyticsDelta {
            shop_id: shop_id.to_string(),
            day: at.date_naive(),
            views: 0,
            orders: 1,
            revenue_paise: revenue.paise(),
            profit_paise: profit.paise(),
        });
    }

    /// Waits until everything queued so far has been written (or dropped).
    pub async fn flush(&self) -> LedgerResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(AnalyticsCommand::Flush(done_tx))
            .await
            .map_err(|_| channel_closed())?;
        done_rx.await.map_err(|_| channel_closed())
    }

    /// Drains the queue and waits for the worker to stop.
    pub async fn shutdown(&self) -> LedgerResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(AnalyticsCommand::Shutdown(done_tx))
            .await
            .map_err(|_| channel_closed())?;
        done_rx.await.map_err(|_| channel_closed())
    }
}

fn channel_closed() -> LedgerError {
    LedgerError::Config("Analytics channel closed".into())
}

struct AnalyticsWorker {
    db: Database,
    settings: AnalyticsSettings,
}

impl AnalyticsWorker {
    async fn run(self, mut cmd_rx: mpsc::Receiver<AnalyticsCommand>) {
        info!(capacity = self.settings.queue_capacity, "Analytics worker started");

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                AnalyticsCommand::Record(delta) => self.apply_with_retry(&delta).await,
                AnalyticsCommand::Flush(done) => {
                    // Receiver may have given up waiting
                    let _ = done.send(());
                }
                AnalyticsCommand::Shutdown(done) => {
                    cmd_rx.close();
                    while let Some(cmd) = cmd_rx.recv().await {
                        match cmd {
                            AnalyticsCommand::Record(delta) => self.apply_with_retry(&delta).await,
                            AnalyticsCommand::Flush(done) | AnalyticsCommand::Shutdown(done) => {
                                let _ = done.send(());
                            }
                        }
                    }
                    info!("Analytics worker stopped");
                    let _ = done.send(());
                    return;
                }
            }
        }

        info!("Analytics worker stopped (all handles dropped)");
    }

    async fn apply_with_retry(&self, delta: &AnalyticsDelta) {
        let mut backoff = self.settings.initial_backoff();
        let mut attempt = 0u32;

        loop {
            match self.apply(delta).await {
                Ok(()) => {
                    debug!(shop_id = %delta.shop_id, day = %delta.day, "Analytics delta applied");
                    return;
                }
                Err(e) if attempt < self.settings.max_retries => {
                    attempt += 1;
                    warn!(
                        shop_id = %delta.shop_id,
                        attempt,
                        error = %e,
                        "Analytics write failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => {
                    error!(
                        shop_id = %delta.shop_id,
                        day = %delta.day,
                        error = %e,
                        "Analytics delta dropped after retries"
                    );
                    return;
                }
            }
        }
    }

    async fn apply(&self, delta: &AnalyticsDelta) -> DbResult<()> {
        let mut conn = self.db.acquire().await?;
        AnalyticsRepository::apply(&mut conn, delta).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khata_db::{testing, DbConfig};

    #[tokio::test]
    async fn test_deltas_accumulate_per_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = {
            let mut conn = db.acquire().await.unwrap();
            testing::shop(&mut conn, "Analytics Kirana").await
        };

        let recorder = AnalyticsRecorder::start(db.clone(), AnalyticsSettings::default());
        let now = Utc::now();
        recorder.record_order(&shop.id, now, Money::from_rupees(100), Money::from_rupees(20));
        recorder.record_order(&shop.id, now, Money::from_rupees(50), Money::zero());
        recorder.flush().await.unwrap();

        let mut conn = db.acquire().await.unwrap();
        let day = AnalyticsRepository::get(&mut conn, &shop.id, now.date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.orders, 2);
        assert_eq!(day.revenue_paise, 15_000);
        assert_eq!(day.profit_paise, 2_000);
    }

    #[tokio::test]
    async fn test_record_after_shutdown_is_dropped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let recorder = AnalyticsRecorder::start(db, AnalyticsSettings::default());
        recorder.shutdown().await.unwrap();

        // Must not panic or block
        recorder.record_order("shop", Utc::now(), Money::from_rupees(1), Money::zero());
        assert!(recorder.flush().await.is_err());
    }
}
