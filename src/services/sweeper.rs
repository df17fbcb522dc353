use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};

use super::database::MongoDb;

/// Background task that bulk-purges expired one-time codes. Lifecycle
/// operations never depend on it; it only reclaims storage for entries the
/// validation path already ignores.
pub struct OtpSweeper {
    db: MongoDb,
    interval: Duration,
}

impl OtpSweeper {
    pub fn new(db: MongoDb, interval_hours: u64) -> Self {
        Self {
            db,
            interval: Duration::from_secs(interval_hours * 3600),
        }
    }

    /// Run forever. A failed sweep is logged and retried next tick.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.db.purge_expired_otps(Utc::now()).await {
                Ok(0) => tracing::debug!("OTP sweep found nothing to purge"),
                Ok(purged) => tracing::info!(accounts = purged, "Purged expired OTP entries"),
                Err(e) => tracing::error!(error = %e, "OTP sweep failed"),
            }
        }
    }
}
