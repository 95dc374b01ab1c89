// src/tasks/crossing_scheduler.rs

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use tracing::{debug, error, info, warn};

use jeton_common::error::Error;
use jeton_common::models::threshold_rate::Frequency;
use jeton_common::traits::referral_traits::ReferralGraph;
use jeton_common::traits::repository_traits::ThresholdRateRepository;

use crate::services::points_service::PointsService;

/// UTC start of the period containing `now` for a given frequency. Weeks
/// start on Monday.
pub fn period_start(frequency: Frequency, now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let start = match frequency {
        Frequency::Daily => date,
        Frequency::Weekly => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Frequency::Monthly => date.with_day(1).unwrap_or(date),
        Frequency::Yearly => date.with_month(1).and_then(|d| d.with_day(1)).unwrap_or(date),
    };
    start.and_time(NaiveTime::MIN).and_utc()
}

/// Periodically turns referral counts into point grants (and tokens).
///
/// The engine side is idempotent per (user, pack, frequency, period), so a
/// pass can run as often as convenient: re-granting an already-granted
/// period is refused with `DuplicateGrant`, which the scheduler treats as
/// the normal "nothing new" signal.
pub struct CrossingScheduler {
    rate_repo: Arc<dyn ThresholdRateRepository>,
    referrals: Arc<dyn ReferralGraph>,
    points_service: Arc<PointsService>,
    mint_tokens: bool,
}

impl CrossingScheduler {
    pub fn new(
        rate_repo: Arc<dyn ThresholdRateRepository>,
        referrals: Arc<dyn ReferralGraph>,
        points_service: Arc<PointsService>,
        mint_tokens: bool,
    ) -> Self {
        Self {
            rate_repo,
            referrals,
            points_service,
            mint_tokens,
        }
    }

    pub async fn run_crossing_pass(&self) -> Result<(), Error> {
        let now = Utc::now();
        let rates = self.rate_repo.list_all().await?;
        if rates.is_empty() {
            debug!("No threshold rates configured; nothing to evaluate");
            return Ok(());
        }

        for rate in &rates {
            let period = period_start(rate.frequency, now);
            let users = self.referrals.active_referrers(period).await?;
            debug!(
                "Evaluating {} referrer(s) against pack {} ({} threshold {})",
                users.len(),
                rate.pack_id,
                rate.frequency,
                rate.referral_threshold
            );

            for user_id in users {
                let count = self.referrals.count_referrals(user_id, period).await?;
                if count < i64::from(rate.referral_threshold) {
                    continue;
                }

                match self
                    .points_service
                    .grant_for_crossing(user_id, rate, period, count, self.mint_tokens)
                    .await
                {
                    Ok((balance, tokens)) => {
                        info!(
                            "User {} crossed {} threshold(s) in pack {}: {} point(s) available, {} token(s) minted",
                            user_id,
                            count / i64::from(rate.referral_threshold),
                            rate.pack_id,
                            balance.available_points,
                            tokens.len()
                        );
                    }
                    Err(Error::DuplicateGrant { .. }) => {
                        debug!(
                            "User {} already granted for pack {} ({} period)",
                            user_id, rate.pack_id, rate.frequency
                        );
                    }
                    Err(e) if e.is_domain() => {
                        warn!(
                            "Skipping grant for user {} in pack {}: {:?}",
                            user_id, rate.pack_id, e
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }
}

pub fn spawn_crossing_scheduler(
    scheduler: Arc<CrossingScheduler>,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = scheduler.run_crossing_pass().await {
                error!("Crossing pass failed: {:?}", e);
            }
        }
    })
}
