// File: jeton-core/src/services/lottery_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::history::{HistoryAction, HistoryEntry};
use jeton_common::models::prize::Prize;
use jeton_common::models::ticket::WinningTicket;
use jeton_common::models::token::RewardToken;
use jeton_common::traits::notifier_traits::{Notifier, RewardEvent};
use jeton_common::traits::repository_traits::{
    PrizeRepository, RewardHistoryRepository, RewardTokenRepository, WinningTicketRepository,
};

use crate::db::Database;
use crate::utils::codes::generate_code;

/// Validity window of a winning ticket from the moment it is issued.
pub const TICKET_VALIDITY_HOURS: i64 = 48;

const VERIFICATION_PREFIX: &str = "WIN";
const MAX_DRAW_ATTEMPTS: u32 = 3;
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Source of the uniform roll used by the roulette-wheel selection. Tests
/// inject scripted rolls; production uses the thread RNG.
pub trait RollSource: Send + Sync {
    /// Uniform draw in `[0, upper)`; `upper` is strictly positive.
    fn roll(&self, upper: f64) -> f64;
}

pub struct ThreadRngRoll;

impl RollSource for ThreadRngRoll {
    fn roll(&self, upper: f64) -> f64 {
        rand::rng().random_range(0.0..upper)
    }
}

/// Roulette-wheel selection: walk the list accumulating weights until the
/// running sum exceeds `roll`. A roll at or above the total (floating-point
/// edge) falls through to the last prize.
pub fn pick_weighted(prizes: &[Prize], roll: f64) -> Option<&Prize> {
    let mut acc = 0.0;
    for prize in prizes {
        acc += f64::from(prize.draw_weight);
        if roll < acc {
            return Some(prize);
        }
    }
    prizes.last()
}

/// Result of a successful redemption, returned together for display.
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub ticket: WinningTicket,
    pub prize: Prize,
}

/// The redemption algorithm: token validation, weighted draw constrained to
/// in-stock active prizes, atomic stock depletion and ticket issuance.
pub struct LotteryService {
    db: Database,
    token_repo: Arc<dyn RewardTokenRepository>,
    prize_repo: Arc<dyn PrizeRepository>,
    ticket_repo: Arc<dyn WinningTicketRepository>,
    history_repo: Arc<dyn RewardHistoryRepository>,
    roll_source: Arc<dyn RollSource>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl LotteryService {
    pub fn new(
        db: Database,
        token_repo: Arc<dyn RewardTokenRepository>,
        prize_repo: Arc<dyn PrizeRepository>,
        ticket_repo: Arc<dyn WinningTicketRepository>,
        history_repo: Arc<dyn RewardHistoryRepository>,
        roll_source: Arc<dyn RollSource>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            db,
            token_repo,
            prize_repo,
            ticket_repo,
            history_repo,
            roll_source,
            notifier,
        }
    }

    /// Redeems a token for a lottery draw.
    ///
    /// An empty drawable catalog leaves the token untouched and usable
    /// (`NoPrizeAvailable` is "no draw occurred", not a consumed attempt).
    /// Losing the stock race re-draws against a refreshed catalog up to
    /// `MAX_DRAW_ATTEMPTS` times before `DrawConflict`. Losing the
    /// mark-used race restores the stock and surfaces `TokenAlreadyUsed`.
    pub async fn redeem(&self, user_id: Uuid, token_code: &str) -> Result<DrawOutcome, Error> {
        let now = Utc::now();
        let token = self
            .token_repo
            .get_by_code(token_code)
            .await?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| Error::TokenNotFound(token_code.to_string()))?;
        token.ensure_usable(now)?;

        for attempt in 0..MAX_DRAW_ATTEMPTS {
            let drawable = self.prize_repo.list_drawable(token.pack_id).await?;
            if drawable.is_empty() {
                debug!(
                    "No drawable prize for pack {}; token '{}' left usable",
                    token.pack_id, token_code
                );
                return Err(Error::NoPrizeAvailable(token.pack_id));
            }

            let selected = self.select_prize(&drawable);

            if !self.prize_repo.decrement_stock(selected.prize_id).await? {
                // A concurrent draw took the last unit; re-draw against the
                // refreshed catalog.
                debug!(
                    "Stock race lost on prize {} (attempt {}), redrawing",
                    selected.prize_id, attempt
                );
                continue;
            }

            return match self.finalize_draw(&token, selected).await {
                Ok(outcome) => {
                    self.notify_win(user_id, &outcome).await;
                    Ok(outcome)
                }
                Err(e) => Err(e),
            };
        }

        warn!(
            "Draw for token '{}' exhausted {} attempts under concurrent stock depletion",
            token_code, MAX_DRAW_ATTEMPTS
        );
        Err(Error::DrawConflict(MAX_DRAW_ATTEMPTS))
    }

    fn select_prize<'a>(&self, drawable: &'a [Prize]) -> &'a Prize {
        let total_weight: f64 = drawable.iter().map(|p| f64::from(p.draw_weight)).sum();
        if total_weight <= 0.0 {
            // All weights zero: fall back to the catalog order, which is
            // deterministic (weight desc, prize_id).
            return &drawable[0];
        }
        let roll = self.roll_source.roll(total_weight);
        pick_weighted(drawable, roll).unwrap_or(&drawable[0])
    }

    /// Marks the token used, issues the ticket and writes the history entry
    /// in one transaction. The stock decrement already happened; any failure
    /// in here compensates it before propagating.
    async fn finalize_draw(
        &self,
        token: &RewardToken,
        prize: &Prize,
    ) -> Result<DrawOutcome, Error> {
        let now = Utc::now();

        let result: Result<WinningTicket, Error> = async {
            let mut tx = self.db.pool().begin().await?;

            if !self
                .token_repo
                .mark_used_in(&mut *tx, token.token_id, now)
                .await?
            {
                drop(tx);
                // Raced with another redemption of the same code; report the
                // precise reason from the current row state.
                let current = self
                    .token_repo
                    .get_by_code(&token.unique_code)
                    .await?
                    .ok_or_else(|| Error::TokenNotFound(token.unique_code.clone()))?;
                current.ensure_usable(now)?;
                return Err(Error::TokenAlreadyUsed(token.unique_code.clone()));
            }

            let mut ticket = None;
            for _ in 0..MAX_CODE_ATTEMPTS {
                let candidate = WinningTicket {
                    ticket_id: Uuid::new_v4(),
                    user_id: token.user_id,
                    prize_id: prize.prize_id,
                    source_token_code: token.unique_code.clone(),
                    issued_at: now,
                    expires_at: now + Duration::hours(TICKET_VALIDITY_HOURS),
                    consumed: false,
                    consumed_at: None,
                    verification_code: generate_code(VERIFICATION_PREFIX, 2, 4),
                };
                if self.ticket_repo.insert_in(&mut *tx, &candidate).await? {
                    ticket = Some(candidate);
                    break;
                }
                warn!("Verification code collision, regenerating");
            }
            let ticket = ticket.ok_or_else(|| {
                Error::Validation(format!(
                    "Could not generate a unique verification code after {} attempts",
                    MAX_CODE_ATTEMPTS
                ))
            })?;

            let entry = HistoryEntry::new(
                token.user_id,
                HistoryAction::Utilisation,
                format!(
                    "Token {} redeemed: won '{}'",
                    token.unique_code, prize.name
                ),
            )
            .with_token(token.token_id)
            .with_ticket(ticket.ticket_id)
            .with_prize(prize.prize_id)
            .with_metadata(json!({
                "pack_id": token.pack_id,
                "prize_value": prize.value,
                "verification_code": ticket.verification_code,
                "ticket_expires_at": ticket.expires_at,
            }));
            self.history_repo.record_in(&mut *tx, &entry).await?;

            tx.commit().await?;
            Ok(ticket)
        }
        .await;

        match result {
            Ok(ticket) => {
                info!(
                    "User {} won prize '{}' with token '{}' (ticket {})",
                    token.user_id, prize.name, token.unique_code, ticket.ticket_id
                );
                Ok(DrawOutcome {
                    ticket,
                    prize: prize.clone(),
                })
            }
            Err(e) => {
                // Compensating action: the stock unit was taken before this
                // transaction, so put it back.
                if let Err(restock_err) = self.prize_repo.increment_stock(prize.prize_id).await {
                    error!(
                        "Failed to restore stock for prize {} after aborted draw: {:?}",
                        prize.prize_id, restock_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn notify_win(&self, user_id: Uuid, outcome: &DrawOutcome) {
        if let Some(notifier) = &self.notifier {
            let event = RewardEvent::PrizeWon {
                prize_id: outcome.prize.prize_id,
                prize_name: outcome.prize.name.clone(),
                ticket_id: outcome.ticket.ticket_id,
                verification_code: outcome.ticket.verification_code.clone(),
            };
            if let Err(e) = notifier.notify(user_id, event).await {
                warn!("Win notification for user {} failed: {:?}", user_id, e);
            }
        }
    }
}
