// File: jeton-core/src/services/ticket_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use jeton_common::error::Error;
use jeton_common::models::history::{HistoryAction, HistoryEntry};
use jeton_common::models::ticket::WinningTicket;
use jeton_common::traits::repository_traits::{RewardHistoryRepository, WinningTicketRepository};

use crate::db::Database;

/// Winning-ticket lifecycle: staff verification by code and in-person
/// consumption within the validity window.
pub struct TicketService {
    db: Database,
    ticket_repo: Arc<dyn WinningTicketRepository>,
    history_repo: Arc<dyn RewardHistoryRepository>,
}

impl TicketService {
    pub fn new(
        db: Database,
        ticket_repo: Arc<dyn WinningTicketRepository>,
        history_repo: Arc<dyn RewardHistoryRepository>,
    ) -> Self {
        Self {
            db,
            ticket_repo,
            history_repo,
        }
    }

    /// Read-only lookup by verification code for the redemption counter.
    /// Returns the ticket whatever its state; staff inspect `consumed` and
    /// `expires_at` before handing anything out.
    pub async fn verify(&self, verification_code: &str) -> Result<WinningTicket, Error> {
        self.ticket_repo
            .get_by_verification_code(verification_code)
            .await?
            .ok_or_else(|| Error::TicketNotFound(verification_code.to_string()))
    }

    /// Consumes a ticket (prize handed out in person). Fails with
    /// `TicketAlreadyConsumed` or `TicketExpired` as distinct kinds; the
    /// conditional UPDATE guards against a concurrent double consumption.
    pub async fn consume(&self, ticket_id: Uuid) -> Result<WinningTicket, Error> {
        let now = Utc::now();
        let ticket = self
            .ticket_repo
            .get_by_id(ticket_id)
            .await?
            .ok_or_else(|| Error::TicketNotFound(ticket_id.to_string()))?;
        ticket.ensure_consumable(now)?;

        let mut tx = self.db.pool().begin().await?;
        if !self.ticket_repo.consume_in(&mut *tx, ticket_id, now).await? {
            drop(tx);
            debug!("consume guard failed for ticket {}", ticket_id);
            let current = self
                .ticket_repo
                .get_by_id(ticket_id)
                .await?
                .ok_or_else(|| Error::TicketNotFound(ticket_id.to_string()))?;
            current.ensure_consumable(now)?;
            return Err(Error::TicketAlreadyConsumed(ticket_id));
        }

        let entry = HistoryEntry::new(
            ticket.user_id,
            HistoryAction::Utilisation,
            format!(
                "Winning ticket {} consumed (code {})",
                ticket_id, ticket.verification_code
            ),
        )
        .with_ticket(ticket_id)
        .with_prize(ticket.prize_id)
        .with_metadata(json!({ "consumed_at": now }));
        self.history_repo.record_in(&mut *tx, &entry).await?;
        tx.commit().await?;

        info!(
            "Ticket {} consumed for user {} (prize {})",
            ticket_id, ticket.user_id, ticket.prize_id
        );

        Ok(WinningTicket {
            consumed: true,
            consumed_at: Some(now),
            ..ticket
        })
    }

    pub async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<WinningTicket>, Error> {
        self.ticket_repo.list_for_user(user_id).await
    }
}
