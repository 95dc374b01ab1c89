// File: jeton-common/src/models/ticket.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Proof of a successful draw, redeemable in person within its validity
/// window. Staff confirm the handout against `verification_code`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WinningTicket {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub prize_id: Uuid,
    pub source_token_code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    pub verification_code: String,
}

impl WinningTicket {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Valid ⇔ not consumed and not past `expires_at`. Expiration is lazy,
    /// same as tokens.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired_at(now)
    }

    pub fn ensure_consumable(&self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.consumed {
            return Err(Error::TicketAlreadyConsumed(self.ticket_id));
        }
        if self.is_expired_at(now) {
            return Err(Error::TicketExpired(self.ticket_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(consumed: bool, expires_in: Duration) -> WinningTicket {
        let now = Utc::now();
        WinningTicket {
            ticket_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            prize_id: Uuid::new_v4(),
            source_token_code: "JET-TEST-TEST-TEST".to_string(),
            issued_at: now,
            expires_at: now + expires_in,
            consumed,
            consumed_at: consumed.then(|| now),
            verification_code: "WIN-TEST-TEST".to_string(),
        }
    }

    #[test]
    fn fresh_ticket_is_valid() {
        let t = ticket(false, Duration::hours(48));
        assert!(t.is_valid_at(Utc::now()));
        assert!(t.ensure_consumable(Utc::now()).is_ok());
    }

    #[test]
    fn consumed_ticket_is_invalid() {
        let t = ticket(true, Duration::hours(48));
        assert!(!t.is_valid_at(Utc::now()));
        assert!(matches!(
            t.ensure_consumable(Utc::now()),
            Err(Error::TicketAlreadyConsumed(_))
        ));
    }

    #[test]
    fn expired_ticket_is_invalid_without_any_transition() {
        let t = ticket(false, Duration::minutes(-1));
        assert!(!t.is_valid_at(Utc::now()));
        assert!(matches!(
            t.ensure_consumable(Utc::now()),
            Err(Error::TicketExpired(_))
        ));
        assert!(!t.consumed);
    }
}
