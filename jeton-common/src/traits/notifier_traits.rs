// File: jeton-common/src/traits/notifier_traits.rs

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::error::Error;

/// Event payloads handed to the (optional) notification collaborator.
#[derive(Debug, Clone)]
pub enum RewardEvent {
    PrizeWon {
        prize_id: Uuid,
        prize_name: String,
        ticket_id: Uuid,
        verification_code: String,
    },
    PointsGranted {
        pack_id: Uuid,
        points: i64,
    },
}

/// Best-effort notification delivery; a failure here never fails the
/// operation that triggered it.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, event: RewardEvent) -> Result<(), Error>;
}
