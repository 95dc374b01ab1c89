// File: jeton-common/src/models/history.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Kind of state transition an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// Points or a token granted to a user.
    Attribution,
    /// Token redeemed or ticket consumed.
    Utilisation,
    /// Recorded when an expired token/ticket is observed by a sweep;
    /// expiration itself stays lazy and is never a stored transition.
    Expiration,
    /// Points converted to wallet currency.
    Conversion,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Attribution => "attribution",
            HistoryAction::Utilisation => "utilisation",
            HistoryAction::Expiration => "expiration",
            HistoryAction::Conversion => "conversion",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attribution" => Ok(HistoryAction::Attribution),
            "utilisation" => Ok(HistoryAction::Utilisation),
            "expiration" => Ok(HistoryAction::Expiration),
            "conversion" => Ok(HistoryAction::Conversion),
            other => Err(Error::Parse(format!("Unknown history action: {}", other))),
        }
    }
}

/// Immutable append-only audit record. The full provenance of any token,
/// ticket or points balance is reconstructed from these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub token_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub prize_id: Option<Uuid>,
    pub action: HistoryAction,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(user_id: Uuid, action: HistoryAction, description: impl Into<String>) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            user_id,
            token_id: None,
            ticket_id: None,
            prize_id: None,
            action,
            description: description.into(),
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_token(mut self, token_id: Uuid) -> Self {
        self.token_id = Some(token_id);
        self
    }

    pub fn with_ticket(mut self, ticket_id: Uuid) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    pub fn with_prize(mut self, prize_id: Uuid) -> Self {
        self.prize_id = Some(prize_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
