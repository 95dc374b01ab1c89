// File: jeton-common/src/models/threshold_rate.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Time window over which referral counts are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(Error::Parse(format!("Unknown frequency: {}", other))),
        }
    }
}

/// Reference configuration mapping (pack, frequency) to a referral-count
/// threshold, the points granted per crossing and the currency value of one
/// point. Looked up, never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRate {
    pub rate_id: Uuid,
    pub pack_id: Uuid,
    pub frequency: Frequency,
    pub referral_threshold: i32,
    pub points_per_threshold: i64,
    pub currency_value_per_point: f64,
    pub created_at: DateTime<Utc>,
}
