//! Score breakdown for the Security and Interoperability categories.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Reached/total points for one score category.
///
/// `percentage` is always derived from `reached` and `total`; values sent by
/// clients are discarded by [`ScoreCategory::normalized`] before storage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ScoreCategory {
    #[serde(default)]
    pub reached: i32,
    #[serde(default)]
    pub total: i32,
    #[serde(default)]
    pub percentage: f64,
}

impl ScoreCategory {
    pub fn new(reached: i32, total: i32) -> Self {
        Self {
            reached,
            total,
            percentage: Self::percentage_of(reached, total),
        }
    }

    /// `reached / total * 100`, or 0 when nothing was scored.
    pub fn percentage_of(reached: i32, total: i32) -> f64 {
        if total > 0 {
            f64::from(reached) / f64::from(total) * 100.0
        } else {
            0.0
        }
    }

    /// Recompute the percentage from the counts.
    pub fn normalized(self) -> Self {
        Self::new(self.reached, self.total)
    }

    /// Reject negative counts. `reached > total` is tolerated.
    pub(crate) fn check(&self, path: &str) -> Result<(), String> {
        if self.reached < 0 {
            return Err(format!("{path}.Reached must not be negative"));
        }
        if self.total < 0 {
            return Err(format!("{path}.Total must not be negative"));
        }
        Ok(())
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.reached <= self.total
    }
}

/// Scores per category for a container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Score {
    #[serde(default)]
    pub security: ScoreCategory,
    #[serde(default)]
    pub interoperability: ScoreCategory,
}

impl Score {
    pub fn new(security: ScoreCategory, interoperability: ScoreCategory) -> Self {
        Self {
            security,
            interoperability,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            security: self.security.normalized(),
            interoperability: self.interoperability.normalized(),
        }
    }

    pub(crate) fn check(&self, path: &str) -> Result<(), String> {
        self.security.check(&format!("{path}.Security"))?;
        self.interoperability
            .check(&format!("{path}.Interoperability"))
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.security.is_consistent() && self.interoperability.is_consistent()
    }
}
