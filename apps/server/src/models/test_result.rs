//! Test result summaries consumed when aggregating a container.
//!
//! Individual test results live in their own store; a container only keeps
//! their ids. These summaries carry what aggregation needs from each one.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Final status of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Succeeded,
    Failed,
    Disabled,
}

/// How much a test weighs in a score category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Informational,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Points a test contributes to its category total.
    pub fn weight(&self) -> i32 {
        match self {
            Self::Informational => 0,
            Self::Low => 20,
            Self::Medium => 60,
            Self::High | Self::Critical => 100,
        }
    }
}

/// What aggregation needs to know about one executed test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TestResultSummary {
    /// Id of the test result record in the test result store.
    pub id: Uuid,
    /// Fully qualified test class name.
    pub class_name: String,
    pub method_name: String,
    pub status: TestStatus,
    /// Security category severity, if the test belongs to that category.
    #[serde(default)]
    pub security: Option<SeverityLevel>,
    /// Interoperability category severity, if the test belongs to that category.
    #[serde(default)]
    pub interoperability: Option<SeverityLevel>,
}

impl TestResultSummary {
    /// Key used in `TestResultClassMethodIndexMap`.
    pub fn class_method_key(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }
}
