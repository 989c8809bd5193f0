//! Test result container domain models and DTOs.
//!
//! A container is the aggregate of one executed test-suite run: counters,
//! scores, references to the individual test results and to the capture
//! artifacts. Containers nest (`TestClasses`) to group results per class.
//!
//! Field names on the wire are PascalCase, matching the report documents
//! produced by the test framework.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::test_result_container as container;
use crate::error::{AppError, AppResult};

use super::score::{Score, ScoreCategory};

/// Maps a qualified "Class.method" name to its position in `TestResults`.
pub type ClassMethodIndexMap = BTreeMap<String, u32>;

/// Whether the three counters add up to the number of referenced test results.
pub fn counters_match(failed: i32, succeeded: i32, disabled: i32, test_results: usize) -> bool {
    let counted = i64::from(failed) + i64::from(succeeded) + i64::from(disabled);
    usize::try_from(counted).is_ok_and(|counted| counted == test_results)
}

/// A stored test result container with its nested test classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TestResultContainer {
    pub id: Uuid,
    /// Set on nested test classes; top-level runs have no parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub identifier: String,
    pub short_identifier: Option<String>,
    pub pcap_storage_id: Option<Uuid>,
    pub keylogfile_storage_id: Option<Uuid>,
    pub date: Option<DateTime<Utc>>,
    pub display_name: Option<String>,
    /// Run duration as reported by the test framework.
    pub elapsed_time: Option<f64>,
    pub failed_tests: i32,
    pub succeeded_tests: i32,
    pub disabled_tests: i32,
    #[schema(no_recursion)]
    pub test_classes: Vec<TestResultContainer>,
    pub test_results: Vec<Uuid>,
    #[schema(value_type = Object)]
    pub test_result_class_method_index_map: ClassMethodIndexMap,
    pub score: Score,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl TestResultContainer {
    /// Build the domain record from a stored row and its already-built children.
    pub fn from_model(
        model: container::Model,
        test_classes: Vec<TestResultContainer>,
    ) -> AppResult<Self> {
        let test_results: Vec<Uuid> = decode_column(model.id, "test_results", model.test_results)?;
        let index_map: ClassMethodIndexMap = decode_column(
            model.id,
            "test_result_class_method_index_map",
            model.test_result_class_method_index_map,
        )?;

        Ok(Self {
            id: model.id,
            parent_id: model.parent_id,
            identifier: model.identifier,
            short_identifier: model.short_identifier,
            pcap_storage_id: model.pcap_storage_id,
            keylogfile_storage_id: model.keylogfile_storage_id,
            date: model.date,
            display_name: model.display_name,
            elapsed_time: model.elapsed_time,
            failed_tests: model.failed_tests,
            succeeded_tests: model.succeeded_tests,
            disabled_tests: model.disabled_tests,
            test_classes,
            test_results,
            test_result_class_method_index_map: index_map,
            score: Score {
                security: ScoreCategory {
                    reached: model.security_reached,
                    total: model.security_total,
                    percentage: model.security_percentage,
                },
                interoperability: ScoreCategory {
                    reached: model.interoperability_reached,
                    total: model.interoperability_total,
                    percentage: model.interoperability_percentage,
                },
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// Position of a test result in `TestResults` by its "Class.method" key.
    pub fn test_result_index(&self, class_method: &str) -> Option<usize> {
        self.test_result_class_method_index_map
            .get(class_method)
            .map(|&index| index as usize)
            .filter(|&index| index < self.test_results.len())
    }

    /// Test result id for a "Class.method" key.
    pub fn test_result_id(&self, class_method: &str) -> Option<Uuid> {
        self.test_result_index(class_method)
            .map(|index| self.test_results[index])
    }

    /// Whether `FailedTests + SucceededTests + DisabledTests` equals `TestResults.len()`.
    pub fn counters_match(&self) -> bool {
        counters_match(
            self.failed_tests,
            self.succeeded_tests,
            self.disabled_tests,
            self.test_results.len(),
        )
    }

    /// Number of containers in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .test_classes
            .iter()
            .map(TestResultContainer::subtree_len)
            .sum::<usize>()
    }
}

fn decode_column<T: serde::de::DeserializeOwned>(
    id: Uuid,
    column: &str,
    value: JsonValue,
) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| {
        AppError::Database(format!(
            "Corrupt {} column on test result container {}: {}",
            column, id, e
        ))
    })
}

/// Request to create a test result container.
///
/// `Identifier` is optional here so that a missing value surfaces as a
/// validation error instead of a body parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct NewTestResultContainer {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub short_identifier: Option<String>,
    #[serde(default)]
    pub pcap_storage_id: Option<Uuid>,
    #[serde(default)]
    pub keylogfile_storage_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Also accepted as `DispalyName`.
    #[serde(default, alias = "DispalyName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub failed_tests: i32,
    #[serde(default)]
    pub succeeded_tests: i32,
    #[serde(default)]
    pub disabled_tests: i32,
    #[serde(default)]
    #[schema(no_recursion)]
    pub test_classes: Option<Vec<NewTestResultContainer>>,
    #[serde(default)]
    pub test_results: Vec<Uuid>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub test_result_class_method_index_map: ClassMethodIndexMap,
    #[serde(default)]
    pub score: Score,
}

impl NewTestResultContainer {
    /// Minimal request with only the required identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Default::default()
        }
    }

    /// Check required fields and value ranges for this node and every child.
    pub fn validate(&self) -> AppResult<()> {
        self.validate_at("").map_err(AppError::Validation)
    }

    fn validate_at(&self, path: &str) -> Result<(), String> {
        match self.identifier.as_deref() {
            Some(identifier) if !identifier.is_empty() => {}
            _ => return Err(format!("{path}Identifier is required")),
        }

        check_counter(path, "FailedTests", self.failed_tests)?;
        check_counter(path, "SucceededTests", self.succeeded_tests)?;
        check_counter(path, "DisabledTests", self.disabled_tests)?;
        check_elapsed_time(path, self.elapsed_time)?;
        self.score.check(&format!("{path}Score"))?;

        if let Some(children) = &self.test_classes {
            for (i, child) in children.iter().enumerate() {
                child.validate_at(&format!("{path}TestClasses[{i}]."))?;
            }
        }

        Ok(())
    }

    /// Whether counters add up to the number of referenced test results
    /// and every score reaches no more than its total.
    pub fn is_consistent(&self) -> bool {
        counters_match(
            self.failed_tests,
            self.succeeded_tests,
            self.disabled_tests,
            self.test_results.len(),
        ) && self.score.is_consistent()
    }
}

fn check_counter(path: &str, name: &str, value: i32) -> Result<(), String> {
    if value < 0 {
        return Err(format!("{path}{name} must not be negative"));
    }
    Ok(())
}

fn check_elapsed_time(path: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !v.is_finite() => Err(format!("{path}ElapsedTime must be a finite number")),
        _ => Ok(()),
    }
}

/// Deserialize a present field, keeping `null` distinct from absent.
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a test result container.
///
/// Absent fields are left unchanged. For nullable fields an explicit `null`
/// clears the stored value. `TestClasses`, when given, replaces the whole
/// child subtree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateTestResultContainer {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub short_identifier: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub pcap_storage_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub keylogfile_storage_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub date: Option<Option<DateTime<Utc>>>,
    #[serde(default, alias = "DispalyName", deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<f64>)]
    pub elapsed_time: Option<Option<f64>>,
    #[serde(default)]
    pub failed_tests: Option<i32>,
    #[serde(default)]
    pub succeeded_tests: Option<i32>,
    #[serde(default)]
    pub disabled_tests: Option<i32>,
    #[serde(default)]
    #[schema(no_recursion)]
    pub test_classes: Option<Vec<NewTestResultContainer>>,
    #[serde(default)]
    pub test_results: Option<Vec<Uuid>>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub test_result_class_method_index_map: Option<ClassMethodIndexMap>,
    #[serde(default)]
    pub score: Option<Score>,
}

impl UpdateTestResultContainer {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> AppResult<()> {
        self.validate_inner().map_err(AppError::Validation)
    }

    fn validate_inner(&self) -> Result<(), String> {
        if self.identifier.as_deref() == Some("") {
            return Err("Identifier must not be empty".to_string());
        }

        for (name, value) in [
            ("FailedTests", self.failed_tests),
            ("SucceededTests", self.succeeded_tests),
            ("DisabledTests", self.disabled_tests),
        ] {
            if let Some(value) = value {
                check_counter("", name, value)?;
            }
        }

        if let Some(elapsed_time) = self.elapsed_time {
            check_elapsed_time("", elapsed_time)?;
        }

        if let Some(score) = &self.score {
            score.check("Score")?;
        }

        if let Some(children) = &self.test_classes {
            for (i, child) in children.iter().enumerate() {
                child.validate_at(&format!("TestClasses[{i}]."))?;
            }
        }

        Ok(())
    }
}

/// Point lookups served by the dedicated indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerLookup {
    Identifier(String),
    PcapStorageId(Uuid),
    KeylogfileStorageId(Uuid),
}

/// Query parameters for listing or looking up containers.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListTestResultContainersQuery {
    /// Exact match on `Identifier`.
    pub identifier: Option<String>,
    /// Exact match on `PcapStorageId`.
    pub pcap_storage_id: Option<Uuid>,
    /// Exact match on `KeylogfileStorageId`.
    pub keylogfile_storage_id: Option<Uuid>,
    /// Results per page (default 20, max 100).
    pub limit: Option<u64>,
    /// Pagination offset.
    pub offset: Option<u64>,
}

impl ListTestResultContainersQuery {
    /// The lookup requested, if any. At most one filter may be given.
    pub fn lookup(&self) -> AppResult<Option<ContainerLookup>> {
        let mut lookups = Vec::new();
        if let Some(identifier) = &self.identifier {
            lookups.push(ContainerLookup::Identifier(identifier.clone()));
        }
        if let Some(id) = self.pcap_storage_id {
            lookups.push(ContainerLookup::PcapStorageId(id));
        }
        if let Some(id) = self.keylogfile_storage_id {
            lookups.push(ContainerLookup::KeylogfileStorageId(id));
        }

        if lookups.len() > 1 {
            return Err(AppError::InvalidInput(
                "Only one of identifier, pcap_storage_id or keylogfile_storage_id may be given"
                    .to_string(),
            ));
        }

        Ok(lookups.pop())
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// Paginated list of top-level containers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TestResultContainerListResponse {
    pub containers: Vec<TestResultContainer>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
