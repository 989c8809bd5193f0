//! Domain models for the report analyzer.

pub mod artifact;
pub mod score;
pub mod test_result;
pub mod test_result_container;

// Re-export commonly used types
pub use artifact::{ArtifactKind, StoredArtifactResponse};
pub use score::{Score, ScoreCategory};
pub use test_result::{SeverityLevel, TestResultSummary, TestStatus};
pub use test_result_container::{
    ClassMethodIndexMap, ContainerLookup, ListTestResultContainersQuery, NewTestResultContainer,
    TestResultContainer, TestResultContainerListResponse, UpdateTestResultContainer,
};
