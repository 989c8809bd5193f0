//! Business logic services.

pub mod aggregation;
pub mod artifacts;
pub mod storage;

pub use aggregation::ContainerAggregate;
pub use artifacts::ArtifactStore;
pub use storage::Storage;
