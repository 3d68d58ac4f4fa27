//! Repository layer
//!
//! Repositories abstract the CI server calls the engine makes. They carry no
//! reconciliation logic; every method is one remote call.
//!
//! All repositories are trait-based so the engine can run against an
//! in-memory server in tests.

mod build_types;
mod project_features;

// Re-export traits
pub use build_types::BuildTypeRepository;
pub use project_features::ProjectFeatureRepository;

// Re-export implementations
pub use build_types::HttpBuildTypeRepository;
pub use project_features::HttpProjectFeatureRepository;
