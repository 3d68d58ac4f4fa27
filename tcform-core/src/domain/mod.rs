//! Core domain types
//!
//! These types describe a build configuration both as the operator wants it
//! (desired) and as the server reports it (observed). They are rebuilt on every
//! converge cycle and never cached.

pub mod build_config;
pub mod options;
pub mod parameter;
pub mod project_feature;
pub mod step;
pub mod vcs;
