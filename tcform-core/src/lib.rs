//! tcform Core
//!
//! Core types for converging CI build configurations against a TeamCity server.
//!
//! This crate contains:
//! - Domain types: parameters, build options, steps, VCS root entries and the
//!   build configuration / project feature records built from them
//! - State: the persisted-state shapes and the upgrader between them

pub mod domain;
pub mod error;
pub mod state;

pub use error::{DomainError, Result};
