//! Use-case services built on top of the generic repositories.
//!
//! # Responsibility
//! - Orchestrate repository calls into process-level steps.
//! - Stay storage-agnostic: services only see `CrudRepository` handles.

pub mod seed;
