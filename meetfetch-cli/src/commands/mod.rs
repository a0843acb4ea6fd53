//! CLI command implementations.

pub mod common;
pub mod fetch;
pub mod measure;
pub mod plan;
