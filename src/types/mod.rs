// Shared type definitions for the download registry.
// Each submodule defines types used across the crate.

pub mod download;
pub mod errors;
