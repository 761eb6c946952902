//! Analogous Shared Types
//!
//! This crate contains types shared across the Analogous client workspace.

pub mod types;

pub use types::*;
