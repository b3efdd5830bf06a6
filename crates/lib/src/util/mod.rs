//! Shared utilities.
//!
//! Test helpers used across the crate.

pub mod testutil;
