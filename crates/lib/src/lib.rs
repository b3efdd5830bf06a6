//! indigo-release-lib: release-build orchestration for the Indigo toolkit
//!
//! This crate provides the pipeline behind the `indigo-release` binary:
//! - `matrix`: derives a deterministic workspace and CMake parameters from a `BuildRequest`
//! - `invoke`: drives configure/build/package/install against the external build tool
//! - `package`: repackages build artifacts into versioned release archives
//! - `release`: composes the three into a single run

pub mod consts;
pub mod generator;
pub mod invoke;
pub mod layout;
pub mod matrix;
pub mod package;
pub mod preset;
pub mod release;
pub mod request;
pub mod version;

#[cfg(test)]
pub(crate) mod util;
