//! CLI command implementations.
//!
//! - [`edit`] - interactive editor
//! - [`info`] - statistics
//! - [`table`] - attribute table listing
//! - [`modify`] - single edits written back to disk, and `export`
//! - [`render`] - PNG rendering
//! - [`config`] - configuration file management

pub mod common;
pub mod config;
pub mod edit;
pub mod info;
pub mod modify;
pub mod render;
pub mod table;
