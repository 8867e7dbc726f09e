//! Layered Configuration Library
//!
//! This module exports the resolution engine, the typed configuration tree
//! and the helpers used by the `layered-config` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod types;
