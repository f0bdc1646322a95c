//! # polyglot-core
//!
//! Core types, traits, configuration, and error handling for Polyglot.

pub mod command;
pub mod config;
pub mod error;
pub mod traits;

pub use config::shellexpand;
