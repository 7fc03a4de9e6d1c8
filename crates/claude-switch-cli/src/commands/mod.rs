//! CLI command handlers
//!
//! Each handler calls one core operation and returns the JSON document
//! printed on success.

pub mod backup;
pub mod plugin;
pub mod profile;
pub mod spread;
