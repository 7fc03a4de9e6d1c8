//! claude-switch core - profile store, switch engine, and rollback
//!
//! This crate provides named configuration profiles for Claude Code, the
//! switch state machine that swaps live configuration between them, backup
//! snapshots, and the cross-process lock guarding every mutation.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod apply;
pub mod backup;
pub mod config;
pub mod error;
pub mod live;
pub mod lock;
pub mod profile;
pub mod switch;
pub mod util;

pub use config::{LiveStatePaths, SwitchConfig};
pub use error::{SwitchError, SwitchResult};
pub use lock::{LockConfig, ProcessLock};
pub use profile::{Profile, ProfileStore, Registry};
pub use switch::Switcher;
