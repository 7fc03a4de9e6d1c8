//! Backup snapshots of live state, and rollback of failed switches

pub mod create;
pub mod restore;
mod types;

pub use create::{capture_rollback, create_snapshot, BACKUP_PREFIX, MAX_BACKUPS};
pub use restore::{list_backups, restore_snapshot, roll_back};
pub use types::*;
