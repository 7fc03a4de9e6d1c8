//! Profile types and operations

pub mod plugins;
pub mod snapshot;
pub mod spread;
pub mod storage;
pub mod sync;
pub(crate) mod types;

pub use plugins::{install_plugin, uninstall_plugin, PluginReport};
pub use snapshot::{export_live, LiveSnapshot};
pub use spread::{spread, SpreadKind, SpreadReport};
pub use storage::{CopyItem, CreateOptions, CreateReport, ProfileStore};
pub use sync::{back_sync, SyncResult};
pub use types::*;
