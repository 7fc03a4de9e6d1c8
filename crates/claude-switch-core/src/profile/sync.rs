//! Back-sync of live edits into the outgoing profile
//!
//! Users edit live settings, MCP servers, and `CLAUDE.md` directly. Before a
//! switch replaces them, those edits are folded back into the profile that
//! was active so they are not lost.

use crate::error::SwitchResult;
use crate::profile::snapshot::LiveSnapshot;
use crate::profile::storage::ProfileStore;
use serde::Serialize;
use tracing::debug;

/// What a back-sync wrote
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub profile: String,
    pub mcp_servers: usize,
    pub doc_file: bool,
}

/// Fold live state back into the profile `name`
///
/// Does nothing if the profile does not exist.
///
/// # Errors
/// Returns an error if live state cannot be read or the profile cannot be
/// written
pub fn back_sync(store: &ProfileStore, name: &str) -> SwitchResult<Option<SyncResult>> {
    if !store.exists(name) {
        return Ok(None);
    }

    let snapshot = LiveSnapshot::capture(store.paths())?;
    let mut profile = store.load(name)?;
    snapshot.apply_to(&mut profile);
    store.save(&profile)?;
    snapshot.store_doc_file(store, name)?;

    debug!(profile = name, "back-synced live state");
    Ok(Some(SyncResult {
        profile: name.to_string(),
        mcp_servers: profile.mcp_servers.len(),
        doc_file: snapshot.doc_file.is_some(),
    }))
}
