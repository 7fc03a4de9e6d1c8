//! The secondary config file (`~/.claude.json`)
//!
//! Only the `mcpServers` section is owned by profiles. The rest of the file
//! holds tool state and is preserved untouched.

use crate::apply::write::{read_json_or_default, write_json_atomic};
use crate::error::SwitchResult;
use serde_json::{Map, Value};
use std::path::Path;

const MCP_SERVERS: &str = "mcpServers";

/// Read the `mcpServers` section, empty if the file or key is missing
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed
pub fn read_mcp_servers(path: &Path) -> SwitchResult<Map<String, Value>> {
    let doc: Map<String, Value> = read_json_or_default(path)?;
    Ok(doc
        .get(MCP_SERVERS)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default())
}

/// Replace the `mcpServers` section, keeping every other key
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or written
pub fn write_mcp_servers(path: &Path, servers: &Map<String, Value>) -> SwitchResult<()> {
    let mut doc: Map<String, Value> = read_json_or_default(path)?;
    doc.insert(MCP_SERVERS.to_string(), Value::Object(servers.clone()));
    write_json_atomic(path, &doc)
}
